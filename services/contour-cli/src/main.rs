//! Contour extraction command-line tool.
//!
//! Reads an image, runs the barrier-synchronised marching-squares pipeline on
//! a fixed number of worker threads and writes the contour image:
//!
//! ```text
//! contour-cli <in_file> <out_file> <thread_count>
//! ```
//!
//! Exit status is 0 on success, 1 on usage, configuration, input or template
//! errors and 255 when a worker thread could not be spawned or joined.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use contour_common::{ContourError, MarchingConfig};
use marching::codec::{load_image, save_image};
use marching::{extract_contours, ContourCode, ContourTemplateSet, RunReport};

const EXIT_FAILURE: u8 = 1;
const EXIT_THREAD_FAILURE: u8 = 255;

#[derive(Parser, Debug)]
#[command(name = "contour-cli", version)]
#[command(about = "Marching-squares contour extraction for raster images")]
struct Args {
    /// Input image (PPM, or any format the decoder recognises)
    in_file: PathBuf,

    /// Output image; `.ppm` or unknown extensions are written as binary PPM
    out_file: PathBuf,

    /// Number of worker threads
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    thread_count: u16,

    /// YAML configuration file
    #[arg(long, env = "CONTOUR_CONFIG")]
    config: Option<PathBuf>,

    /// Grid step in pixels, both axes
    #[arg(long)]
    step: Option<usize>,

    /// Luminance threshold (0-255)
    #[arg(long)]
    sigma: Option<u8>,

    /// Rescale inputs wider than this
    #[arg(long)]
    max_width: Option<usize>,

    /// Rescale inputs taller than this
    #[arg(long)]
    max_height: Option<usize>,

    /// Directory containing the contour templates 0.ppm .. 15.ppm
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Use procedurally rendered templates instead of loading them
    #[arg(long, conflicts_with = "templates")]
    builtin_templates: bool,

    /// Write a JSON run summary to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(e) = init_tracing(&args.log_level, args.log_json) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{:#}", e), "Contour extraction failed");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ContourError>() {
        Some(e) if e.is_thread_failure() => EXIT_THREAD_FAILURE,
        _ => EXIT_FAILURE,
    }
}

/// Defaults, then the YAML file, then `CONTOUR_*` environment variables, then
/// command-line flags.
fn resolve_config(args: &Args) -> Result<MarchingConfig> {
    let mut config = match &args.config {
        Some(path) => MarchingConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MarchingConfig::default(),
    };
    config.apply_env();

    if let Some(step) = args.step {
        config = config.with_step(step);
    }
    if let Some(sigma) = args.sigma {
        config.sigma = sigma;
    }
    if let Some(width) = args.max_width {
        config.max_width = width;
    }
    if let Some(height) = args.max_height {
        config.max_height = height;
    }
    if let Some(dir) = &args.templates {
        config.template_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let threads = usize::from(args.thread_count);
    info!(
        input = %args.in_file.display(),
        output = %args.out_file.display(),
        threads,
        step_x = config.step_x,
        step_y = config.step_y,
        sigma = config.sigma,
        "Starting contour-cli"
    );

    // Templates are loaded before any worker exists; a bad asset aborts here.
    let templates = if args.builtin_templates {
        ContourTemplateSet::builtin(config.step_x, config.step_y)?
    } else {
        ContourTemplateSet::load(&config.template_dir, config.step_x, config.step_y)?
    };

    let image = load_image(&args.in_file)?;
    let output = extract_contours(image, &templates, &config, threads)?;
    save_image(&output.image, &args.out_file)?;

    log_report(&output.report);
    if let Some(path) = &args.report {
        write_report(&output.report, path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }
    Ok(())
}

fn log_report(report: &RunReport) {
    info!(
        source_width = report.source_dims.0,
        source_height = report.source_dims.1,
        width = report.working_dims.0,
        height = report.working_dims.1,
        rescaled = report.rescaled,
        cells = report.histogram.total(),
        contour_cells = report.histogram.contour_cells(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Wrote contour image"
    );
}

fn report_json(report: &RunReport) -> serde_json::Value {
    let codes: serde_json::Map<String, serde_json::Value> = ContourCode::all()
        .map(|code| {
            (
                code.value().to_string(),
                serde_json::Value::from(report.histogram.count(code)),
            )
        })
        .collect();

    serde_json::json!({
        "source": { "width": report.source_dims.0, "height": report.source_dims.1 },
        "output": { "width": report.working_dims.0, "height": report.working_dims.1 },
        "rescaled": report.rescaled,
        "grid": { "rows": report.grid_dims.rows, "cols": report.grid_dims.cols },
        "threads": report.threads,
        "cells": report.histogram.total(),
        "contour_cells": report.histogram.contour_cells(),
        "codes": codes,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    })
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(&report_json(report))?;
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_common::Rgb;
    use test_utils::{disc, uniform_image, Workspace};

    fn parse(argv: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("contour-cli").chain(argv.iter().copied()))
    }

    // ========================================================================
    // Argument parsing
    // ========================================================================

    #[test]
    fn test_positional_arguments() {
        let args = parse(&["in.ppm", "out.ppm", "4"]).unwrap();
        assert_eq!(args.in_file, PathBuf::from("in.ppm"));
        assert_eq!(args.out_file, PathBuf::from("out.ppm"));
        assert_eq!(args.thread_count, 4);
        assert!(!args.builtin_templates);
    }

    #[test]
    fn test_missing_arguments_is_usage_error() {
        let err = parse(&["in.ppm", "out.ppm"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(parse(&["in.ppm", "out.ppm", "0"]).is_err());
        assert!(parse(&["in.ppm", "out.ppm", "many"]).is_err());
    }

    #[test]
    fn test_templates_conflict_with_builtin() {
        assert!(parse(&["a", "b", "1", "--templates", "x", "--builtin-templates"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "a", "b", "2", "--step", "4", "--sigma", "99", "--max-width", "512", "--templates", "/t",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!((config.step_x, config.step_y), (4, 4));
        assert_eq!(config.sigma, 99);
        assert_eq!(config.max_width, 512);
        assert_eq!(config.template_dir, PathBuf::from("/t"));
    }

    #[test]
    fn test_invalid_step_rejected() {
        let args = parse(&["a", "b", "2", "--step", "0"]).unwrap();
        assert!(resolve_config(&args).is_err());
    }

    // ========================================================================
    // Exit codes
    // ========================================================================

    #[test]
    fn test_thread_failures_get_distinct_exit_code() {
        let err = anyhow::Error::from(ContourError::ThreadSpawn {
            index: 2,
            message: "EAGAIN".into(),
        });
        assert_eq!(exit_code_for(&err), EXIT_THREAD_FAILURE);

        let err = anyhow::Error::from(ContourError::config("bad")).context("resolving");
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    // ========================================================================
    // End to end
    // ========================================================================

    #[test]
    fn test_run_with_builtin_templates() {
        let ws = Workspace::new();
        save_image(&disc(64, 48, 15.0), ws.input()).unwrap();
        let report_path = ws.root().join("report.json");
        let args = parse(&[
            ws.input().to_str().unwrap(),
            ws.output().to_str().unwrap(),
            "3",
            "--builtin-templates",
            "--report",
            report_path.to_str().unwrap(),
        ])
        .unwrap();

        run(&args).unwrap();

        let out = load_image(ws.output()).unwrap();
        assert_eq!(out.dimensions(), (64, 48));
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(report["cells"], 8 * 6);
        assert_eq!(report["grid"]["cols"], 9);
        assert_eq!(report["rescaled"], false);
    }

    #[test]
    fn test_run_with_template_directory() {
        let ws = Workspace::new();
        ContourTemplateSet::builtin(8, 8)
            .unwrap()
            .save_to_dir(ws.templates())
            .unwrap();
        save_image(&uniform_image(16, 16, Rgb::WHITE), ws.input()).unwrap();
        let args = parse(&[
            ws.input().to_str().unwrap(),
            ws.output().to_str().unwrap(),
            "2",
            "--templates",
            ws.templates().to_str().unwrap(),
        ])
        .unwrap();

        run(&args).unwrap();
        assert!(ws.output().exists());
    }

    #[test]
    fn test_missing_templates_writes_nothing() {
        let ws = Workspace::new();
        save_image(&uniform_image(16, 16, Rgb::WHITE), ws.input()).unwrap();
        let args = parse(&[
            ws.input().to_str().unwrap(),
            ws.output().to_str().unwrap(),
            "2",
            "--templates",
            ws.templates().to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContourError>(),
            Some(ContourError::TemplateLoad { .. })
        ));
        assert!(!ws.output().exists());
    }

    #[test]
    fn test_allocation_failure_writes_nothing() {
        let ws = Workspace::new();
        save_image(&uniform_image(16, 16, Rgb::WHITE), ws.input()).unwrap();
        let huge = (1usize << 59).to_string();
        let args = parse(&[
            ws.input().to_str().unwrap(),
            ws.output().to_str().unwrap(),
            "2",
            "--builtin-templates",
            "--max-width",
            huge.as_str(),
            "--max-height",
            "8",
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContourError>(),
            Some(ContourError::Allocation { .. })
        ));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        assert!(!ws.output().exists());
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let ws = Workspace::new();
        let args = parse(&[
            ws.input().to_str().unwrap(),
            ws.output().to_str().unwrap(),
            "1",
            "--builtin-templates",
        ])
        .unwrap();

        assert_eq!(exit_code_for(&run(&args).unwrap_err()), EXIT_FAILURE);
        assert!(!ws.output().exists());
    }
}
