//! Multi-threaded marching-squares run.
//!
//! A fixed number of scoped worker threads each own one horizontal band of
//! the working image (see [`crate::partition`]) and step through the phases
//! in lockstep:
//!
//! 1. rescale (only when the input exceeds the configured bounds), barrier
//! 2. sample the band's grid rows, barrier
//! 3. march the band's cells, stamping templates in place, barrier
//!
//! Bands are handed out as disjoint `&mut` slices, so pixel writes never
//! alias. The grid is the only cross-band state; its rows are write-once and
//! neighbours are read only after the sampling barrier.
//!
//! A panic inside a phase is caught so the worker still meets every barrier,
//! then re-raised once the last barrier is behind it.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Barrier};
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use contour_common::{ContourError, ContourResult, Image, MarchingConfig, Rgb};

use crate::grid::{sample_band, Grid, GridDims, SharedGrid};
use crate::march::{march_band, CodeHistogram};
use crate::partition::{plan_bands, split_bands, Band};
use crate::rescale::rescale_rows;
use crate::templates::ContourTemplateSet;

/// Result of a successful run.
#[derive(Debug)]
pub struct ContourOutput {
    /// The working image with every cell replaced by its template.
    pub image: Image,
    /// The sampled grid.
    pub grid: Grid,
    pub report: RunReport,
}

/// Summary of a run, for logging.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source_dims: (usize, usize),
    pub working_dims: (usize, usize),
    pub rescaled: bool,
    pub grid_dims: GridDims,
    pub threads: usize,
    pub histogram: CodeHistogram,
    pub elapsed: Duration,
}

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Everything one worker needs: its own band plus shared read-only handles.
struct WorkerTask<'a> {
    band: Band,
    pixels: &'a mut [Rgb],
    width: usize,
    height: usize,
    source: Option<&'a Image>,
    grid: &'a SharedGrid,
    templates: &'a ContourTemplateSet,
    config: &'a MarchingConfig,
    barrier: &'a Barrier,
}

/// Extract contours from `source` using `threads` workers.
///
/// Consumes the input: the returned image is either the input itself, marched
/// in place, or the rescaled copy when the input exceeded
/// `max_width x max_height`. Output is identical for every thread count.
pub fn extract_contours(
    source: Image,
    templates: &ContourTemplateSet,
    config: &MarchingConfig,
    threads: usize,
) -> ContourResult<ContourOutput> {
    extract_contours_with(source, templates, config, threads, |index| {
        Ok(thread::Builder::new().name(format!("contour-worker-{}", index)))
    })
}

/// [`extract_contours`] with the thread builder for each worker supplied by
/// `builder_for`; an `Err` counts as a failed spawn.
fn extract_contours_with<F>(
    source: Image,
    templates: &ContourTemplateSet,
    config: &MarchingConfig,
    threads: usize,
    mut builder_for: F,
) -> ContourResult<ContourOutput>
where
    F: FnMut(usize) -> io::Result<thread::Builder>,
{
    config.validate()?;
    if threads == 0 {
        return Err(ContourError::config("thread count must be >= 1"));
    }
    if (templates.width(), templates.height()) != (config.step_x, config.step_y) {
        return Err(ContourError::config(format!(
            "templates are {}x{} but the grid step is {}x{}",
            templates.width(),
            templates.height(),
            config.step_x,
            config.step_y
        )));
    }

    let started = Instant::now();
    let source_dims = source.dimensions();
    let rescaled = config.needs_rescale(source_dims.0, source_dims.1);

    // `original` stays owned here until every worker has been joined.
    let (mut canvas, original) = if rescaled {
        let target = Image::new(config.max_width, config.max_height, Rgb::BLACK)?;
        (target, Some(source))
    } else {
        (source, None)
    };
    let (width, height) = canvas.dimensions();

    let dims = GridDims::for_image(width, height, config.step_x, config.step_y);
    let grid = SharedGrid::new(dims)?;
    let bands = plan_bands(height, config.step_y, threads);
    let barrier = Barrier::new(threads);

    info!(
        source_width = source_dims.0,
        source_height = source_dims.1,
        width,
        height,
        rescaled,
        grid_rows = dims.rows,
        grid_cols = dims.cols,
        threads,
        "Starting contour extraction"
    );

    let stats = thread::scope(|scope| {
        let slices = split_bands(canvas.pixels_mut(), width, &bands);
        let mut handles = Vec::with_capacity(threads);
        let mut gates = Vec::with_capacity(threads);

        for (band, pixels) in bands.iter().cloned().zip(slices) {
            let index = band.index;
            let (gate, start) = mpsc::channel::<()>();
            let task = WorkerTask {
                band,
                pixels,
                width,
                height,
                source: original.as_ref(),
                grid: &grid,
                templates,
                config,
                barrier: &barrier,
            };
            let spawned = builder_for(index)
                .and_then(|builder| builder.spawn_scoped(scope, move || run_worker(task, start)));
            match spawned {
                Ok(handle) => {
                    handles.push(handle);
                    gates.push(gate);
                }
                Err(e) => {
                    error!(worker = index, error = %e, "Failed to spawn worker thread");
                    // Closing the gates lets the workers already spawned exit
                    // before they ever reach the barrier.
                    drop(gates);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(ContourError::ThreadSpawn {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        for gate in &gates {
            let _ = gate.send(());
        }
        drop(gates);
        join_workers(handles)
    })?;

    if let Some(original) = original {
        debug!(
            width = original.width(),
            height = original.height(),
            "Releasing original image"
        );
        drop(original);
    }

    let mut histogram = CodeHistogram::default();
    for worker in &stats {
        histogram.merge(worker);
    }
    let grid = grid.into_grid()?;
    let report = RunReport {
        source_dims,
        working_dims: (width, height),
        rescaled,
        grid_dims: dims,
        threads,
        histogram,
        elapsed: started.elapsed(),
    };

    info!(
        cells = histogram.total(),
        contour_cells = histogram.contour_cells(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Contour extraction complete"
    );

    Ok(ContourOutput {
        image: canvas,
        grid,
        report,
    })
}

/// Body of one worker thread.
///
/// Every barrier is reached even if an earlier phase failed or panicked, so
/// one bad band never strands the others. A caught panic is resumed after the
/// final barrier and surfaces at join. Returns `None` when the start gate was
/// closed because another worker could not be spawned.
fn run_worker(
    task: WorkerTask<'_>,
    start: mpsc::Receiver<()>,
) -> ContourResult<Option<CodeHistogram>> {
    if start.recv().is_err() {
        debug!("Start withdrawn, exiting without entering the barrier");
        return Ok(None);
    }

    let WorkerTask {
        band,
        pixels,
        width,
        height,
        source,
        grid,
        templates,
        config,
        barrier,
    } = task;

    let mut outcome: Result<ContourResult<()>, PanicPayload> = Ok(Ok(()));

    if let Some(source) = source {
        outcome = guarded(|| {
            rescale_rows(source, pixels, width, height, band.pixel_rows.clone());
            Ok(())
        });
        if barrier.wait().is_leader() {
            debug!(width, height, "Rescale phase complete");
        }
    }

    outcome = outcome.and_then(|prev| {
        guarded(|| prev.and_then(|()| sample_band(&band, pixels, width, height, config, grid)))
    });
    if barrier.wait().is_leader() {
        debug!("Sampling phase complete");
    }

    let marched = outcome.and_then(|prev| {
        guarded(|| prev.and_then(|()| march_band(&band, pixels, width, grid, templates)))
    });
    barrier.wait();

    let marched = match marched {
        Ok(marched) => marched,
        Err(payload) => {
            error!(worker = band.index, "Band panicked");
            panic::resume_unwind(payload)
        }
    };

    match &marched {
        Ok(histogram) => debug!(
            worker = band.index,
            grid_rows = ?band.grid_rows,
            cells = histogram.total(),
            "Band finished"
        ),
        Err(e) => error!(worker = band.index, error = %e, "Band failed"),
    }
    marched.map(Some)
}

fn guarded<T>(phase: impl FnOnce() -> T) -> Result<T, PanicPayload> {
    panic::catch_unwind(AssertUnwindSafe(phase))
}

fn join_workers(
    handles: Vec<ScopedJoinHandle<'_, ContourResult<Option<CodeHistogram>>>>,
) -> ContourResult<Vec<CodeHistogram>> {
    let mut stats = Vec::with_capacity(handles.len());
    let mut first_error = None;

    for (index, handle) in handles.into_iter().enumerate() {
        let failure = match handle.join() {
            Ok(Ok(Some(histogram))) => {
                stats.push(histogram);
                None
            }
            Ok(Ok(None)) => Some(ContourError::ThreadJoin {
                index,
                message: "worker never started".to_string(),
            }),
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(ContourError::ThreadJoin {
                index,
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Some(e) = failure {
            error!(worker = index, error = %e, "Worker failed");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
