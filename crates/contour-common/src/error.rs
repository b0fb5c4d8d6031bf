//! Error types for the contour pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ContourError.
pub type ContourResult<T> = Result<T, ContourError>;

/// Errors that can occur while extracting contours.
///
/// Every variant is fatal for the run: the pipeline is all-or-nothing and
/// nothing is written once one of these has been produced.
#[derive(Debug, Error)]
pub enum ContourError {
    // === Input / Output ===
    #[error("failed to read image {}: {message}", .path.display())]
    ImageRead { path: PathBuf, message: String },

    #[error("failed to write image {}: {message}", .path.display())]
    ImageWrite { path: PathBuf, message: String },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    // === Templates ===
    #[error("contour template {code} unavailable: {message}")]
    TemplateLoad { code: u8, message: String },

    #[error("contour template {code} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    TemplateSize {
        code: u8,
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    // === Configuration ===
    #[error("configuration error: {0}")]
    Config(String),

    // === Resources ===
    #[error("unable to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: usize },

    #[error("failed to spawn worker thread {index}: {message}")]
    ThreadSpawn { index: usize, message: String },

    #[error("worker thread {index} could not be joined: {message}")]
    ThreadJoin { index: usize, message: String },

    // === Invariants ===
    #[error("grid row {row} was written twice")]
    GridRowRewritten { row: usize },

    #[error("grid row {row} read before it was sampled")]
    GridRowMissing { row: usize },
}

impl ContourError {
    /// Create an ImageRead error.
    pub fn image_read(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::ImageRead {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Create an ImageWrite error.
    pub fn image_write(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::ImageWrite {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Create a TemplateLoad error.
    pub fn template_load(code: u8, msg: impl ToString) -> Self {
        Self::TemplateLoad {
            code,
            message: msg.to_string(),
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures of the worker threads themselves (spawn or join).
    ///
    /// The CLI maps these to a distinct exit code.
    pub fn is_thread_failure(&self) -> bool {
        matches!(self, Self::ThreadSpawn { .. } | Self::ThreadJoin { .. })
    }
}

impl From<serde_yaml::Error> for ContourError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(format!("YAML error: {}", err))
    }
}
