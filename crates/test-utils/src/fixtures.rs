//! Temporary on-disk layouts used by end-to-end tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch directory laid out the way the CLI expects its files.
///
/// Removed when dropped.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Input image path.
    pub fn input(&self) -> PathBuf {
        self.root().join("input.ppm")
    }

    /// Output image path.
    pub fn output(&self) -> PathBuf {
        self.root().join("output.ppm")
    }

    /// Template asset directory (not created).
    pub fn templates(&self) -> PathBuf {
        self.root().join("contours")
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
