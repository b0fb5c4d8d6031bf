//! Configuration for the contour pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContourError, ContourResult};

/// Default grid step in pixels, both axes.
pub const DEFAULT_STEP: usize = 8;
/// Default luminance threshold; samples at or below it are "inside".
pub const DEFAULT_SIGMA: u8 = 200;
/// Default bound above which an input is rescaled.
pub const DEFAULT_MAX_DIMENSION: usize = 2048;
/// Default location of the `0.ppm` .. `15.ppm` template assets.
pub const DEFAULT_TEMPLATE_DIR: &str = "./contours";

/// Tunables for one contour extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchingConfig {
    /// Horizontal distance between sample points, and template width.
    pub step_x: usize,

    /// Vertical distance between sample points, and template height.
    pub step_y: usize,

    /// Luminance threshold.
    pub sigma: u8,

    /// Inputs wider than this are rescaled to exactly `max_width`.
    pub max_width: usize,

    /// Inputs taller than this are rescaled to exactly `max_height`.
    pub max_height: usize,

    /// Directory holding the sixteen contour templates.
    pub template_dir: PathBuf,
}

impl Default for MarchingConfig {
    fn default() -> Self {
        Self {
            step_x: DEFAULT_STEP,
            step_y: DEFAULT_STEP,
            sigma: DEFAULT_SIGMA,
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
        }
    }
}

impl MarchingConfig {
    /// Overlay any `CONTOUR_*` environment variables onto this config.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env(&mut self) {
        if let Some(step) = env_parse("CONTOUR_STEP") {
            self.step_x = step;
            self.step_y = step;
        }
        if let Some(step) = env_parse("CONTOUR_STEP_X") {
            self.step_x = step;
        }
        if let Some(step) = env_parse("CONTOUR_STEP_Y") {
            self.step_y = step;
        }
        if let Some(sigma) = env_parse("CONTOUR_SIGMA") {
            self.sigma = sigma;
        }
        if let Some(width) = env_parse("CONTOUR_MAX_WIDTH") {
            self.max_width = width;
        }
        if let Some(height) = env_parse("CONTOUR_MAX_HEIGHT") {
            self.max_height = height;
        }
        if let Ok(dir) = std::env::var("CONTOUR_TEMPLATE_DIR") {
            self.template_dir = PathBuf::from(dir);
        }
    }

    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> ContourResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ContourResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContourError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Set both grid steps at once.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step_x = step;
        self.step_y = step;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ContourResult<()> {
        if self.step_x == 0 || self.step_y == 0 {
            return Err(ContourError::config("grid steps must be > 0"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ContourError::config("rescale bounds must be > 0"));
        }
        if self.max_width < self.step_x || self.max_height < self.step_y {
            return Err(ContourError::config(format!(
                "rescale bounds {}x{} are smaller than one grid step {}x{}",
                self.max_width, self.max_height, self.step_x, self.step_y
            )));
        }
        Ok(())
    }

    /// Whether an image of this size must be rescaled before sampling.
    #[inline]
    pub fn needs_rescale(&self, width: usize, height: usize) -> bool {
        width > self.max_width || height > self.max_height
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
