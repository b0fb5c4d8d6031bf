//! Marching-squares contour extraction over RGB rasters.
//!
//! The pipeline has three phases, each run by a fixed pool of worker threads
//! that meet at a barrier between phases:
//! - Bicubic rescale of inputs larger than the configured bounds
//! - Binary grid sampling against a luminance threshold
//! - Contour template stamping, one template per grid cell

pub mod codec;
pub mod grid;
pub mod march;
pub mod partition;
pub mod pipeline;
pub mod rescale;
pub mod templates;

pub use grid::{Grid, GridDims};
pub use march::CodeHistogram;
pub use pipeline::{extract_contours, ContourOutput, RunReport};
pub use templates::{ContourCode, ContourTemplateSet, CONTOUR_CONFIG_COUNT};
