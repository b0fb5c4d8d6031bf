//! Common types shared by the contour pipeline and its command-line front end.

pub mod config;
pub mod error;
pub mod image;

pub use config::MarchingConfig;
pub use error::{ContourError, ContourResult};
pub use image::{Image, Rgb};
