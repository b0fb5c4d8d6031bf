//! In-memory RGB raster shared by every pipeline stage.

use serde::{Deserialize, Serialize};

use crate::error::{ContourError, ContourResult};

/// A single 8-bit-per-channel RGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Unweighted mean of the three channels, truncated.
    #[inline]
    pub fn luminance(self) -> u8 {
        ((self.red as u16 + self.green as u16 + self.blue as u16) / 3) as u8
    }

    #[inline]
    pub fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Row-major RGB image: pixel `(row, col)` is stored at `row * width + col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Image {
    /// Allocate a `width x height` image filled with `fill`.
    ///
    /// The buffer is reserved fallibly so an oversized request surfaces as
    /// [`ContourError::Allocation`] instead of aborting the process.
    pub fn new(width: usize, height: usize, fill: Rgb) -> ContourResult<Self> {
        check_dimensions(width, height)?;
        let len = width * height;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| ContourError::Allocation {
                what: "image buffer",
                bytes: len.saturating_mul(std::mem::size_of::<Rgb>()),
            })?;
        pixels.resize(len, fill);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Wrap an existing pixel buffer.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> ContourResult<Self> {
        check_dimensions(width, height)?;
        if pixels.len() != width * height {
            return Err(ContourError::InvalidImage(format!(
                "{} pixels supplied for a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image from packed `RGBRGB...` bytes.
    pub fn from_rgb_bytes(width: usize, height: usize, bytes: &[u8]) -> ContourResult<Self> {
        if bytes.len() != width * height * 3 {
            return Err(ContourError::InvalidImage(format!(
                "{} bytes supplied for a {}x{} RGB image",
                bytes.len(),
                width,
                height
            )));
        }
        let pixels = bytes
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Packed `RGBRGB...` bytes, row-major.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.channels()).collect()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Pixel at `(row, col)`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> Rgb {
        self.pixels[row * self.width + col]
    }

    /// Pixel at `(row, col)` with both coordinates clamped into the image.
    #[inline]
    pub fn pixel_clamped(&self, row: isize, col: isize) -> Rgb {
        let row = row.clamp(0, self.height as isize - 1) as usize;
        let col = col.clamp(0, self.width as isize - 1) as usize;
        self.pixel(row, col)
    }

    #[inline]
    pub fn set_pixel(&mut self, row: usize, col: usize, value: Rgb) {
        self.pixels[row * self.width + col] = value;
    }

    pub fn row(&self, row: usize) -> &[Rgb] {
        &self.pixels[row * self.width..(row + 1) * self.width]
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }
}

fn check_dimensions(width: usize, height: usize) -> ContourResult<()> {
    if width == 0 || height == 0 {
        return Err(ContourError::InvalidImage(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(std::mem::size_of::<Rgb>()))
        .map(|_| ())
        .ok_or_else(|| ContourError::InvalidImage(format!("{}x{} overflows", width, height)))
}
