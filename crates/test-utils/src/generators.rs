//! Synthetic image generators.
//!
//! These produce predictable patterns whose grid samples can be worked out
//! by hand, so tests can assert exact cell values.

use contour_common::{Image, Rgb};

/// A `width x height` image of a single colour.
pub fn uniform_image(width: usize, height: usize, color: Rgb) -> Image {
    Image::new(width, height, color).expect("test image dimensions must be non-zero")
}

/// Horizontal gray ramp: column `c` has value `c * 255 / (width - 1)`.
pub fn horizontal_gradient(width: usize, height: usize) -> Image {
    let mut img = uniform_image(width, height, Rgb::BLACK);
    let span = (width - 1).max(1);
    for row in 0..height {
        for col in 0..width {
            img.set_pixel(row, col, Rgb::gray((col * 255 / span) as u8));
        }
    }
    img
}

/// Black and white squares of `cell` pixels, black at the origin.
pub fn checkerboard(width: usize, height: usize, cell: usize) -> Image {
    let mut img = uniform_image(width, height, Rgb::WHITE);
    for row in 0..height {
        for col in 0..width {
            if (row / cell + col / cell) % 2 == 0 {
                img.set_pixel(row, col, Rgb::BLACK);
            }
        }
    }
    img
}

/// White image with a black filled disc centred in the frame.
pub fn disc(width: usize, height: usize, radius: f32) -> Image {
    let mut img = uniform_image(width, height, Rgb::WHITE);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 + 0.5 - cx;
            let dy = row as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                img.set_pixel(row, col, Rgb::BLACK);
            }
        }
    }
    img
}

/// Deterministic pseudo-random colours (xorshift), for determinism tests.
pub fn noise_image(width: usize, height: usize, seed: u32) -> Image {
    let mut state = seed.max(1);
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    let pixels = (0..width * height)
        .map(|_| {
            let v = next();
            Rgb::new(v as u8, (v >> 8) as u8, (v >> 16) as u8)
        })
        .collect();
    Image::from_pixels(width, height, pixels).expect("noise dimensions are consistent")
}
