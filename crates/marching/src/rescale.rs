//! Bicubic rescaling of oversized inputs.

use std::ops::Range;

use contour_common::{ContourResult, Image, Rgb};

/// 1D cubic interpolation using Catmull-Rom spline.
#[inline]
pub fn cubic_1d(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    // Catmull-Rom coefficients
    let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
    let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
    let c = -0.5 * p0 + 0.5 * p2;
    let d = p1;

    a * t3 + b * t2 + c * t + d
}

/// Bicubic sample of `source` at normalised coordinates `(u, v)` in `[0, 1]`.
///
/// `u` runs along columns, `v` along rows. Pixel centres sit at half-integer
/// positions, the integer base is truncated toward zero and neighbours past
/// the border are clamped to the edge. Channels are clamped to `[0, 255]`.
pub fn sample_bicubic(source: &Image, u: f32, v: f32) -> Rgb {
    let x = u * source.width() as f32 - 0.5;
    let y = v * source.height() as f32 - 0.5;
    let xi = x as isize;
    let yi = y as isize;
    let xf = x - x.floor();
    let yf = y - y.floor();

    let mut neighborhood = [[Rgb::default(); 4]; 4];
    for (dy, row) in neighborhood.iter_mut().enumerate() {
        for (dx, px) in row.iter_mut().enumerate() {
            *px = source.pixel_clamped(yi + dy as isize - 1, xi + dx as isize - 1);
        }
    }

    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().enumerate() {
        let mut rows = [0.0f32; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            let c = |i: usize| neighborhood[r][i].channels()[channel] as f32;
            *row = cubic_1d(c(0), c(1), c(2), c(3), xf);
        }
        let v = cubic_1d(rows[0], rows[1], rows[2], rows[3], yf);
        *value = v.clamp(0.0, 255.0) as u8;
    }
    Rgb::from(out)
}

/// Fill `rows` of a `width x height` target from `source`.
///
/// `band` holds exactly those rows, row-major, `width` pixels each.
pub fn rescale_rows(
    source: &Image,
    band: &mut [Rgb],
    width: usize,
    height: usize,
    rows: Range<usize>,
) {
    debug_assert_eq!(band.len(), rows.len() * width);
    let u_scale = (width - 1).max(1) as f32;
    let v_scale = (height - 1).max(1) as f32;

    for (line, row) in band.chunks_exact_mut(width).zip(rows) {
        let v = row as f32 / v_scale;
        for (col, px) in line.iter_mut().enumerate() {
            let u = col as f32 / u_scale;
            *px = sample_bicubic(source, u, v);
        }
    }
}

/// Single-threaded rescale of a whole image.
pub fn rescale(source: &Image, width: usize, height: usize) -> ContourResult<Image> {
    let mut target = Image::new(width, height, Rgb::BLACK)?;
    rescale_rows(source, target.pixels_mut(), width, height, 0..height);
    Ok(target)
}
