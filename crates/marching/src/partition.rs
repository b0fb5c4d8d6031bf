//! Splitting the work into disjoint horizontal bands, one per worker.
//!
//! Band `k` of `n` starts at pixel row `k * height / n`; that start is
//! snapped down to a grid row, so a band owns whole grid rows and the pixel
//! rows underneath them. The final band absorbs the remainder: the boundary
//! grid row and any pixel rows below the last full step.

use std::ops::Range;

use contour_common::Rgb;

/// Evenly split `0..len` into `parts` contiguous ranges.
///
/// Range `k` is `k*len/parts .. (k+1)*len/parts`; the last one always ends
/// at `len`. Ranges may be empty when `parts > len`.
pub fn partition_range(len: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    (0..parts)
        .map(|k| {
            let start = (k as u128 * len as u128 / parts as u128) as usize;
            let end = if k + 1 == parts {
                len
            } else {
                ((k as u128 + 1) * len as u128 / parts as u128) as usize
            };
            start..end
        })
        .collect()
}

/// One worker's share of the image and grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band {
    /// Worker index, `0..thread_count`.
    pub index: usize,
    /// Interior grid rows this band samples and marches.
    pub grid_rows: Range<usize>,
    /// Pixel rows this band owns exclusively.
    pub pixel_rows: Range<usize>,
    /// Whether this band also samples the boundary grid row.
    pub is_last: bool,
}

/// Plan `threads` bands over an image `height` pixels tall sampled every
/// `step_y` rows.
pub fn plan_bands(height: usize, step_y: usize, threads: usize) -> Vec<Band> {
    let pixel_ranges = partition_range(height, threads);
    let grid_starts: Vec<usize> = pixel_ranges.iter().map(|r| r.start / step_y).collect();
    let interior_rows = height / step_y;
    let count = pixel_ranges.len();

    (0..count)
        .map(|k| {
            let is_last = k + 1 == count;
            let grid_start = grid_starts[k];
            let grid_end = if is_last {
                interior_rows
            } else {
                grid_starts[k + 1]
            };
            let pixel_end = if is_last {
                height
            } else {
                grid_end * step_y
            };
            Band {
                index: k,
                grid_rows: grid_start..grid_end,
                pixel_rows: grid_start * step_y..pixel_end,
                is_last,
            }
        })
        .collect()
}

/// Split a row-major pixel buffer into one mutable slice per band.
///
/// The bands must tile `0..height` in order, which [`plan_bands`] guarantees.
pub fn split_bands<'a>(pixels: &'a mut [Rgb], width: usize, bands: &[Band]) -> Vec<&'a mut [Rgb]> {
    let mut rest = pixels;
    let mut out = Vec::with_capacity(bands.len());
    for band in bands {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(band.pixel_rows.len() * width);
        out.push(head);
        rest = tail;
    }
    out
}
