//! Template stamping: the second half of marching squares.

use contour_common::{ContourResult, Image, Rgb};

use crate::grid::{cell_code, SharedGrid};
use crate::partition::Band;
use crate::templates::{ContourCode, ContourTemplateSet, CONTOUR_CONFIG_COUNT};

/// Count of marched cells per contour code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeHistogram([usize; CONTOUR_CONFIG_COUNT]);

impl CodeHistogram {
    #[inline]
    pub fn record(&mut self, code: ContourCode) {
        self.0[code.index()] += 1;
    }

    pub fn count(&self, code: ContourCode) -> usize {
        self.0[code.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Cells whose code is neither 0 nor 15, i.e. that carry a contour.
    pub fn contour_cells(&self) -> usize {
        self.total() - self.0[0] - self.0[CONTOUR_CONFIG_COUNT - 1]
    }

    pub fn merge(&mut self, other: &CodeHistogram) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b;
        }
    }
}

/// Copy `template` into `pixels` (rows `width` long) with its top-left
/// corner at `(row, col)`.
#[inline]
pub fn stamp(pixels: &mut [Rgb], width: usize, row: usize, col: usize, template: &Image) {
    let tw = template.width();
    for r in 0..template.height() {
        let start = (row + r) * width + col;
        pixels[start..start + tw].copy_from_slice(template.row(r));
    }
}

/// March every cell whose top row belongs to `band`.
///
/// `pixels` is the band's own slice; every stamped block lies inside it.
/// Reads grid row `i + 1` for each owned row `i`, so all bands must have
/// finished sampling first.
pub fn march_band(
    band: &Band,
    pixels: &mut [Rgb],
    width: usize,
    grid: &SharedGrid,
    templates: &ContourTemplateSet,
) -> ContourResult<CodeHistogram> {
    let (step_x, step_y) = (templates.width(), templates.height());
    let q = grid.dims().q();
    let y0 = band.pixel_rows.start;
    let mut histogram = CodeHistogram::default();

    for i in band.grid_rows.clone() {
        let upper = grid.row(i)?;
        let lower = grid.row(i + 1)?;
        let row = i * step_y - y0;
        for j in 0..q {
            let code = cell_code(upper, lower, j);
            stamp(pixels, width, row, j * step_x, templates.lookup(code));
            histogram.record(code);
        }
    }
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_places_block() {
        let mut img = Image::new(6, 5, Rgb::WHITE).unwrap();
        let mut tpl = Image::new(3, 2, Rgb::BLACK).unwrap();
        tpl.set_pixel(1, 2, Rgb::new(1, 2, 3));

        let width = img.width();
        stamp(img.pixels_mut(), width, 2, 3, &tpl);

        for row in 0..5 {
            for col in 0..6 {
                let inside = (2..4).contains(&row) && (3..6).contains(&col);
                let expected = match (row, col) {
                    (3, 5) => Rgb::new(1, 2, 3),
                    _ if inside => Rgb::BLACK,
                    _ => Rgb::WHITE,
                };
                assert_eq!(img.pixel(row, col), expected, "pixel ({}, {})", row, col);
            }
        }
    }

    #[test]
    fn test_histogram_merge_and_contour_cells() {
        let mut a = CodeHistogram::default();
        a.record(ContourCode::new(0).unwrap());
        a.record(ContourCode::new(6).unwrap());
        let mut b = CodeHistogram::default();
        b.record(ContourCode::new(15).unwrap());
        b.record(ContourCode::new(6).unwrap());
        a.merge(&b);

        assert_eq!(a.total(), 4);
        assert_eq!(a.count(ContourCode::new(6).unwrap()), 2);
        assert_eq!(a.contour_cells(), 2);
    }
}
