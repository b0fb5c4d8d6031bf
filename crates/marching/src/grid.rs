//! Binary occupancy grid sampled from the working image.
//!
//! Grid row `i` samples pixel row `i * step_y`, grid column `j` samples pixel
//! column `j * step_x`. The last grid row and column are boundary samples
//! taken from the image's true last pixel row and column, and the corner
//! cell `[p][q]` is always 0.

use std::sync::OnceLock;

use contour_common::{ContourError, ContourResult, Image, MarchingConfig, Rgb};

use crate::partition::{plan_bands, Band};
use crate::templates::ContourCode;

/// Shape of the grid for a given image and step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    /// `height / step_y + 1`
    pub rows: usize,
    /// `width / step_x + 1`
    pub cols: usize,
}

impl GridDims {
    pub fn for_image(width: usize, height: usize, step_x: usize, step_y: usize) -> Self {
        Self {
            rows: height / step_y + 1,
            cols: width / step_x + 1,
        }
    }

    /// Index of the boundary row (`p`).
    #[inline]
    pub fn p(&self) -> usize {
        self.rows - 1
    }

    /// Index of the boundary column (`q`).
    #[inline]
    pub fn q(&self) -> usize {
        self.cols - 1
    }
}

/// Grid shared by all workers while a run is in flight.
///
/// Each row is written exactly once, by the worker that owns it, and is
/// read-only afterwards. Marching reads row `i + 1`, which may belong to the
/// next band, so it must only happen after the sampling barrier.
#[derive(Debug)]
pub struct SharedGrid {
    dims: GridDims,
    rows: Vec<OnceLock<Box<[u8]>>>,
}

impl SharedGrid {
    pub fn new(dims: GridDims) -> ContourResult<Self> {
        let mut rows = Vec::new();
        rows.try_reserve_exact(dims.rows)
            .map_err(|_| ContourError::Allocation {
                what: "grid",
                bytes: dims.rows.saturating_mul(dims.cols),
            })?;
        rows.resize_with(dims.rows, OnceLock::new);
        Ok(Self { dims, rows })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Publish row `i`. Fails if the row was already written.
    pub fn set_row(&self, i: usize, values: Box<[u8]>) -> ContourResult<()> {
        debug_assert_eq!(values.len(), self.dims.cols);
        self.rows[i]
            .set(values)
            .map_err(|_| ContourError::GridRowRewritten { row: i })
    }

    /// Row `i`, if it has been sampled.
    pub fn row(&self, i: usize) -> ContourResult<&[u8]> {
        self.rows
            .get(i)
            .and_then(|r| r.get())
            .map(|r| &r[..])
            .ok_or(ContourError::GridRowMissing { row: i })
    }

    /// Freeze into a plain [`Grid`] once every row has been written.
    pub fn into_grid(self) -> ContourResult<Grid> {
        let mut cells = Vec::with_capacity(self.dims.rows * self.dims.cols);
        for (i, row) in self.rows.into_iter().enumerate() {
            let row = row
                .into_inner()
                .ok_or(ContourError::GridRowMissing { row: i })?;
            cells.extend_from_slice(&row);
        }
        Ok(Grid {
            dims: self.dims,
            cells,
        })
    }
}

/// Completed grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dims: GridDims,
    cells: Vec<u8>,
}

impl Grid {
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn rows(&self) -> usize {
        self.dims.rows
    }

    pub fn cols(&self) -> usize {
        self.dims.cols
    }

    /// Cell `[i][j]`, 0 or 1.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[i * self.dims.cols + j]
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.cells[i * self.dims.cols..(i + 1) * self.dims.cols]
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Marching code of the cell whose top-left corner is `[i][j]`.
    pub fn code(&self, i: usize, j: usize) -> ContourCode {
        cell_code(self.row(i), self.row(i + 1), j)
    }
}

/// Code of cell `j` between two adjacent grid rows:
/// `8*upper[j] + 4*upper[j+1] + 2*lower[j+1] + 1*lower[j]`.
#[inline]
pub fn cell_code(upper: &[u8], lower: &[u8], j: usize) -> ContourCode {
    ContourCode::from_corners(
        upper[j] != 0,
        upper[j + 1] != 0,
        lower[j + 1] != 0,
        lower[j] != 0,
    )
}

#[inline]
fn is_inside(px: Rgb, sigma: u8) -> u8 {
    (px.luminance() <= sigma) as u8
}

/// Sample every grid row owned by `band`.
///
/// `pixels` is the band's own slice of a `width x height` image. Interior
/// rows take their last column from pixel column `width - 1`; the last band
/// also fills boundary row `p` from pixel row `height - 1`.
pub fn sample_band(
    band: &Band,
    pixels: &[Rgb],
    width: usize,
    height: usize,
    config: &MarchingConfig,
    grid: &SharedGrid,
) -> ContourResult<()> {
    let (step_x, step_y, sigma) = (config.step_x, config.step_y, config.sigma);
    let q = grid.dims().q();
    let y0 = band.pixel_rows.start;
    let at = |row: usize, col: usize| pixels[(row - y0) * width + col];

    for i in band.grid_rows.clone() {
        let row = i * step_y;
        let mut line = Vec::with_capacity(q + 1);
        line.extend((0..q).map(|j| is_inside(at(row, j * step_x), sigma)));
        line.push(is_inside(at(row, width - 1), sigma));
        grid.set_row(i, line.into_boxed_slice())?;
    }

    if band.is_last {
        let mut line = Vec::with_capacity(q + 1);
        line.extend((0..q).map(|j| is_inside(at(height - 1, j * step_x), sigma)));
        line.push(0);
        grid.set_row(grid.dims().p(), line.into_boxed_slice())?;
    }
    Ok(())
}

/// Sample the whole grid of `image` on the calling thread.
pub fn sample_grid(image: &Image, config: &MarchingConfig) -> ContourResult<Grid> {
    let (width, height) = image.dimensions();
    let grid = SharedGrid::new(GridDims::for_image(width, height, config.step_x, config.step_y))?;
    for band in plan_bands(height, config.step_y, 1) {
        sample_band(&band, image.pixels(), width, height, config, &grid)?;
    }
    grid.into_grid()
}
