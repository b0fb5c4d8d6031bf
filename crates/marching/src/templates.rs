//! The sixteen contour templates, indexed by marching-squares code.
//!
//! Corner weights: top-left = 8, top-right = 4, bottom-right = 2,
//! bottom-left = 1. A corner is set when its sample is at or below the
//! luminance threshold. Template `k` is the pre-rendered contour fragment for
//! code `k` and is stamped verbatim into the output.

use std::path::Path;

use tracing::{debug, info};

use contour_common::{ContourError, ContourResult, Image, Rgb};

use crate::codec;

/// Number of corner configurations of a 2x2 cell.
pub const CONTOUR_CONFIG_COUNT: usize = 16;

/// A 4-bit marching-squares configuration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContourCode(u8);

impl ContourCode {
    /// Build the code for a cell from its four corner flags.
    #[inline]
    pub fn from_corners(top_left: bool, top_right: bool, bottom_right: bool, bottom_left: bool) -> Self {
        Self(
            (top_left as u8) << 3
                | (top_right as u8) << 2
                | (bottom_right as u8) << 1
                | bottom_left as u8,
        )
    }

    /// Code from its numeric value, `None` outside `0..16`.
    pub fn new(value: u8) -> Option<Self> {
        (value < CONTOUR_CONFIG_COUNT as u8).then_some(Self(value))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn top_left(self) -> bool {
        self.0 & 8 != 0
    }

    pub fn top_right(self) -> bool {
        self.0 & 4 != 0
    }

    pub fn bottom_right(self) -> bool {
        self.0 & 2 != 0
    }

    pub fn bottom_left(self) -> bool {
        self.0 & 1 != 0
    }

    /// All sixteen codes in ascending order.
    pub fn all() -> impl Iterator<Item = ContourCode> {
        (0..CONTOUR_CONFIG_COUNT as u8).map(ContourCode)
    }
}

/// Read-only set of sixteen equally sized templates.
#[derive(Debug, Clone)]
pub struct ContourTemplateSet {
    templates: Box<[Image; CONTOUR_CONFIG_COUNT]>,
    width: usize,
    height: usize,
}

impl ContourTemplateSet {
    /// Load `0.ppm` .. `15.ppm` from `dir`.
    ///
    /// Any missing, undecodable or wrongly sized template fails the whole
    /// load.
    pub fn load<P: AsRef<Path>>(dir: P, step_x: usize, step_y: usize) -> ContourResult<Self> {
        let dir = dir.as_ref();
        let mut images = Vec::with_capacity(CONTOUR_CONFIG_COUNT);
        for code in ContourCode::all() {
            let path = dir.join(format!("{}.ppm", code.value()));
            let image = codec::load_image(&path)
                .map_err(|e| ContourError::template_load(code.value(), e))?;
            debug!(code = code.value(), path = %path.display(), "Loaded contour template");
            images.push(image);
        }
        let set = Self::from_images(images, step_x, step_y)?;
        info!(dir = %dir.display(), step_x, step_y, "Contour templates loaded");
        Ok(set)
    }

    /// Build a set from sixteen images ordered by code.
    pub fn from_images(images: Vec<Image>, step_x: usize, step_y: usize) -> ContourResult<Self> {
        if images.len() != CONTOUR_CONFIG_COUNT {
            return Err(ContourError::config(format!(
                "expected {} contour templates, got {}",
                CONTOUR_CONFIG_COUNT,
                images.len()
            )));
        }
        for (code, image) in images.iter().enumerate() {
            if image.dimensions() != (step_x, step_y) {
                return Err(ContourError::TemplateSize {
                    code: code as u8,
                    expected_width: step_x,
                    expected_height: step_y,
                    actual_width: image.width(),
                    actual_height: image.height(),
                });
            }
        }
        let templates: Box<[Image; CONTOUR_CONFIG_COUNT]> = images
            .into_boxed_slice()
            .try_into()
            .map_err(|_| ContourError::config("contour template count changed during load"))?;
        Ok(Self {
            templates,
            width: step_x,
            height: step_y,
        })
    }

    /// Procedurally rendered canonical templates: black strokes joining the
    /// midpoints of the crossed cell edges on a white tile.
    pub fn builtin(step_x: usize, step_y: usize) -> ContourResult<Self> {
        let images = ContourCode::all()
            .map(|code| render_template(code, step_x, step_y))
            .collect::<ContourResult<Vec<_>>>()?;
        Self::from_images(images, step_x, step_y)
    }

    /// Template for `code`.
    #[inline]
    pub fn lookup(&self, code: ContourCode) -> &Image {
        &self.templates[code.index()]
    }

    /// Template width in pixels (the horizontal grid step).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Template height in pixels (the vertical grid step).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Write the set as `0.ppm` .. `15.ppm` into `dir`, creating it if needed.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> ContourResult<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| ContourError::image_write(dir, e))?;
        for code in ContourCode::all() {
            codec::save_image(self.lookup(code), dir.join(format!("{}.ppm", code.value())))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Edge pairs joined by the contour fragment of each code.
///
/// Saddles (5 and 10) keep the two set corners separated.
fn edge_pairs(code: ContourCode) -> &'static [(Edge, Edge)] {
    use Edge::*;
    match code.value() {
        0 | 15 => &[],
        1 | 14 => &[(Left, Bottom)],
        2 | 13 => &[(Bottom, Right)],
        3 | 12 => &[(Left, Right)],
        4 | 11 => &[(Top, Right)],
        5 => &[(Left, Bottom), (Top, Right)],
        6 | 9 => &[(Top, Bottom)],
        7 | 8 => &[(Left, Top)],
        10 => &[(Left, Top), (Bottom, Right)],
        _ => &[],
    }
}

fn render_template(code: ContourCode, width: usize, height: usize) -> ContourResult<Image> {
    let mut tile = Image::new(width, height, Rgb::WHITE)?;
    let right = (width - 1) as f32;
    let bottom = (height - 1) as f32;
    let midpoint = |edge: Edge| match edge {
        Edge::Top => (right / 2.0, 0.0),
        Edge::Right => (right, bottom / 2.0),
        Edge::Bottom => (right / 2.0, bottom),
        Edge::Left => (0.0, bottom / 2.0),
    };

    for &(a, b) in edge_pairs(code) {
        draw_line(&mut tile, midpoint(a), midpoint(b), Rgb::BLACK);
    }
    Ok(tile)
}

/// DDA line between two `(x, y)` points, inclusive of both ends.
fn draw_line(tile: &mut Image, from: (f32, f32), to: (f32, f32), color: Rgb) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for s in 0..=steps {
        let t = s as f32 / steps as f32;
        let col = (from.0 + t * dx).round() as usize;
        let row = (from.1 + t * dy).round() as usize;
        if row < tile.height() && col < tile.width() {
            tile.set_pixel(row, col, color);
        }
    }
}
