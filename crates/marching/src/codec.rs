//! Raster file decode/encode.
//!
//! Binary PPM (P6) is the native format; anything else the `image` crate
//! understands is accepted on input and chosen by extension on output.

use std::io::Cursor;
use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::io::Reader as ImageReader;
use image::{ColorType, ImageEncoder, ImageFormat};
use tracing::debug;

use contour_common::{ContourError, ContourResult, Image};

/// Decode an image file to RGB.
///
/// The format is sniffed from the file contents, falling back to the
/// extension.
pub fn load_image<P: AsRef<Path>>(path: P) -> ContourResult<Image> {
    let path = path.as_ref();
    let decoded = ImageReader::open(path)
        .map_err(|e| ContourError::image_read(path, e))?
        .with_guessed_format()
        .map_err(|e| ContourError::image_read(path, e))?
        .decode()
        .map_err(|e| ContourError::image_read(path, e))?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    debug!(path = %path.display(), width, height, "Decoded image");
    Image::from_rgb_bytes(width as usize, height as usize, rgb.as_raw())
}

/// Encode an image as binary PPM (P6).
pub fn encode_ppm(image: &Image) -> ContourResult<Vec<u8>> {
    let (width, height) = encoder_dimensions(image)?;
    let mut out = Vec::with_capacity(image.width() * image.height() * 3 + 32);
    PnmEncoder::new(&mut out)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(&image.to_rgb_bytes(), width, height, ColorType::Rgb8)
        .map_err(|e| ContourError::InvalidImage(format!("PPM encoding failed: {}", e)))?;
    Ok(out)
}

/// Decode an in-memory image.
pub fn decode_bytes(bytes: &[u8]) -> ContourResult<Image> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ContourError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| ContourError::InvalidImage(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Image::from_rgb_bytes(width as usize, height as usize, rgb.as_raw())
}

/// Write an image to disk.
///
/// `.ppm`, `.pnm` and unrecognised extensions produce binary PPM; other known
/// extensions use their own encoder.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P) -> ContourResult<()> {
    let path = path.as_ref();
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Pnm) | Err(_) => {
            let bytes = encode_ppm(image)?;
            std::fs::write(path, bytes).map_err(|e| ContourError::image_write(path, e))?;
        }
        Ok(format) => {
            let (width, height) = encoder_dimensions(image)?;
            image::save_buffer_with_format(
                path,
                &image.to_rgb_bytes(),
                width,
                height,
                ColorType::Rgb8,
                format,
            )
            .map_err(|e| ContourError::image_write(path, e))?;
        }
    }
    debug!(path = %path.display(), width = image.width(), height = image.height(), "Wrote image");
    Ok(())
}

fn encoder_dimensions(image: &Image) -> ContourResult<(u32, u32)> {
    let width = u32::try_from(image.width())
        .map_err(|_| ContourError::InvalidImage("width exceeds u32".into()))?;
    let height = u32::try_from(image.height())
        .map_err(|_| ContourError::InvalidImage("height exceeds u32".into()))?;
    Ok((width, height))
}
