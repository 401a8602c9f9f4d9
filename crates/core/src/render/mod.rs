//! Rendering backends for poster pages.
//!
//! This module provides:
//! - Raster: tiny-skia rendering into an `RgbaImage` (preview, PNG tiles)
//! - PDF: content streams in millimeter user space (document export)
//! - Recorder: resolved geometry for comparing backends

mod pdf;
mod raster;
mod traits;

pub use pdf::{media_box, PdfPageBackend};
pub use raster::{source_pixmap, RasterBackend};
pub use traits::{Color, CommandRecorder, DrawCommand, RecordedOp, RenderBackend, StrokeStyle};

use crate::error::{PosterError, Result};
use image::RgbaImage;
use std::io::Cursor;

/// Encode an image as PNG, optionally recording its DPI in `pHYs`.
pub fn encode_png(image: &RgbaImage, compression: u8, dpi: Option<f64>) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(match compression {
        0..=2 => png::Compression::Fast,
        3..=6 => png::Compression::Default,
        _ => png::Compression::Best,
    });
    if let Some(dpi) = dpi.filter(|d| d.is_finite() && *d > 0.0) {
        let ppm = (dpi / crate::units::MM_PER_INCH * 1000.0).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
    }

    let mut writer = encoder
        .write_header()
        .map_err(|e| PosterError::PngEncoding(format!("Failed to write PNG header: {}", e)))?;

    writer
        .write_image_data(image.as_raw())
        .map_err(|e| PosterError::PngEncoding(format!("Failed to write PNG data: {}", e)))?;

    drop(writer);

    Ok(buffer.into_inner())
}
