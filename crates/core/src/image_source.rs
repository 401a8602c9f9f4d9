//! Loading source images and reading their pixel geometry and DPI.

use crate::error::{PosterError, Result};
use crate::geometry::Size;
use crate::units::MM_PER_INCH;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// DPI assumed when the source file does not record one.
pub const DEFAULT_DPI: f64 = 72.0;

/// Supported image file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff",
];

/// Check if a file extension is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Pixel geometry of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: f64,
}

impl ImageDescriptor {
    /// Descriptor at the default 72 DPI.
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
            dpi: DEFAULT_DPI,
        }
    }

    /// Override the DPI. Non-positive values fall back to 72.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = if dpi.is_finite() && dpi > 0.0 {
            dpi
        } else {
            DEFAULT_DPI
        };
        self
    }

    /// Pixel aspect ratio (width / height).
    pub fn aspect(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }

    /// Physical size at the source DPI, in millimeters.
    pub fn native_size_mm(&self) -> Size {
        Size::new(
            self.width_px as f64 / self.dpi * MM_PER_INCH,
            self.height_px as f64 / self.dpi * MM_PER_INCH,
        )
    }
}

/// A decoded image ready for rendering.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub descriptor: ImageDescriptor,
    pub pixels: RgbaImage,
    pub source_path: Option<PathBuf>,
}

impl LoadedImage {
    /// Wrap an already decoded RGBA buffer.
    pub fn from_rgba(pixels: RgbaImage, dpi: f64) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(PosterError::EmptyImage { width, height });
        }
        Ok(Self {
            descriptor: ImageDescriptor::new(width, height).with_dpi(dpi),
            pixels,
            source_path: None,
        })
    }

    /// Decode an image from encoded bytes, picking up its DPI when recorded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?;
        let dpi = detect_dpi(bytes).unwrap_or(DEFAULT_DPI);
        debug!(
            "Decoded {}x{} image at {} DPI",
            decoded.width(),
            decoded.height(),
            dpi
        );
        Self::from_rgba(decoded.to_rgba8(), dpi)
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width_px
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height_px
    }
}

/// Load and decode an image file.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    if !path.exists() {
        return Err(PosterError::InputNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_string();
    if !is_supported_extension(&extension) {
        return Err(PosterError::UnsupportedFormat { extension });
    }

    let bytes = std::fs::read(path)?;
    let mut loaded = LoadedImage::from_bytes(&bytes)?;
    loaded.source_path = Some(path.to_path_buf());

    info!(
        "Loaded {:?}: {}x{} px at {} DPI",
        path,
        loaded.width(),
        loaded.height(),
        loaded.descriptor.dpi
    );
    Ok(loaded)
}

/// Read the horizontal resolution recorded in a PNG or JPEG header.
pub fn detect_dpi(bytes: &[u8]) -> Option<f64> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => png_dpi(bytes),
        image::ImageFormat::Jpeg => jfif_dpi(bytes),
        _ => None,
    }
}

/// DPI from the PNG `pHYs` chunk, when it is expressed per meter.
fn png_dpi(bytes: &[u8]) -> Option<f64> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info().ok()?;
    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter if dims.xppu > 0 => Some(dims.xppu as f64 * MM_PER_INCH / 1000.0),
        _ => None,
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// DPI from the JFIF APP0 density fields.
///
/// Walks the marker segments after SOI until APP0 or start of scan. Each
/// segment is `FF <marker> <length: u16>` where the length counts itself
/// but not the marker. An APP0 JFIF payload is laid out as:
///
/// | offset | size | field                 |
/// |--------|------|-----------------------|
/// | 0      | 5    | `"JFIF\0"`            |
/// | 5      | 2    | version               |
/// | 7      | 1    | units (1 dpi, 2 dpcm) |
/// | 8      | 2    | Xdensity              |
/// | 10     | 2    | Ydensity              |
///
/// Truncated or malformed headers yield `None`.
fn jfif_dpi(data: &[u8]) -> Option<f64> {
    const SOI_LEN: usize = 2;
    const APP0: u8 = 0xE0;
    const SOS: u8 = 0xDA;

    let mut at = SOI_LEN;
    loop {
        if *data.get(at)? != 0xFF {
            return None;
        }
        let marker = *data.get(at + 1)?;
        if marker == SOS {
            return None;
        }
        let length = be_u16(data, at + 2)? as usize;
        if length < 2 {
            return None;
        }
        // Payload excludes the two length bytes
        let payload = data.get(at + 4..at + 2 + length)?;

        if marker == APP0 && payload.starts_with(b"JFIF\0") {
            let units = *payload.get(7)?;
            let density = be_u16(payload, 8)?;
            if density == 0 {
                return None;
            }
            return match units {
                1 => Some(density as f64),
                2 => Some(density as f64 * 2.54),
                _ => None,
            };
        }
        at += 2 + length;
    }
}
