//! Size resolution: the poster's physical footprint under each sizing policy.
//!
//! Every policy preserves the image's pixel aspect ratio.

use crate::geometry::Size;
use crate::image_source::ImageDescriptor;
use crate::units::Unit;
use serde::{Deserialize, Serialize};

/// Physical size the image occupies once printed, in millimeters.
pub type Footprint = Size;

/// Active sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizeMode {
    /// Pixel size at the source DPI.
    Native,
    /// Contain-fit inside an explicit box given in the display unit.
    TotalSize { width: f64, height: f64 },
    /// Contain-fit inside `cols` x `rows` printable areas.
    PageGrid { cols: u32, rows: u32 },
    /// Native footprint scaled by `percent / 100`.
    Percentage { percent: f64 },
}

impl SizeMode {
    /// Short name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            SizeMode::Native => "native",
            SizeMode::TotalSize { .. } => "total",
            SizeMode::PageGrid { .. } => "pages",
            SizeMode::Percentage { .. } => "percent",
        }
    }
}

/// Native footprint: `px / dpi * 25.4` on each axis.
pub fn native_footprint(image: &ImageDescriptor) -> Footprint {
    image.native_size_mm()
}

/// Largest size with the given aspect ratio that fits inside `bounds`.
///
/// If the width-bound height fits, width is exact; otherwise height is exact.
pub fn contain_fit(aspect: f64, bounds: Size) -> Size {
    if bounds.width / aspect <= bounds.height {
        Size::new(bounds.width, bounds.width / aspect)
    } else {
        Size::new(bounds.height * aspect, bounds.height)
    }
}

/// Compute the footprint for `mode`.
///
/// Degenerate inputs (non-positive totals, grids or percentages) must have
/// been clamped by the caller; see [`crate::config::PosterSettings::normalized`].
pub fn resolve_footprint(
    image: &ImageDescriptor,
    mode: &SizeMode,
    printable: Size,
    unit: Unit,
) -> Footprint {
    let aspect = image.aspect();
    match *mode {
        SizeMode::Native => native_footprint(image),
        SizeMode::TotalSize { width, height } => {
            contain_fit(aspect, Size::new(unit.to_mm(width), unit.to_mm(height)))
        }
        SizeMode::PageGrid { cols, rows } => contain_fit(
            aspect,
            Size::new(
                cols as f64 * printable.width,
                rows as f64 * printable.height,
            ),
        ),
        SizeMode::Percentage { percent } => native_footprint(image).scaled(percent / 100.0),
    }
}
