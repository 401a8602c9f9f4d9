//! Configuration types for poster layout, rendering and preview.

use crate::error::{PosterError, Result};
use crate::geometry::Size;
use crate::image_source::ImageDescriptor;
use crate::paper::{self, CustomPaper, Margins, Orientation, PaperSpec, CUSTOM_PAPER};
use crate::render::Color;
use crate::sizing::{native_footprint, SizeMode};
use crate::tiling::{minimum_grid, Alignment, TileGrid};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which sizing policy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizeModeKind {
    #[default]
    Native,
    Total,
    Pages,
    Percent,
}

impl FromStr for SizeModeKind {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(SizeModeKind::Native),
            "total" | "total-size" | "size" => Ok(SizeModeKind::Total),
            "pages" | "page-grid" | "grid" => Ok(SizeModeKind::Pages),
            "percent" | "percentage" | "scale" => Ok(SizeModeKind::Percent),
            _ => Err(PosterError::InvalidConfig(format!(
                "unknown size mode '{}' (expected native, total, pages or percent)",
                s
            ))),
        }
    }
}

impl fmt::Display for SizeModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeModeKind::Native => "native",
            SizeModeKind::Total => "total",
            SizeModeKind::Pages => "pages",
            SizeModeKind::Percent => "percent",
        })
    }
}

/// User-facing poster settings.
///
/// Every mode keeps its own stored values; switching modes leaves the
/// others untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PosterSettings {
    /// Paper preset name, or "Custom".
    /// Default: "A4".
    pub paper: String,

    /// Custom paper dimensions in centimeters, used when `paper` is "Custom".
    pub custom_paper: CustomPaper,

    /// Default: portrait.
    pub orientation: Orientation,

    /// Margins in millimeters.
    pub margins: Margins,

    /// Display unit for `total_size`.
    /// Default: cm.
    pub unit: Unit,

    /// Active sizing policy.
    pub mode: SizeModeKind,

    /// Requested total size in `unit`.
    /// Default: 100 x 100.
    pub total_size: Size,

    /// Requested page grid.
    /// Default: 2 x 2.
    pub page_grid: TileGrid,

    /// Scale of the native size in percent.
    /// Default: 100.
    pub percentage: f64,

    /// Default: top-left.
    pub alignment: Alignment,
}

impl Default for PosterSettings {
    fn default() -> Self {
        Self {
            paper: "A4".to_string(),
            custom_paper: CustomPaper::default(),
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            unit: Unit::Cm,
            mode: SizeModeKind::Native,
            total_size: Size::new(100.0, 100.0),
            page_grid: TileGrid::default(),
            percentage: 100.0,
            alignment: Alignment::TopLeft,
        }
    }
}

impl PosterSettings {
    /// Set the paper preset.
    pub fn paper(mut self, name: impl Into<String>) -> Self {
        self.paper = name.into();
        self
    }

    /// Use custom paper dimensions in centimeters.
    pub fn custom_paper(mut self, width_cm: f64, height_cm: f64) -> Self {
        self.paper = CUSTOM_PAPER.to_string();
        self.custom_paper = CustomPaper::new(width_cm, height_cm);
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set margins in millimeters.
    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Set margins from centimeter inputs.
    pub fn margins_cm(self, top: f64, bottom: f64, left: f64, right: f64) -> Self {
        self.margins(Margins::from_cm(top, bottom, left, right))
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Switch the active mode without touching stored values.
    pub fn mode(mut self, mode: SizeModeKind) -> Self {
        self.mode = mode;
        self
    }

    /// Activate total-size mode with a box in the display unit.
    pub fn total_size(mut self, width: f64, height: f64) -> Self {
        self.mode = SizeModeKind::Total;
        self.total_size = Size::new(width, height);
        self
    }

    /// Activate page-grid mode.
    pub fn page_grid(mut self, cols: u32, rows: u32) -> Self {
        self.mode = SizeModeKind::Pages;
        self.page_grid = TileGrid { cols, rows };
        self
    }

    /// Activate percentage mode.
    pub fn percentage(mut self, percent: f64) -> Self {
        self.mode = SizeModeKind::Percent;
        self.percentage = percent;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Reject configuration errors: unknown paper, missing or invalid custom
    /// dimensions and non-finite numbers.
    pub fn validate(&self) -> Result<()> {
        if !paper::is_known_paper(&self.paper) {
            return Err(PosterError::UnknownPaper(self.paper.clone()));
        }
        if self.paper.eq_ignore_ascii_case(CUSTOM_PAPER) {
            let CustomPaper {
                width_cm,
                height_cm,
            } = self.custom_paper;
            if !(width_cm.is_finite() && height_cm.is_finite() && width_cm > 0.0 && height_cm > 0.0)
            {
                return Err(PosterError::InvalidConfig(
                    "custom paper width and height must be positive".to_string(),
                ));
            }
        }
        let numbers = [
            self.margins.top,
            self.margins.bottom,
            self.margins.left,
            self.margins.right,
            self.total_size.width,
            self.total_size.height,
            self.percentage,
        ];
        if numbers.iter().any(|v| !v.is_finite()) {
            return Err(PosterError::InvalidConfig(
                "margins, sizes and percentage must be finite numbers".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with degenerate numeric input clamped: totals, grid and
    /// percentage to at least 1, negative margins to 0.
    pub fn normalized(&self) -> Self {
        let at_least_one = |v: f64| if v.is_finite() && v >= 1.0 { v } else { 1.0 };
        Self {
            margins: self.margins.clamped(),
            total_size: Size::new(
                at_least_one(self.total_size.width),
                at_least_one(self.total_size.height),
            ),
            page_grid: TileGrid::new(self.page_grid.cols, self.page_grid.rows),
            percentage: at_least_one(self.percentage),
            ..self.clone()
        }
    }

    /// The active sizing policy with its stored values.
    pub fn size_mode(&self) -> SizeMode {
        match self.mode {
            SizeModeKind::Native => SizeMode::Native,
            SizeModeKind::Total => SizeMode::TotalSize {
                width: self.total_size.width,
                height: self.total_size.height,
            },
            SizeModeKind::Pages => SizeMode::PageGrid {
                cols: self.page_grid.cols,
                rows: self.page_grid.rows,
            },
            SizeModeKind::Percent => SizeMode::Percentage {
                percent: self.percentage,
            },
        }
    }

    /// Requested grid when page-grid mode is active.
    pub fn requested_grid(&self) -> Option<TileGrid> {
        match self.mode {
            SizeModeKind::Pages => Some(self.page_grid),
            _ => None,
        }
    }

    /// Resolve the paper preset with orientation applied.
    pub fn resolve_paper(&self) -> Result<PaperSpec> {
        paper::resolve_paper(&self.paper, Some(self.custom_paper), self.orientation)
    }

    /// Seed the total-size and page-grid fields from an image's native size.
    ///
    /// The total is expressed in the display unit, rounded to 0.1; the grid
    /// is the minimum grid for the native footprint on the current paper.
    pub fn seed_from_native(&mut self, image: &ImageDescriptor) -> Result<()> {
        let native = native_footprint(image);
        self.seed_total_size(image);
        let paper = self.resolve_paper()?;
        let printable = self.margins.clamped().printable_area(paper.size());
        self.page_grid = minimum_grid(native, printable);
        Ok(())
    }

    /// Re-express the native size in the display unit (after a unit change).
    pub fn seed_total_size(&mut self, image: &ImageDescriptor) {
        let native = native_footprint(image);
        let round = |v: f64| (v * 10.0).round() / 10.0;
        self.total_size = Size::new(
            round(self.unit.from_mm(native.width)),
            round(self.unit.from_mm(native.height)),
        );
    }
}

/// Configuration for raster tile rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output DPI (dots per inch).
    /// Default: 150.
    pub dpi: u32,

    /// Number of threads for parallel page rendering.
    /// Default: number of CPU cores.
    pub render_threads: usize,

    /// PNG compression level (0-9, higher = smaller file, slower).
    /// Default: 6.
    pub png_compression: u8,

    /// Page background behind the image.
    /// Default: white.
    pub background: Color,

    /// Fill for the margin bands.
    /// Default: white.
    pub margin_color: Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            render_threads: num_cpus::get(),
            png_compression: 6,
            background: Color::WHITE,
            margin_color: Color::WHITE,
        }
    }
}

impl RenderConfig {
    /// Create a render config with specified DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    /// Set the number of render threads.
    pub fn render_threads(mut self, threads: usize) -> Self {
        self.render_threads = threads;
        self
    }

    /// Set PNG compression level.
    pub fn png_compression(mut self, level: u8) -> Self {
        self.png_compression = level.min(9);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn margin_color(mut self, color: Color) -> Self {
        self.margin_color = color;
        self
    }

    /// Pixels per millimeter at the configured DPI.
    pub fn px_per_mm(&self) -> f64 {
        crate::units::mm_to_px(1.0, self.dpi as f64)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 || self.dpi > 1200 {
            return Err(PosterError::InvalidConfig(
                "dpi must be between 1 and 1200".to_string(),
            ));
        }
        if self.render_threads == 0 {
            return Err(PosterError::InvalidConfig(
                "render_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the interactive preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Space kept free around the sheet, in pixels.
    /// Default: 40.
    pub padding: f64,

    /// Viewport background.
    pub background: Color,

    /// Sheet (paper) color.
    pub paper_color: Color,

    /// Fill for the margin bands.
    pub margin_color: Color,

    pub show_page_borders: bool,
    pub show_margin_guides: bool,
    pub show_image_bounds: bool,

    pub border_color: Color,
    pub guide_color: Color,
    pub bounds_color: Color,

    /// Guide line width in pixels, independent of zoom.
    /// Default: 1.
    pub line_width: f64,

    /// Dash on/off length in pixels.
    /// Default: 6 / 4.
    pub dash: (f64, f64),
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            padding: 40.0,
            background: Color::rgb(0.93, 0.93, 0.93),
            paper_color: Color::WHITE,
            margin_color: Color::WHITE,
            show_page_borders: true,
            show_margin_guides: true,
            show_image_bounds: true,
            border_color: Color::BLACK,
            guide_color: Color::GUIDE_GREY,
            bounds_color: Color::BOUNDS_GREEN,
            line_width: 1.0,
            dash: (6.0, 4.0),
        }
    }
}

impl PreviewConfig {
    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Fill for the margin bands.
    pub fn margin_color(mut self, color: Color) -> Self {
        self.margin_color = color;
        self
    }

    /// Toggle all guide overlays at once.
    pub fn guides(mut self, enabled: bool) -> Self {
        self.show_page_borders = enabled;
        self.show_margin_guides = enabled;
        self.show_image_bounds = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(PosterError::InvalidConfig(
                "padding must be a non-negative number".to_string(),
            ));
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(PosterError::InvalidConfig(
                "line_width must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
