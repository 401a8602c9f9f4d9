//! Tiling: how many sheets are needed and where the image sits on them.

use crate::error::{PosterError, Result};
use crate::geometry::Size;
use crate::sizing::Footprint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Horizontal component of an [`Alignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// Vertical component of an [`Alignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Middle,
    Bottom,
}

/// Position of the image inside the tiled printable area (3x3 grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Alignment {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    Center,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Alignment {
    /// All nine positions, row-major from top-left.
    pub const ALL: [Alignment; 9] = [
        Alignment::TopLeft,
        Alignment::TopCenter,
        Alignment::TopRight,
        Alignment::MiddleLeft,
        Alignment::Center,
        Alignment::MiddleRight,
        Alignment::BottomLeft,
        Alignment::BottomCenter,
        Alignment::BottomRight,
    ];

    /// Two-letter code (`C` for the center cell).
    pub fn code(self) -> &'static str {
        match self {
            Alignment::TopLeft => "TL",
            Alignment::TopCenter => "TC",
            Alignment::TopRight => "TR",
            Alignment::MiddleLeft => "ML",
            Alignment::Center => "C",
            Alignment::MiddleRight => "MR",
            Alignment::BottomLeft => "BL",
            Alignment::BottomCenter => "BC",
            Alignment::BottomRight => "BR",
        }
    }

    pub fn horizontal(self) -> Horizontal {
        match self {
            Alignment::TopLeft | Alignment::MiddleLeft | Alignment::BottomLeft => Horizontal::Left,
            Alignment::TopCenter | Alignment::Center | Alignment::BottomCenter => {
                Horizontal::Center
            }
            Alignment::TopRight | Alignment::MiddleRight | Alignment::BottomRight => {
                Horizontal::Right
            }
        }
    }

    pub fn vertical(self) -> Vertical {
        match self {
            Alignment::TopLeft | Alignment::TopCenter | Alignment::TopRight => Vertical::Top,
            Alignment::MiddleLeft | Alignment::Center | Alignment::MiddleRight => Vertical::Middle,
            Alignment::BottomLeft | Alignment::BottomCenter | Alignment::BottomRight => {
                Vertical::Bottom
            }
        }
    }
}

impl FromStr for Alignment {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        let alignment = match key.as_str() {
            "tl" | "top-left" => Alignment::TopLeft,
            "tc" | "top-center" | "top" => Alignment::TopCenter,
            "tr" | "top-right" => Alignment::TopRight,
            "ml" | "middle-left" | "left" => Alignment::MiddleLeft,
            "c" | "center" | "middle-center" => Alignment::Center,
            "mr" | "middle-right" | "right" => Alignment::MiddleRight,
            "bl" | "bottom-left" => Alignment::BottomLeft,
            "bc" | "bottom-center" | "bottom" => Alignment::BottomCenter,
            "br" | "bottom-right" => Alignment::BottomRight,
            _ => return Err(PosterError::UnknownAlignment(s.to_string())),
        };
        Ok(alignment)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Page counts per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileGrid {
    pub cols: u32,
    pub rows: u32,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self { cols: 2, rows: 2 }
    }
}

impl TileGrid {
    /// Grid with each axis clamped to at least one page.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }

    pub fn page_count(&self) -> usize {
        self.checked_page_count().unwrap_or(usize::MAX)
    }

    /// `cols * rows`, or `None` if the product does not fit a `usize`.
    pub fn checked_page_count(&self) -> Option<usize> {
        (self.cols as usize).checked_mul(self.rows as usize)
    }

    /// Whether `other` fits within this grid on both axes.
    pub fn covers(&self, other: &TileGrid) -> bool {
        self.cols >= other.cols && self.rows >= other.rows
    }
}

/// Offset of the image's top-left corner from the top-left of the content area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Result of the tiling computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tiling {
    /// Grid that is shown and exported.
    pub grid: TileGrid,
    /// Smallest grid that covers the footprint.
    pub minimum_grid: TileGrid,
    pub placement: Placement,
    /// Full tiled printable rectangle: `grid * printable`.
    pub content: Size,
    /// The displayed grid is smaller than the footprint requires.
    pub overflows: bool,
}

/// Pages along one axis, saturating at `u32::MAX` for lengths no grid can hold.
fn pages_needed(length: f64, per_page: f64) -> u32 {
    let pages = (length / per_page).ceil();
    if pages.is_nan() || pages < 1.0 {
        1
    } else if pages >= u32::MAX as f64 {
        u32::MAX
    } else {
        pages as u32
    }
}

/// Minimum grid such that `cols * printable.width >= footprint.width` and
/// likewise for rows; each axis is at least one page.
pub fn minimum_grid(footprint: Footprint, printable: Size) -> TileGrid {
    TileGrid::new(
        pages_needed(footprint.width, printable.width),
        pages_needed(footprint.height, printable.height),
    )
}

/// Image offset inside `content` for the given alignment. Slack is never
/// negative: a footprint at least as large as the content sits at zero.
pub fn align(footprint: Footprint, content: Size, alignment: Alignment) -> Placement {
    let slack_x = (content.width - footprint.width).max(0.0);
    let slack_y = (content.height - footprint.height).max(0.0);

    let offset_x = match alignment.horizontal() {
        Horizontal::Left => 0.0,
        Horizontal::Center => slack_x / 2.0,
        Horizontal::Right => slack_x,
    };
    let offset_y = match alignment.vertical() {
        Vertical::Top => 0.0,
        Vertical::Middle => slack_y / 2.0,
        Vertical::Bottom => slack_y,
    };

    Placement { offset_x, offset_y }
}

/// Compute the page grid and image placement.
///
/// With a `requested` grid (page-grid sizing) that grid is displayed
/// verbatim, even when it is larger than needed. A requested grid smaller
/// than the minimum is kept as well; the image is then clipped at the grid
/// edge and `overflows` is set.
pub fn compute_tiling(
    footprint: Footprint,
    printable: Size,
    alignment: Alignment,
    requested: Option<TileGrid>,
) -> Tiling {
    let minimum = minimum_grid(footprint, printable);
    let grid = requested.map(|g| TileGrid::new(g.cols, g.rows)).unwrap_or(minimum);

    let overflows = !grid.covers(&minimum);
    if overflows {
        warn!(
            "Requested {}x{} pages but the image needs {}x{}; it will be clipped",
            grid.cols, grid.rows, minimum.cols, minimum.rows
        );
    }

    let content = Size::new(
        grid.cols as f64 * printable.width,
        grid.rows as f64 * printable.height,
    );

    Tiling {
        grid,
        minimum_grid: minimum,
        placement: align(footprint, content, alignment),
        content,
        overflows,
    }
}
