//! Per-page geometry shared by every consumer of a layout.
//!
//! The image is treated as one canvas the size of the footprint. Each page
//! is a window cut out of that canvas; the window's position depends only
//! on the page's grid cell and the alignment placement. The preview and
//! both exporters draw pages exclusively through [`PageInstruction::draw_commands`].

use crate::geometry::{Rect, Size};
use crate::layout::MAX_PAGE_COUNT;
use crate::paper::Margins;
use crate::render::{Color, DrawCommand};
use crate::sizing::Footprint;
use crate::tiling::{Placement, TileGrid};
use serde::{Deserialize, Serialize};

/// Everything needed to draw one sheet, in page millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInstruction {
    /// Zero-based position in row-major order.
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub page_size: Size,
    /// Printable rectangle on the page.
    pub printable: Rect,
    /// Window into the image canvas, measured from the image's top-left.
    pub crop: Rect,
    /// Where the whole image lands on this page (mostly off-page).
    pub image_rect: Rect,
    /// Opaque bands painted over the margins after the image.
    pub margin_bands: Vec<Rect>,
}

impl PageInstruction {
    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Part of the printable rectangle actually covered by the image.
    pub fn visible_area(&self) -> Option<Rect> {
        self.printable.intersect(&self.image_rect)
    }

    /// True when no image content falls on this page.
    pub fn is_blank(&self) -> bool {
        self.visible_area().is_none()
    }

    /// Drawing commands for this page in page millimeters.
    ///
    /// Clips to the printable rectangle, draws the image window, then
    /// paints the margin bands with `mask`. The state is saved and restored
    /// so callers can position the page with their own transform first.
    pub fn draw_commands(&self, mask: Color) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(5 + self.margin_bands.len());
        commands.push(DrawCommand::Save);
        commands.push(DrawCommand::Clip(self.printable));
        commands.push(DrawCommand::DrawImage(self.image_rect));
        commands.push(DrawCommand::Restore);
        commands.push(DrawCommand::Save);
        commands.push(DrawCommand::Clip(Rect::from_size(self.page_size)));
        for band in &self.margin_bands {
            commands.push(DrawCommand::FillRect {
                rect: *band,
                color: mask,
            });
        }
        commands.push(DrawCommand::Restore);
        commands
    }
}

/// Emit one instruction per grid cell, row-major.
pub fn emit_pages(
    grid: TileGrid,
    placement: Placement,
    printable: Size,
    margins: &Margins,
    footprint: Footprint,
    page_size: Size,
) -> Vec<PageInstruction> {
    let printable_rect = Rect::new(margins.left, margins.top, printable.width, printable.height);
    let bands = margins.bands(page_size);

    let mut pages = Vec::with_capacity(grid.page_count().min(MAX_PAGE_COUNT));
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let crop = Rect::new(
                col as f64 * printable.width - placement.offset_x,
                row as f64 * printable.height - placement.offset_y,
                printable.width,
                printable.height,
            );
            let image_rect = Rect::new(
                printable_rect.x - crop.x,
                printable_rect.y - crop.y,
                footprint.width,
                footprint.height,
            );
            pages.push(PageInstruction {
                index: pages.len(),
                row,
                col,
                page_size,
                printable: printable_rect,
                crop,
                image_rect,
                margin_bands: bands.clone(),
            });
        }
    }
    pages
}
