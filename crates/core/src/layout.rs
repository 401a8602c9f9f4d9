//! The full layout pipeline: paper, footprint, tiling and pages.

use crate::config::PosterSettings;
use crate::error::{PosterError, Result};
use crate::geometry::Size;
use crate::image_source::ImageDescriptor;
use crate::pages::{emit_pages, PageInstruction};
use crate::paper::{Margins, PaperSpec};
use crate::sizing::{resolve_footprint, Footprint, SizeMode};
use crate::tiling::{compute_tiling, Tiling};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest page grid a layout may produce.
pub const MAX_PAGE_COUNT: usize = 10_000;

/// Everything derived from one image and one set of settings.
///
/// Layouts are scale-independent; renderers apply their own uniform scale.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterLayout {
    pub image: ImageDescriptor,
    pub paper: PaperSpec,
    pub margins: Margins,
    pub printable: Size,
    pub unit: Unit,
    pub mode: SizeMode,
    pub footprint: Footprint,
    pub tiling: Tiling,
    pub pages: Vec<PageInstruction>,
}

impl PosterLayout {
    /// Run the pipeline.
    ///
    /// Fails with [`PosterError::NoImage`] before doing any work when no
    /// image is loaded, and with a configuration error for an unknown paper
    /// or invalid custom dimensions. Degenerate numbers are clamped.
    pub fn compute(image: Option<&ImageDescriptor>, settings: &PosterSettings) -> Result<Self> {
        let image = *image.ok_or(PosterError::NoImage)?;
        settings.validate()?;
        let settings = settings.normalized();

        let paper = settings.resolve_paper()?;
        let printable = settings.margins.printable_area(paper.size());
        let mode = settings.size_mode();
        let footprint = resolve_footprint(&image, &mode, printable, settings.unit);
        let tiling = compute_tiling(
            footprint,
            printable,
            settings.alignment,
            settings.requested_grid(),
        );
        match tiling.grid.checked_page_count() {
            Some(count) if count <= MAX_PAGE_COUNT => {}
            count => {
                return Err(PosterError::InvalidConfig(format!(
                    "layout needs {}x{} = {} pages, limit is {}",
                    tiling.grid.cols,
                    tiling.grid.rows,
                    count.map_or_else(|| "too many".to_string(), |c| c.to_string()),
                    MAX_PAGE_COUNT
                )));
            }
        }
        let pages = emit_pages(
            tiling.grid,
            tiling.placement,
            printable,
            &settings.margins,
            footprint,
            paper.size(),
        );

        debug!(
            "Layout: {} mode, footprint {:.2}x{:.2} mm, {}x{} pages of {} {}",
            mode.name(),
            footprint.width,
            footprint.height,
            tiling.grid.cols,
            tiling.grid.rows,
            paper.name(),
            paper.orientation
        );

        Ok(Self {
            image,
            paper,
            margins: settings.margins,
            printable,
            unit: settings.unit,
            mode,
            footprint,
            tiling,
            pages,
        })
    }

    /// Total number of sheets (`cols * rows`).
    pub fn page_count(&self) -> usize {
        self.tiling.grid.page_count()
    }

    /// Size of all sheets laid edge to edge, in millimeters.
    pub fn sheet_size(&self) -> Size {
        Size::new(
            self.tiling.grid.cols as f64 * self.paper.width_mm,
            self.tiling.grid.rows as f64 * self.paper.height_mm,
        )
    }

    /// Serializable summary for reporting.
    pub fn summary(&self) -> LayoutSummary {
        LayoutSummary {
            paper: self.paper.name().to_string(),
            orientation: self.paper.orientation.to_string(),
            paper_mm: self.paper.size(),
            printable_mm: self.printable,
            mode: self.mode.name().to_string(),
            unit: self.unit,
            footprint_mm: self.footprint,
            footprint_cm: Size::new(self.footprint.width / 10.0, self.footprint.height / 10.0),
            footprint_in_unit: Size::new(
                self.unit.from_mm(self.footprint.width),
                self.unit.from_mm(self.footprint.height),
            ),
            cols: self.tiling.grid.cols,
            rows: self.tiling.grid.rows,
            page_count: self.page_count(),
            minimum_cols: self.tiling.minimum_grid.cols,
            minimum_rows: self.tiling.minimum_grid.rows,
            offset_x_mm: self.tiling.placement.offset_x,
            offset_y_mm: self.tiling.placement.offset_y,
            overflows: self.tiling.overflows,
        }
    }
}

/// Flat report of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub paper: String,
    pub orientation: String,
    pub paper_mm: Size,
    pub printable_mm: Size,
    pub mode: String,
    pub unit: Unit,
    pub footprint_mm: Size,
    pub footprint_cm: Size,
    pub footprint_in_unit: Size,
    pub cols: u32,
    pub rows: u32,
    pub page_count: usize,
    pub minimum_cols: u32,
    pub minimum_rows: u32,
    pub offset_x_mm: f64,
    pub offset_y_mm: f64,
    pub overflows: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::Orientation;
    use crate::tiling::{Alignment, TileGrid};

    fn photo() -> ImageDescriptor {
        ImageDescriptor::new(4000, 3000).with_dpi(300.0)
    }

    #[test]
    fn test_no_image_rejected() {
        let result = PosterLayout::compute(None, &PosterSettings::default());
        assert!(matches!(result, Err(PosterError::NoImage)));
    }

    #[test]
    fn test_no_image_rejected_before_config_check() {
        let settings = PosterSettings::default().paper("Nope");
        let result = PosterLayout::compute(None, &settings);
        assert!(matches!(result, Err(PosterError::NoImage)));
    }

    #[test]
    fn test_unknown_paper_rejected() {
        let settings = PosterSettings::default().paper("Nope");
        let result = PosterLayout::compute(Some(&photo()), &settings);
        assert!(matches!(result, Err(PosterError::UnknownPaper(_))));
    }

    #[test]
    fn test_native_a4_two_pages() {
        let layout = PosterLayout::compute(Some(&photo()), &PosterSettings::default()).unwrap();
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.sheet_size(), Size::new(420.0, 297.0));
    }

    #[test]
    fn test_landscape_changes_grid() {
        let settings = PosterSettings::default().orientation(Orientation::Landscape);
        let layout = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        // 297 x 210: ceil(338.67/297)=2, ceil(254/210)=2
        assert_eq!(layout.tiling.grid, TileGrid::new(2, 2));
    }

    #[test]
    fn test_degenerate_grid_clamped() {
        let settings = PosterSettings::default().page_grid(0, 0);
        let layout = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn test_margins_exceeding_paper_keep_positive_printable() {
        // 100x80 px at 300 DPI: 8.47 x 6.77 mm
        let small = ImageDescriptor::new(100, 80).with_dpi(300.0);
        let settings = PosterSettings::default().margins(Margins::uniform(500.0));
        let layout = PosterLayout::compute(Some(&small), &settings).unwrap();
        assert_eq!(layout.printable, Size::new(1.0, 1.0));
        assert_eq!(layout.tiling.grid, TileGrid::new(9, 7));
        assert_eq!(layout.pages.len(), 63);
    }

    // ========== Page Limit ==========

    #[test]
    fn test_huge_percentage_rejected() {
        let settings = PosterSettings::default().percentage(1e12);
        let result = PosterLayout::compute(Some(&photo()), &settings);
        assert!(matches!(result, Err(PosterError::InvalidConfig(_))));
    }

    #[test]
    fn test_huge_page_grid_rejected() {
        let settings = PosterSettings::default().page_grid(u32::MAX, u32::MAX);
        let result = PosterLayout::compute(Some(&photo()), &settings);
        assert!(matches!(result, Err(PosterError::InvalidConfig(_))));
    }

    #[test]
    fn test_tiny_dpi_rejected() {
        // 4000 px at 0.0254 DPI is 4 km wide
        let image = ImageDescriptor::new(4000, 3000).with_dpi(0.0254);
        let result = PosterLayout::compute(Some(&image), &PosterSettings::default());
        assert!(matches!(result, Err(PosterError::InvalidConfig(_))));
    }

    #[test]
    fn test_grid_at_page_limit_accepted() {
        let settings = PosterSettings::default().page_grid(100, 100);
        let layout = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        assert_eq!(layout.pages.len(), MAX_PAGE_COUNT);

        let settings = PosterSettings::default().page_grid(100, 101);
        assert!(PosterLayout::compute(Some(&photo()), &settings).is_err());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let settings = PosterSettings::default()
            .page_grid(3, 2)
            .alignment(Alignment::BottomRight)
            .margins_cm(1.0, 1.0, 1.0, 1.0);
        let a = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        let b = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_units() {
        let settings = PosterSettings::default().percentage(50.0).unit(Unit::Mm);
        let layout = PosterLayout::compute(Some(&photo()), &settings).unwrap();
        let summary = layout.summary();
        assert_eq!(summary.mode, "percent");
        assert!((summary.footprint_cm.height - 12.7).abs() < 1e-9);
        assert!((summary.footprint_in_unit.height - 127.0).abs() < 1e-9);
        assert_eq!(summary.page_count, 1);
        assert!(!summary.overflows);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["page_count"], 1);
        assert_eq!(json["unit"], "mm");
    }
}
