//! Editable poster state that recomputes the layout on every change.

use crate::config::{PosterSettings, RenderConfig, SizeModeKind};
use crate::error::{PosterError, Result};
use crate::export::{ExportResult, PdfExporter, TileExporter};
use crate::image_source::{load_image, LoadedImage};
use crate::layout::{LayoutSummary, PosterLayout};
use crate::paper::{Margins, Orientation};
use crate::preview::{PreviewRenderer, Viewport};
use crate::tiling::Alignment;
use crate::units::Unit;
use image::RgbaImage;
use std::path::Path;
use tracing::info;

/// Current image, settings and the layout derived from them.
///
/// Every setter recomputes the whole pipeline synchronously. Without an
/// image the layout is `None` and queries fail with [`PosterError::NoImage`].
#[derive(Debug, Clone, Default)]
pub struct PosterSession {
    settings: PosterSettings,
    image: Option<LoadedImage>,
    layout: Option<PosterLayout>,
}

impl PosterSession {
    /// Start a session; fails on configuration errors.
    pub fn new(settings: PosterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            image: None,
            layout: None,
        })
    }

    pub fn settings(&self) -> &PosterSettings {
        &self.settings
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    /// The current layout.
    pub fn layout(&self) -> Result<&PosterLayout> {
        self.layout.as_ref().ok_or(PosterError::NoImage)
    }

    pub fn summary(&self) -> Result<LayoutSummary> {
        Ok(self.layout()?.summary())
    }

    fn recompute(&mut self) -> Result<()> {
        self.layout = match &self.image {
            Some(image) => Some(PosterLayout::compute(
                Some(&image.descriptor),
                &self.settings,
            )?),
            None => None,
        };
        Ok(())
    }

    /// Apply a settings change, keeping the previous state if it fails.
    fn update(&mut self, change: impl FnOnce(&mut PosterSettings)) -> Result<()> {
        let previous = self.settings.clone();
        change(&mut self.settings);
        if let Err(e) = self.settings.validate().and_then(|_| self.recompute()) {
            self.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Replace the image wholesale and seed the size fields from its
    /// native size.
    pub fn set_image(&mut self, image: LoadedImage) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.seed_from_native(&image.descriptor)?;
        info!(
            "Image set: {}x{} px at {} DPI, {} page(s) needed natively",
            image.width(),
            image.height(),
            image.descriptor.dpi,
            settings.page_grid.page_count()
        );
        let layout = PosterLayout::compute(Some(&image.descriptor), &settings)?;
        self.settings = settings;
        self.image = Some(image);
        self.layout = Some(layout);
        Ok(())
    }

    /// Load an image file and make it current.
    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = load_image(path)?;
        self.set_image(image)
    }

    /// Replace all settings at once.
    pub fn set_settings(&mut self, settings: PosterSettings) -> Result<()> {
        self.update(|s| *s = settings)
    }

    pub fn set_paper(&mut self, name: &str) -> Result<()> {
        self.update(|s| s.paper = name.to_string())
    }

    pub fn set_custom_paper(&mut self, width_cm: f64, height_cm: f64) -> Result<()> {
        self.update(|s| *s = s.clone().custom_paper(width_cm, height_cm))
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.update(|s| s.orientation = orientation)
    }

    pub fn set_margins(&mut self, margins: Margins) -> Result<()> {
        self.update(|s| s.margins = margins)
    }

    /// Change the display unit; the stored total size is re-expressed from
    /// the native size in the new unit.
    pub fn set_unit(&mut self, unit: Unit) -> Result<()> {
        let descriptor = self.image.as_ref().map(|i| i.descriptor);
        self.update(|s| {
            s.unit = unit;
            if let Some(descriptor) = descriptor {
                s.seed_total_size(&descriptor);
            }
        })
    }

    pub fn set_mode(&mut self, mode: SizeModeKind) -> Result<()> {
        self.update(|s| s.mode = mode)
    }

    pub fn set_total_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.update(|s| *s = s.clone().total_size(width, height))
    }

    pub fn set_page_grid(&mut self, cols: u32, rows: u32) -> Result<()> {
        self.update(|s| *s = s.clone().page_grid(cols, rows))
    }

    pub fn set_percentage(&mut self, percent: f64) -> Result<()> {
        self.update(|s| *s = s.clone().percentage(percent))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> Result<()> {
        self.update(|s| s.alignment = alignment)
    }

    fn require(&self) -> Result<(&PosterLayout, &RgbaImage)> {
        let layout = self.layout()?;
        let image = self.image.as_ref().ok_or(PosterError::NoImage)?;
        Ok((layout, &image.pixels))
    }

    /// Write the multi-page PDF.
    pub fn export_pdf(&self, path: &Path) -> Result<ExportResult> {
        self.export_pdf_with(&PdfExporter::new(), path)
    }

    /// Write the PDF document with a configured exporter.
    pub fn export_pdf_with(&self, exporter: &PdfExporter, path: &Path) -> Result<ExportResult> {
        let (layout, image) = self.require()?;
        exporter.export(layout, image, path)
    }

    /// Write one PNG per page.
    pub fn export_tiles(
        &self,
        config: RenderConfig,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<ExportResult> {
        let (layout, image) = self.require()?;
        let exporter = TileExporter::new(config)?;
        exporter.export(layout, image, output_dir, prefix)
    }

    /// Rasterize the preview for a viewport.
    pub fn render_preview(&self, renderer: &PreviewRenderer, viewport: Viewport) -> Result<RgbaImage> {
        let (layout, image) = self.require()?;
        renderer.render(layout, image, viewport)
    }
}
