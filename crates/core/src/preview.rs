//! Interactive preview: all sheets of a layout side by side, scaled to fit
//! a viewport, with optional guide overlays.
//!
//! The preview draws pages through the same [`PageInstruction`] commands as
//! the exporters. Only the outer translate and scale differ.
//!
//! [`PageInstruction`]: crate::pages::PageInstruction

use crate::config::PreviewConfig;
use crate::error::{PosterError, Result};
use crate::geometry::{Rect, Size};
use crate::layout::PosterLayout;
use crate::render::{
    encode_png, source_pixmap, DrawCommand, RasterBackend, RenderBackend, StrokeStyle,
};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Preview surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Mapping from sheet millimeters to viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewFit {
    /// Pixels per millimeter.
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

/// Fit `sheet` into `viewport` leaving `padding` pixels on each side,
/// centered. Depends only on sizes, never on the layout itself.
pub fn fit_preview(viewport: Viewport, sheet: Size, padding: f64) -> PreviewFit {
    let available_w = (viewport.width as f64 - 2.0 * padding).max(1.0);
    let available_h = (viewport.height as f64 - 2.0 * padding).max(1.0);
    let scale = (available_w / sheet.width).min(available_h / sheet.height);
    PreviewFit {
        scale,
        origin_x: (viewport.width as f64 - sheet.width * scale) / 2.0,
        origin_y: (viewport.height as f64 - sheet.height * scale) / 2.0,
    }
}

/// Renders layouts for on-screen preview.
#[derive(Default)]
pub struct PreviewRenderer {
    config: PreviewConfig,
}

impl PreviewRenderer {
    pub fn new(config: PreviewConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Drawing commands for the whole preview, in viewport pixels.
    pub fn commands(&self, layout: &PosterLayout, viewport: Viewport) -> Vec<DrawCommand> {
        let fit = fit_preview(viewport, layout.sheet_size(), self.config.padding);
        let cfg = &self.config;

        // Keep guide lines a constant pixel width at any zoom
        let line = cfg.line_width / fit.scale;
        let (on, off) = (cfg.dash.0 / fit.scale, cfg.dash.1 / fit.scale);

        let page_size = layout.paper.size();
        let page_rect = Rect::from_size(page_size);
        let has_margins = layout.margins.top > 0.0
            || layout.margins.bottom > 0.0
            || layout.margins.left > 0.0
            || layout.margins.right > 0.0;

        let mut commands = vec![
            DrawCommand::Clear(cfg.background),
            DrawCommand::Save,
            DrawCommand::Translate {
                x: fit.origin_x,
                y: fit.origin_y,
            },
            DrawCommand::Scale(fit.scale),
        ];

        for page in &layout.pages {
            commands.push(DrawCommand::Save);
            commands.push(DrawCommand::Translate {
                x: page.col as f64 * page_size.width,
                y: page.row as f64 * page_size.height,
            });
            commands.push(DrawCommand::FillRect {
                rect: page_rect,
                color: cfg.paper_color,
            });
            commands.extend(page.draw_commands(cfg.margin_color));

            if cfg.show_margin_guides && has_margins {
                commands.push(DrawCommand::StrokeRect {
                    rect: page.printable,
                    style: StrokeStyle::dashed(line, cfg.guide_color, on, off),
                });
            }
            if cfg.show_image_bounds {
                if let Some(visible) = page.visible_area() {
                    commands.push(DrawCommand::StrokeRect {
                        rect: visible,
                        style: StrokeStyle::dashed(line, cfg.bounds_color, on, off),
                    });
                }
            }
            if cfg.show_page_borders {
                commands.push(DrawCommand::StrokeRect {
                    rect: page_rect,
                    style: StrokeStyle::solid(line, cfg.border_color),
                });
            }
            commands.push(DrawCommand::Restore);
        }

        commands.push(DrawCommand::Restore);
        commands
    }

    /// Rasterize the preview.
    pub fn render(
        &self,
        layout: &PosterLayout,
        image: &RgbaImage,
        viewport: Viewport,
    ) -> Result<RgbaImage> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(PosterError::InvalidConfig(format!(
                "viewport must be non-empty, got {}x{}",
                viewport.width, viewport.height
            )));
        }
        let commands = self.commands(layout, viewport);
        let source = source_pixmap(image)?;
        let mut backend = RasterBackend::new(viewport.width, viewport.height)?.with_source(&source);
        backend.execute_commands(&commands)?;
        debug!(
            "Rendered preview {}x{} with {} pages",
            viewport.width,
            viewport.height,
            layout.page_count()
        );
        Ok(backend.into_image())
    }

    /// Rasterize the preview and encode it as PNG.
    pub fn render_png(
        &self,
        layout: &PosterLayout,
        image: &RgbaImage,
        viewport: Viewport,
    ) -> Result<Vec<u8>> {
        let rendered = self.render(layout, image, viewport)?;
        encode_png(&rendered, 6, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PosterSettings;
    use crate::image_source::ImageDescriptor;
    use crate::render::Color;
    use image::Rgba;

    fn layout(settings: &PosterSettings) -> PosterLayout {
        let image = ImageDescriptor::new(40, 30).with_dpi(1.0);
        PosterLayout::compute(Some(&image), settings).unwrap()
    }

    #[test]
    fn test_fit_preview_width_bound() {
        let fit = fit_preview(Viewport::new(500, 500), Size::new(420.0, 297.0), 40.0);
        assert!((fit.scale - 420.0 / 420.0).abs() < 1e-12);
        assert!((fit.origin_x - 40.0).abs() < 1e-9);
        assert!((fit.origin_y - (500.0 - 297.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_preview_height_bound() {
        let fit = fit_preview(Viewport::new(1000, 377), Size::new(210.0, 297.0), 40.0);
        assert!((fit.scale - 1.0).abs() < 1e-12);
        assert!((fit.origin_x - (1000.0 - 210.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_preview_tiny_viewport_stays_positive() {
        let fit = fit_preview(Viewport::new(10, 10), Size::new(210.0, 297.0), 40.0);
        assert!(fit.scale > 0.0);
    }

    #[test]
    fn test_commands_are_balanced() {
        let renderer = PreviewRenderer::default();
        let layout = layout(&PosterSettings::default().margins_cm(1.0, 1.0, 1.0, 1.0));
        let commands = renderer.commands(&layout, Viewport::new(800, 600));
        let saves = commands.iter().filter(|c| **c == DrawCommand::Save).count();
        let restores = commands.iter().filter(|c| **c == DrawCommand::Restore).count();
        assert_eq!(saves, restores);
    }

    #[test]
    fn test_guides_can_be_disabled() {
        let renderer = PreviewRenderer::new(PreviewConfig::default().guides(false)).unwrap();
        let layout = layout(&PosterSettings::default().margins_cm(1.0, 1.0, 1.0, 1.0));
        let strokes = renderer
            .commands(&layout, Viewport::new(800, 600))
            .into_iter()
            .filter(|c| matches!(c, DrawCommand::StrokeRect { .. }))
            .count();
        assert_eq!(strokes, 0);
    }

    #[test]
    fn test_viewport_change_does_not_touch_layout() {
        let renderer = PreviewRenderer::default();
        let layout = layout(&PosterSettings::default());
        let before = layout.clone();
        let _ = renderer.commands(&layout, Viewport::new(100, 100));
        let _ = renderer.commands(&layout, Viewport::new(3000, 900));
        assert_eq!(layout, before);
    }

    #[test]
    fn test_render_draws_image_on_white_page() {
        let source = RgbaImage::from_pixel(40, 30, Rgba([200, 0, 0, 255]));
        let renderer = PreviewRenderer::new(PreviewConfig::default().guides(false)).unwrap();
        // 40x30 px at 1 DPI -> 1016 x 762 mm, several A4 pages
        let layout = layout(&PosterSettings::default());
        let viewport = Viewport::new(400, 300);
        let img = renderer.render(&layout, &source, viewport).unwrap();
        assert_eq!(img.dimensions(), (400, 300));

        let fit = fit_preview(viewport, layout.sheet_size(), 40.0);
        let inside_image = (
            (fit.origin_x + 5.0 * fit.scale) as u32,
            (fit.origin_y + 5.0 * fit.scale) as u32,
        );
        assert_eq!(img.get_pixel(inside_image.0, inside_image.1), &Rgba([200, 0, 0, 255]));
        assert_eq!(img.get_pixel(0, 0), &Rgba(Color::rgb(0.93, 0.93, 0.93).to_rgba8()));
    }

    #[test]
    fn test_render_rejects_empty_viewport() {
        let source = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255]));
        let result = PreviewRenderer::default().render(
            &layout(&PosterSettings::default()),
            &source,
            Viewport::new(0, 10),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_render_png_signature() {
        let source = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255]));
        let png = PreviewRenderer::default()
            .render_png(&layout(&PosterSettings::default()), &source, Viewport::new(64, 64))
            .unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
