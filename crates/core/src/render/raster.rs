//! Software rasterizer over a `tiny_skia::Pixmap`.
//!
//! Used by the preview and by tile export. Everything is drawn without
//! anti-aliasing so adjacent tiles and margin bands meet on exact pixel
//! boundaries; the source is sampled nearest-neighbour.

use super::traits::{Color, RenderBackend, StrokeStyle};
use crate::error::{PosterError, Result};
use crate::geometry::{Rect, Transform};
use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    StrokeDash,
};

/// Convert a straight-alpha RGBA image into a premultiplied pixmap.
pub fn source_pixmap(image: &RgbaImage) -> Result<Pixmap> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        PosterError::Render(format!("cannot allocate {}x{} source pixmap", width, height))
    })?;
    for (src, dst) in image.pixels().zip(pixmap.pixels_mut()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

fn sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        color.a.clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

fn solid_paint(color: Color, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.anti_alias = anti_alias;
    paint
}

fn sk_rect(rect: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )
}

/// Raster rendering backend.
pub struct RasterBackend<'a> {
    pixmap: Pixmap,
    source: Option<&'a Pixmap>,
    transform: Transform,
    /// Coverage of the current clip; `None` means the whole canvas.
    clip: Option<Mask>,
    stack: Vec<(Transform, Option<Mask>)>,
}

impl<'a> RasterBackend<'a> {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            PosterError::Render(format!(
                "canvas must be between 1x1 pixels and the pixmap size limit, got {}x{}",
                width, height
            ))
        })?;
        Ok(Self {
            pixmap,
            source: None,
            transform: Transform::IDENTITY,
            clip: None,
            stack: Vec::new(),
        })
    }

    /// Bind the image drawn by `DrawImage` commands; see [`source_pixmap`].
    pub fn with_source(mut self, source: &'a Pixmap) -> Self {
        self.source = Some(source);
        self
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Finish rendering and return straight-alpha pixels.
    pub fn into_image(self) -> RgbaImage {
        let width = self.pixmap.width();
        let pixels = self.pixmap.pixels();
        RgbaImage::from_fn(width, self.pixmap.height(), |x, y| {
            let c = pixels[(y * width + x) as usize].demultiply();
            Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    fn device_transform(&self) -> tiny_skia::Transform {
        let t = self.transform;
        tiny_skia::Transform::from_row(
            t.scale as f32,
            0.0,
            0.0,
            t.scale as f32,
            t.dx as f32,
            t.dy as f32,
        )
    }
}

impl RenderBackend for RasterBackend<'_> {
    fn clear(&mut self, color: Color) -> Result<()> {
        self.pixmap.fill(sk_color(color));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<()> {
        if let Some(r) = sk_rect(rect) {
            let ts = self.device_transform();
            self.pixmap
                .fill_rect(r, &solid_paint(color, false), ts, self.clip.as_ref());
        }
        Ok(())
    }

    fn stroke_rect(&mut self, rect: &Rect, style: &StrokeStyle) -> Result<()> {
        let Some(r) = sk_rect(rect) else {
            return Ok(());
        };
        let path = PathBuilder::from_rect(r);

        // Never thinner than one device pixel
        let min_width = 1.0 / self.transform.scale;
        let mut stroke = Stroke {
            width: style.width.max(min_width) as f32,
            ..Stroke::default()
        };
        if let Some(pattern) = &style.dash {
            let pattern: Vec<f32> = pattern.iter().map(|v| *v as f32).collect();
            stroke.dash = StrokeDash::new(pattern, 0.0);
        }

        let ts = self.device_transform();
        self.pixmap.stroke_path(
            &path,
            &solid_paint(style.color, false),
            &stroke,
            ts,
            self.clip.as_ref(),
        );
        Ok(())
    }

    fn draw_image(&mut self, dest: &Rect) -> Result<()> {
        let source = self
            .source
            .ok_or_else(|| PosterError::Render("no source image bound".to_string()))?;
        if dest.is_empty() {
            return Ok(());
        }

        // Source pixels onto `dest`, then into device space
        let placement = tiny_skia::Transform::from_row(
            (dest.width / source.width() as f64) as f32,
            0.0,
            0.0,
            (dest.height / source.height() as f64) as f32,
            dest.x as f32,
            dest.y as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        let ts = self.device_transform().pre_concat(placement);
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, ts, self.clip.as_ref());
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.stack.push((self.transform, self.clip.clone()));
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        let (transform, clip) = self
            .stack
            .pop()
            .ok_or_else(|| PosterError::Render("restore without matching save".to_string()))?;
        self.transform = transform;
        self.clip = clip;
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.transform = self.transform.translate(x, y);
        Ok(())
    }

    fn scale(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(PosterError::Render(format!("invalid scale factor {}", factor)));
        }
        self.transform = self.transform.scale_by(factor);
        Ok(())
    }

    fn clip(&mut self, rect: &Rect) -> Result<()> {
        let ts = self.device_transform();
        let path = sk_rect(rect).map(PathBuilder::from_rect);
        if let Some(mask) = self.clip.as_mut() {
            match path {
                Some(path) => mask.intersect_path(&path, FillRule::Winding, false, ts),
                // Empty rectangle: nothing stays visible
                None => mask.data_mut().fill(0),
            }
            return Ok(());
        }

        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())
            .ok_or_else(|| PosterError::Render("cannot allocate clip mask".to_string()))?;
        if let Some(path) = path {
            mask.fill_path(&path, FillRule::Winding, false, ts);
        }
        self.clip = Some(mask);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCommand;

    const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    const WHITE_PX: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const RED_PX: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn quadrant_source() -> Pixmap {
        // 2x2: red, green / blue, white
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        source_pixmap(&img).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_canvas() {
        assert!(matches!(RasterBackend::new(0, 10), Err(PosterError::Render(_))));
    }

    #[test]
    fn test_source_pixmap_premultiplies() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        let pixmap = source_pixmap(&img).unwrap();
        let px = pixmap.pixels()[0];
        assert_eq!(px.alpha(), 128);
        assert!(px.red() >= 99 && px.red() <= 101, "got {:?}", px);
    }

    #[test]
    fn test_clear_and_fill() {
        let mut backend = RasterBackend::new(10, 10).unwrap();
        backend.clear(Color::WHITE).unwrap();
        backend.fill_rect(&Rect::new(2.0, 2.0, 3.0, 3.0), RED).unwrap();
        let img = backend.into_image();
        assert_eq!(img.get_pixel(0, 0), &WHITE_PX);
        assert_eq!(img.get_pixel(2, 2), &RED_PX);
        assert_eq!(img.get_pixel(4, 4), &RED_PX);
        assert_eq!(img.get_pixel(6, 6), &WHITE_PX);
    }

    #[test]
    fn test_fill_respects_scale_and_translate() {
        let mut backend = RasterBackend::new(20, 20).unwrap();
        backend
            .execute_commands(&[
                DrawCommand::Clear(Color::WHITE),
                DrawCommand::Translate { x: 5.0, y: 5.0 },
                DrawCommand::Scale(2.0),
                DrawCommand::FillRect {
                    rect: Rect::new(0.0, 0.0, 2.0, 2.0),
                    color: RED,
                },
            ])
            .unwrap();
        let img = backend.into_image();
        assert_eq!(img.get_pixel(5, 5), &RED_PX);
        assert_eq!(img.get_pixel(8, 8), &RED_PX);
        assert_eq!(img.get_pixel(10, 10), &WHITE_PX);
        assert_eq!(img.get_pixel(3, 3), &WHITE_PX);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut backend = RasterBackend::new(10, 10).unwrap();
        backend
            .execute_commands(&[
                DrawCommand::Clear(Color::WHITE),
                DrawCommand::Save,
                DrawCommand::Clip(Rect::new(0.0, 0.0, 5.0, 10.0)),
                DrawCommand::FillRect {
                    rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                    color: RED,
                },
                DrawCommand::Restore,
                DrawCommand::FillRect {
                    rect: Rect::new(8.0, 8.0, 2.0, 2.0),
                    color: RED,
                },
            ])
            .unwrap();
        let img = backend.into_image();
        assert_eq!(img.get_pixel(3, 0), &RED_PX);
        assert_eq!(img.get_pixel(7, 0), &WHITE_PX);
        // Restore lifts the clip
        assert_eq!(img.get_pixel(9, 9), &RED_PX);
    }

    #[test]
    fn test_disjoint_clips_hide_everything() {
        let mut backend = RasterBackend::new(10, 10).unwrap();
        backend
            .execute_commands(&[
                DrawCommand::Clear(Color::WHITE),
                DrawCommand::Clip(Rect::new(0.0, 0.0, 4.0, 4.0)),
                DrawCommand::Clip(Rect::new(6.0, 6.0, 4.0, 4.0)),
                DrawCommand::FillRect {
                    rect: Rect::new(0.0, 0.0, 10.0, 10.0),
                    color: RED,
                },
            ])
            .unwrap();
        let img = backend.into_image();
        assert!(img.pixels().all(|p| *p == WHITE_PX));
    }

    #[test]
    fn test_draw_image_nearest_neighbour() {
        let source = quadrant_source();
        let mut backend = RasterBackend::new(4, 4).unwrap().with_source(&source);
        backend.draw_image(&Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        let img = backend.into_image();
        assert_eq!(img.get_pixel(0, 0), &RED_PX);
        assert_eq!(img.get_pixel(1, 1), &RED_PX);
        assert_eq!(img.get_pixel(3, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(img.get_pixel(0, 3), &Rgba([0, 0, 255, 255]));
        assert_eq!(img.get_pixel(3, 3), &WHITE_PX);
    }

    #[test]
    fn test_draw_image_offset_window() {
        // Image twice the canvas width, shifted left by one canvas: only the
        // right half shows.
        let source = quadrant_source();
        let mut backend = RasterBackend::new(2, 2).unwrap().with_source(&source);
        backend.draw_image(&Rect::new(-2.0, 0.0, 4.0, 4.0)).unwrap();
        let img = backend.into_image();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_draw_image_without_source_fails() {
        let mut backend = RasterBackend::new(2, 2).unwrap();
        assert!(backend.draw_image(&Rect::new(0.0, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_restore_without_save_fails() {
        let mut backend = RasterBackend::new(2, 2).unwrap();
        assert!(backend.restore().is_err());
    }

    #[test]
    fn test_invalid_scale_fails() {
        let mut backend = RasterBackend::new(2, 2).unwrap();
        assert!(backend.scale(0.0).is_err());
        assert!(backend.scale(f64::NAN).is_err());
    }

    #[test]
    fn test_alpha_blend_over_white() {
        let mut backend = RasterBackend::new(1, 1).unwrap();
        backend.clear(Color::WHITE).unwrap();
        backend
            .fill_rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Color::new(0.0, 0.0, 0.0, 0.5))
            .unwrap();
        let px = backend.into_image().get_pixel(0, 0).0;
        assert_eq!(px[3], 255);
        assert!(px[0] > 120 && px[0] < 135, "got {:?}", px);
    }

    #[test]
    fn test_stroke_draws_outline_only() {
        let mut backend = RasterBackend::new(10, 10).unwrap();
        backend.clear(Color::WHITE).unwrap();
        backend
            .stroke_rect(&Rect::new(2.0, 2.0, 6.0, 6.0), &StrokeStyle::solid(2.0, RED))
            .unwrap();
        let img = backend.into_image();
        // Two pixels wide, centered on the edge lines at 2.0 and 8.0
        assert_eq!(img.get_pixel(1, 5), &RED_PX);
        assert_eq!(img.get_pixel(5, 2), &RED_PX);
        assert_eq!(img.get_pixel(8, 5), &RED_PX);
        assert_eq!(img.get_pixel(5, 5), &WHITE_PX);
    }

    #[test]
    fn test_dashed_stroke_leaves_gaps() {
        let mut backend = RasterBackend::new(40, 10).unwrap();
        backend.clear(Color::WHITE).unwrap();
        backend
            .stroke_rect(
                &Rect::new(0.0, 4.0, 40.0, 2.0),
                &StrokeStyle::dashed(2.0, RED, 10.0, 10.0),
            )
            .unwrap();
        let img = backend.into_image();
        // Top edge runs along y = 4: dash on 0..10, off 10..20
        assert_eq!(img.get_pixel(5, 4), &RED_PX);
        assert_eq!(img.get_pixel(15, 4), &WHITE_PX);
        assert_eq!(img.get_pixel(25, 4), &RED_PX);
    }
}
