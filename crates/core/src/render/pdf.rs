//! PDF content-stream backend.
//!
//! Each page starts with a matrix that maps millimeters with a top-left
//! origin onto PDF points, so page instructions are written unchanged.
//! Operators are collected as `lopdf` operations and encoded once.

use super::traits::{Color, RenderBackend, StrokeStyle};
use crate::error::{PosterError, Result};
use crate::geometry::{Rect, Size};
use crate::units::{mm_to_pt, POINTS_PER_MM};
use lopdf::content::{Content, Operation};
use lopdf::Object;

/// Page size in PDF points, for the page's `MediaBox`.
pub fn media_box(page_size: Size) -> (f64, f64) {
    (mm_to_pt(page_size.width), mm_to_pt(page_size.height))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rect_operands(rect: &Rect) -> Vec<Object> {
    vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)]
}

fn rgb_operands(color: Color) -> Vec<Object> {
    vec![
        Object::Real(color.r.clamp(0.0, 1.0)),
        Object::Real(color.g.clamp(0.0, 1.0)),
        Object::Real(color.b.clamp(0.0, 1.0)),
    ]
}

/// Builds the content stream of one PDF page.
pub struct PdfPageBackend {
    page_size: Size,
    image_name: String,
    operations: Vec<Operation>,
    depth: usize,
}

impl PdfPageBackend {
    /// Start a page of `page_size` millimeters. `image_name` is the XObject
    /// resource name used by `DrawImage`.
    pub fn new(page_size: Size, image_name: impl Into<String>) -> Self {
        let (_, height_pt) = media_box(page_size);
        let page_matrix = Operation::new(
            "cm",
            vec![
                real(POINTS_PER_MM),
                real(0.0),
                real(0.0),
                real(-POINTS_PER_MM),
                real(0.0),
                real(height_pt),
            ],
        );
        Self {
            page_size,
            image_name: image_name.into(),
            operations: vec![page_matrix],
            depth: 0,
        }
    }

    /// Operations written so far.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Finished content stream bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.depth != 0 {
            return Err(PosterError::Render(format!(
                "{} unbalanced save(s) in page content",
                self.depth
            )));
        }
        Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|e| PosterError::PdfWrite(e.to_string()))
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }
}

impl RenderBackend for PdfPageBackend {
    fn clear(&mut self, color: Color) -> Result<()> {
        let page = Rect::from_size(self.page_size);
        self.op("q", vec![]);
        self.op("rg", rgb_operands(color));
        self.op("re", rect_operands(&page));
        self.op("f", vec![]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<()> {
        if color.a <= 0.0 {
            return Ok(());
        }
        self.op("rg", rgb_operands(color));
        self.op("re", rect_operands(rect));
        self.op("f", vec![]);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: &Rect, style: &StrokeStyle) -> Result<()> {
        let pattern = style
            .dash
            .as_ref()
            .map(|p| p.iter().map(|v| real(*v)).collect())
            .unwrap_or_default();
        self.op("q", vec![]);
        self.op("w", vec![real(style.width)]);
        self.op("d", vec![Object::Array(pattern), Object::Integer(0)]);
        self.op("RG", rgb_operands(style.color));
        self.op("re", rect_operands(rect));
        self.op("S", vec![]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn draw_image(&mut self, dest: &Rect) -> Result<()> {
        // Unit square to dest, flipped so the image's first row is on top
        let name = Object::Name(self.image_name.as_bytes().to_vec());
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![
                real(dest.width),
                real(0.0),
                real(0.0),
                real(-dest.height),
                real(dest.x),
                real(dest.y + dest.height),
            ],
        );
        self.op("Do", vec![name]);
        self.op("Q", vec![]);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.depth += 1;
        self.op("q", vec![]);
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(PosterError::Render(
                "restore without matching save".to_string(),
            ));
        }
        self.depth -= 1;
        self.op("Q", vec![]);
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.op(
            "cm",
            vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)],
        );
        Ok(())
    }

    fn scale(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(PosterError::Render(format!("invalid scale factor {}", factor)));
        }
        self.op(
            "cm",
            vec![real(factor), real(0.0), real(0.0), real(factor), real(0.0), real(0.0)],
        );
        Ok(())
    }

    fn clip(&mut self, rect: &Rect) -> Result<()> {
        self.op("re", rect_operands(rect));
        self.op("W", vec![]);
        self.op("n", vec![]);
        Ok(())
    }
}
