//! Traits and types for rendering backends.

use crate::error::{PosterError, Result};
use crate::geometry::{Rect, Transform};
use serde::{Deserialize, Serialize};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };
    /// Margin guide grey.
    pub const GUIDE_GREY: Color = Color {
        r: 0.6,
        g: 0.6,
        b: 0.6,
        a: 1.0,
    };
    /// Image bounds green.
    pub const BOUNDS_GREEN: Color = Color {
        r: 0.0,
        g: 0.7,
        b: 0.2,
        a: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// 8-bit RGBA channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Parse from hex string (#RGB, #RRGGBB, or #RRGGBBAA)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }

        let (r, g, b, a) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                (r, g, b, 255)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                (r, g, b, 255)
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                (r, g, b, a)
            }
            _ => return None,
        };

        Some(Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Stroke style for outlines.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Line width in user-space units
    pub width: f64,
    pub color: Color,
    /// Alternating on/off lengths in user-space units
    pub dash: Option<Vec<f64>>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: Color::BLACK,
            dash: None,
        }
    }
}

impl StrokeStyle {
    pub fn solid(width: f64, color: Color) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    pub fn dashed(width: f64, color: Color, on: f64, off: f64) -> Self {
        Self {
            width,
            color,
            dash: Some(vec![on, off]),
        }
    }
}

/// A draw command for batched rendering.
///
/// Coordinates are in the backend's current user space; page
/// instructions emit them in millimeters.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface, ignoring transform and clip
    Clear(Color),

    /// Draw a filled rectangle
    FillRect { rect: Rect, color: Color },

    /// Draw a stroked rectangle
    StrokeRect { rect: Rect, style: StrokeStyle },

    /// Draw the backend's source image stretched into `rect`
    DrawImage(Rect),

    /// Save the current state (transform and clip)
    Save,

    /// Restore a previously saved state
    Restore,

    /// Apply a translation transform
    Translate { x: f64, y: f64 },

    /// Apply a uniform scale transform
    Scale(f64),

    /// Intersect the clipping region with a rectangle
    Clip(Rect),
}

/// Trait for rendering backends.
pub trait RenderBackend {
    /// Fill the whole surface with a color
    fn clear(&mut self, color: Color) -> Result<()>;

    /// Draw a filled rectangle
    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<()>;

    /// Draw a stroked rectangle
    fn stroke_rect(&mut self, rect: &Rect, style: &StrokeStyle) -> Result<()>;

    /// Draw the source image into a destination rectangle
    fn draw_image(&mut self, dest: &Rect) -> Result<()>;

    /// Save the current drawing state
    fn save(&mut self) -> Result<()>;

    /// Restore a previously saved state
    fn restore(&mut self) -> Result<()>;

    /// Apply a translation
    fn translate(&mut self, x: f64, y: f64) -> Result<()>;

    /// Apply a uniform scale
    fn scale(&mut self, factor: f64) -> Result<()>;

    /// Set clipping rectangle
    fn clip(&mut self, rect: &Rect) -> Result<()>;

    /// Execute a batch of draw commands
    fn execute_commands(&mut self, commands: &[DrawCommand]) -> Result<()> {
        for cmd in commands {
            match cmd {
                DrawCommand::Clear(color) => self.clear(*color)?,
                DrawCommand::FillRect { rect, color } => self.fill_rect(rect, *color)?,
                DrawCommand::StrokeRect { rect, style } => self.stroke_rect(rect, style)?,
                DrawCommand::DrawImage(dest) => self.draw_image(dest)?,
                DrawCommand::Save => self.save()?,
                DrawCommand::Restore => self.restore()?,
                DrawCommand::Translate { x, y } => self.translate(*x, *y)?,
                DrawCommand::Scale(factor) => self.scale(*factor)?,
                DrawCommand::Clip(rect) => self.clip(rect)?,
            }
        }
        Ok(())
    }
}

/// One drawing operation with transforms resolved to absolute coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedOp {
    Clear(Color),
    Fill { rect: Rect, color: Color },
    Stroke { rect: Rect, width: f64 },
    Image { dest: Rect, clip: Option<Rect> },
}

/// Backend that records what would be painted instead of painting it.
///
/// Transforms are folded into the recorded rectangles, so two command
/// streams at different scales can be compared after dividing out the scale.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    transform: Transform,
    clip: Option<Rect>,
    stack: Vec<(Transform, Option<Rect>)>,
    ops: Vec<RecordedOp>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<RecordedOp> {
        self.ops
    }

    /// Destination and clip of every image draw, in recording order.
    pub fn image_draws(&self) -> Vec<(Rect, Option<Rect>)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Image { dest, clip } => Some((*dest, *clip)),
                _ => None,
            })
            .collect()
    }

    /// Every filled rectangle with the given color.
    pub fn fills_of(&self, color: Color) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Fill { rect, color: c } if *c == color => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for CommandRecorder {
    fn clear(&mut self, color: Color) -> Result<()> {
        self.ops.push(RecordedOp::Clear(color));
        Ok(())
    }

    fn fill_rect(&mut self, rect: &Rect, color: Color) -> Result<()> {
        self.ops.push(RecordedOp::Fill {
            rect: self.transform.apply(rect),
            color,
        });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: &Rect, style: &StrokeStyle) -> Result<()> {
        self.ops.push(RecordedOp::Stroke {
            rect: self.transform.apply(rect),
            width: self.transform.apply_len(style.width),
        });
        Ok(())
    }

    fn draw_image(&mut self, dest: &Rect) -> Result<()> {
        self.ops.push(RecordedOp::Image {
            dest: self.transform.apply(dest),
            clip: self.clip,
        });
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.stack.push((self.transform, self.clip));
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        let (transform, clip) = self.stack.pop().ok_or_else(|| {
            PosterError::Render("restore without matching save".to_string())
        })?;
        self.transform = transform;
        self.clip = clip;
        Ok(())
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.transform = self.transform.translate(x, y);
        Ok(())
    }

    fn scale(&mut self, factor: f64) -> Result<()> {
        self.transform = self.transform.scale_by(factor);
        Ok(())
    }

    fn clip(&mut self, rect: &Rect) -> Result<()> {
        let device = self.transform.apply(rect);
        self.clip = Some(match self.clip {
            // Disjoint clips leave an empty region at the clip origin
            Some(current) => current
                .intersect(&device)
                .unwrap_or(Rect::new(device.x, device.y, 0.0, 0.0)),
            None => device,
        });
        Ok(())
    }
}
