//! Axis-aligned geometry primitives shared by the layout pipeline and the
//! rendering backends.
//!
//! All engine geometry is expressed in millimeters with the origin at the
//! top-left and y growing downward. Backends apply a single uniform scale
//! to reach their own output units.

use serde::{Deserialize, Serialize};

/// Width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Uniformly scaled copy.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    /// Whether both sides of `self` are at least those of `other`.
    pub fn contains(&self, other: &Size) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

/// Rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True when the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlapping region of two rectangles, if any.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Shifted copy.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Copy with position and size multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Component-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// Uniform scale followed by translation: `p' = p * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: 1.0,
        dx: 0.0,
        dy: 0.0,
    };

    /// Compose a translation expressed in the current user space.
    pub fn translate(&self, x: f64, y: f64) -> Self {
        Self {
            scale: self.scale,
            dx: self.dx + x * self.scale,
            dy: self.dy + y * self.scale,
        }
    }

    /// Compose a uniform scale in the current user space.
    pub fn scale_by(&self, factor: f64) -> Self {
        Self {
            scale: self.scale * factor,
            ..*self
        }
    }

    /// Map a user-space rectangle to device space.
    pub fn apply(&self, rect: &Rect) -> Rect {
        rect.scaled(self.scale).translated(self.dx, self.dy)
    }

    /// Map a user-space length to device space.
    pub fn apply_len(&self, len: f64) -> f64 {
        len * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_aspect_and_scale() {
        let s = Size::new(400.0, 300.0);
        assert!((s.aspect() - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.scaled(0.5), Size::new(200.0, 150.0));
    }

    #[test]
    fn test_size_contains() {
        assert!(Size::new(10.0, 10.0).contains(&Size::new(10.0, 5.0)));
        assert!(!Size::new(10.0, 10.0).contains(&Size::new(10.1, 5.0)));
    }

    #[test]
    fn test_rect_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));

        let c = Rect::new(10.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersect(&c), None); // touching edges only
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(r.right(), 6.0);
        assert_eq!(r.bottom(), 8.0);
        assert!(!r.is_empty());
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_transform_composition() {
        let t = Transform::IDENTITY.translate(10.0, 20.0).scale_by(2.0);
        let r = t.apply(&Rect::new(1.0, 1.0, 3.0, 4.0));
        assert_eq!(r, Rect::new(12.0, 22.0, 6.0, 8.0));

        // Translation after scaling is expressed in scaled units
        let t2 = t.translate(5.0, 0.0);
        assert_eq!(t2.dx, 20.0);
        assert_eq!(t2.apply_len(1.5), 3.0);
    }
}
