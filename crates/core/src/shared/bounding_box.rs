use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame-pixel coordinates.
///
/// `(x1, y1)` is inclusive, `(x2, y2)` is exclusive, so `x2 - x1` is the
/// width in pixels. A box with zero or negative extent is empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 as f64 + self.x2 as f64) / 2.0,
            (self.y1 as f64 + self.y2 as f64) / 2.0,
        )
    }

    /// Intersects the box with `[0, width) x [0, height)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        Self {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }

    /// Grows (or shrinks) the box by `scale` around its own center.
    ///
    /// Edges are rounded outward so a scale of 1.0 reproduces the box exactly.
    pub fn scaled_about_center(&self, scale: f64) -> Self {
        let (cx, cy) = self.center();
        let half_w = self.width().max(0) as f64 * scale / 2.0;
        let half_h = self.height().max(0) as f64 * scale / 2.0;
        Self {
            x1: (cx - half_w).floor() as i32,
            y1: (cy - half_h).floor() as i32,
            x2: (cx + half_w).ceil() as i32,
            y2: (cy + half_h).ceil() as i32,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }
}
