use super::{Point, Rect};

/// Circle in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f32,
}

impl Circle {
    #[inline]
    pub const fn new(center: Point, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Axis-aligned bounding box.
    #[inline]
    pub fn bounds(self) -> Rect {
        let r = self.radius.abs();
        Rect::new(self.center.x - r, self.center.y - r, r * 2.0, r * 2.0)
    }

    #[inline]
    pub fn translate(self, offset: Point) -> Self {
        Self { center: self.center + offset, radius: self.radius }
    }
}
