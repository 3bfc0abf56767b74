use core::ops::Mul;

/// Width/height pair in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { width: 0.0, height: 0.0 }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Physical pixel extent for `scale`, rounded up and at least 1x1.
    #[inline]
    pub fn to_physical(self, scale: f32) -> (u32, u32) {
        let w = (self.width * scale).ceil().max(1.0) as u32;
        let h = (self.height * scale).ceil().max(1.0) as u32;
        (w, h)
    }
}

impl Mul<f32> for Size {
    type Output = Size;
    #[inline]
    fn mul(self, rhs: f32) -> Size {
        Size::new(self.width * rhs, self.height * rhs)
    }
}
