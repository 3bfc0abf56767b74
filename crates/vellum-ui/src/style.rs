//! Drawing style: optional fill, stroke and font components plus a corner
//! radius.
//!
//! Styles are immutable once shared. Painters hold an `Rc<Style>` and never
//! mutate it; a widget changes its look by installing a different style.

use std::rc::Rc;

use vellum_engine::paint::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

/// Font request: a CSS-like family stack and a size in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: String,
    pub size: f32,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self { family: family.into(), size }
    }
}

/// A set of drawing attributes. Any component may be absent; draws that need
/// a missing component render as fully transparent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub font: Option<Font>,
    /// Corner radius applied by `fill_rect` and `stroke_rect`; 0 is square.
    pub radius: f32,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(Fill { color });
        self
    }

    pub fn stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(Stroke { color, width });
        self
    }

    pub fn font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font = Some(Font::new(family, size));
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        self
    }

    pub fn shared(self) -> Rc<Style> {
        Rc::new(self)
    }

    /// Fill color, transparent when no fill is set.
    pub fn fill_color(&self) -> Color {
        self.fill.map_or(Color::transparent(), |f| f.color)
    }
}
