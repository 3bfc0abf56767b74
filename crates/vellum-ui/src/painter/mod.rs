//! Backend-agnostic drawing contract.
//!
//! A [`Painter`] draws shapes, text and images against its [`PaintState`].
//! Every backend implements the primitives; state handling, measurement and
//! paragraph drawing are shared default methods so they behave identically
//! everywhere.

mod state;

pub use state::{PaintState, StateFrame};

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use vellum_engine::coords::{Circle, Point, Rect, Size};
use vellum_engine::paint::Color;
use vellum_engine::text::{FontId, FontMetrics, FontSystem};

use crate::paragraph::{Paragraph, ParagraphEngine, ParagraphError};
use crate::resource::{ResourceCache, ResourceId};
use crate::style::Style;

// ── PaintEnv ──────────────────────────────────────────────────────────────

/// Shared services a painter consults: the font system and the image cache.
///
/// Cloning is cheap; every painter a frame binds gets a clone of the same env.
#[derive(Clone)]
pub struct PaintEnv {
    pub fonts: Rc<FontSystem>,
    pub images: ResourceCache,
}

impl PaintEnv {
    pub fn new(fonts: Rc<FontSystem>, images: ResourceCache) -> Self {
        Self { fonts, images }
    }

    /// Face and size for the style's font component.
    ///
    /// `None` when the style has no font, the size is not positive, or no
    /// font is loaded at all.
    pub fn resolve_font(&self, style: Option<&Style>) -> Option<(FontId, f32)> {
        let font = style?.font.as_ref()?;
        if !(font.size > 0.0) {
            return None;
        }
        self.fonts.resolve(&font.family).map(|id| (id, font.size))
    }

    /// Width of `text` under `style`, shaped at the backend's `scale`.
    pub fn measure_text(&self, style: Option<&Style>, text: &str, scale: f32) -> f32 {
        match self.resolve_font(style) {
            Some((id, size)) => self.fonts.measure_text_scaled(text, id, size, scale),
            None => 0.0,
        }
    }

    pub fn font_metrics(&self, style: Option<&Style>, scale: f32) -> FontMetrics {
        match self.resolve_font(style) {
            Some((id, size)) => self.fonts.metrics_scaled(id, size, scale),
            None => FontMetrics::default(),
        }
    }
}

// ── Painter ───────────────────────────────────────────────────────────────

/// Width of the bar drawn by [`Painter::draw_caret`], logical pixels.
pub const CARET_WIDTH: f32 = 2.0;

/// Drawing surface handed to widgets.
///
/// Coordinates are logical pixels in the current (translated) space. Draw
/// calls whose style component is missing render nothing. Calls are only
/// valid on the thread that owns the frame.
pub trait Painter {
    /// Short backend name, for logs.
    fn backend(&self) -> &'static str;

    fn state(&self) -> &PaintState;
    fn state_mut(&mut self) -> &mut PaintState;

    fn env(&self) -> &PaintEnv;

    /// Logical size of the bound surface.
    fn size(&self) -> Size;

    /// Physical pixels per logical pixel.
    fn scale_factor(&self) -> f32;

    // ── state ─────────────────────────────────────────────────────────────

    fn save(&mut self) {
        self.state_mut().save();
    }

    /// # Panics
    ///
    /// Panics without a matching [`save`](Self::save).
    fn restore(&mut self) {
        self.state_mut().restore();
    }

    fn depth(&self) -> usize {
        self.state().depth()
    }

    /// Replaces the current style for subsequent draw calls.
    fn set_style(&mut self, style: Option<Rc<Style>>) {
        self.state_mut().set_style(style);
    }

    fn current_style(&self) -> Option<Rc<Style>> {
        self.state().style().cloned()
    }

    fn translate(&mut self, offset: Point) {
        self.state_mut().translate(offset);
    }

    fn translation(&self) -> Point {
        self.state().translation()
    }

    /// Intersects the clip with `rect` (current coordinates).
    fn clip(&mut self, rect: Rect) {
        self.state_mut().clip_to(rect);
    }

    /// Current clip in surface coordinates, `None` when unclipped.
    fn clip_bounds(&self) -> Option<Rect> {
        self.state().clip()
    }

    // ── primitives ────────────────────────────────────────────────────────

    /// Replaces every pixel inside the clip with `color`.
    fn clear_all(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect);

    /// Strokes inside `rect`, so the outer edge never crosses its bounds.
    fn stroke_rect(&mut self, rect: Rect);

    fn fill_circle(&mut self, circle: Circle);

    fn stroke_circle(&mut self, circle: Circle);

    /// Draws one line of text with its baseline starting at `pos`, in the
    /// style's fill color. Glyphs that would end past `max_width` are
    /// dropped. An empty string draws nothing.
    fn fill_text(&mut self, text: &str, pos: Point, max_width: Option<f32>);

    /// Like [`fill_text`](Self::fill_text), but outlines the glyphs with the
    /// style's stroke.
    fn stroke_text(&mut self, text: &str, pos: Point, max_width: Option<f32>);

    /// Text-input caret: a bar [`CARET_WIDTH`] wide and `height` tall with its
    /// top-left corner at `pos`, in the fill color.
    fn draw_caret(&mut self, pos: Point, height: f32) {
        self.fill_rect(Rect::new(pos.x, pos.y, CARET_WIDTH, height));
    }

    /// Draws a cached image scaled into `rect`. Images that are not ready
    /// draw nothing.
    fn draw_image(&mut self, id: &ResourceId, rect: Rect);

    /// Commits everything drawn since the previous flush.
    fn flush(&mut self);

    // ── measurement ───────────────────────────────────────────────────────

    /// Width of `text` under the current style. Uses the same font
    /// resolution and scale as [`fill_text`](Self::fill_text).
    fn measure_text(&self, text: &str) -> f32 {
        let style = self.state().style().cloned();
        self.env().measure_text(style.as_deref(), text, self.scale_factor())
    }

    /// Metrics of the current font; all zero without a font.
    fn font_metrics(&self) -> FontMetrics {
        let style = self.state().style().cloned();
        self.env().font_metrics(style.as_deref(), self.scale_factor())
    }

    /// Pixel size of a cached image, `None` unless it is ready.
    fn measure_image(&self, id: &ResourceId) -> Option<Size> {
        self.env().images.get(id).map(|bitmap| bitmap.size())
    }

    // ── paragraphs ────────────────────────────────────────────────────────

    /// Engine whose measurements match this painter's text rendering.
    fn paragraph_engine(&self) -> ParagraphEngine {
        ParagraphEngine::with_scale(self.env().fonts.clone(), self.scale_factor())
    }

    /// Draws a laid-out paragraph with its top-left corner at `pos`.
    fn draw_paragraph(&mut self, paragraph: &Paragraph, pos: Point) -> Result<(), ParagraphError> {
        let lines = paragraph.lines()?;
        self.save();
        self.set_style(Some(paragraph.text_style()));
        for line in lines {
            self.fill_text(&line.text, Point::new(pos.x + line.x, pos.y + line.baseline), None);
        }
        self.restore();
        Ok(())
    }
}

// ── SaveGuard ─────────────────────────────────────────────────────────────

/// Scoped `save`/`restore`.
///
/// Saves on creation. On drop, restores until the painter is back at the
/// depth it had before the guard, which also covers early returns, `?` and
/// unwinding panics.
pub struct SaveGuard<'p> {
    painter: &'p mut dyn Painter,
    base: usize,
}

impl<'p> SaveGuard<'p> {
    pub fn new(painter: &'p mut dyn Painter) -> Self {
        let base = painter.depth();
        painter.save();
        Self { painter, base }
    }

    /// Depth before the guard's own `save`.
    pub fn base_depth(&self) -> usize {
        self.base
    }
}

impl<'p> Deref for SaveGuard<'p> {
    type Target = dyn Painter + 'p;

    fn deref(&self) -> &Self::Target {
        &*self.painter
    }
}

impl<'p> DerefMut for SaveGuard<'p> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.painter
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        while self.painter.depth() > self.base {
            self.painter.restore();
        }
    }
}
