use std::rc::Rc;

use vellum_engine::coords::{Point, Rect};

use crate::style::Style;

/// One level of the paint-state stack.
#[derive(Debug, Clone, Default)]
pub struct StateFrame {
    pub style: Option<Rc<Style>>,
    /// Accumulated translation, logical pixels.
    pub translation: Point,
    /// Clip in surface coordinates (already translated). `None` = unclipped.
    pub clip: Option<Rect>,
}

/// Framework-level paint context: current style, translation and clip, plus
/// the frames saved above it.
///
/// Every backend owns exactly one of these and routes `save`/`restore`
/// through it, so style and clip/transform always unwind together.
#[derive(Debug, Clone, Default)]
pub struct PaintState {
    current: StateFrame,
    saved: Vec<StateFrame>,
}

impl PaintState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &StateFrame {
        &self.current
    }

    /// Number of outstanding `save` calls.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pops the frame pushed by the matching [`save`](Self::save).
    ///
    /// # Panics
    ///
    /// Panics when there is no matching `save`. An unbalanced stack means the
    /// drawing code is broken; continuing would paint with the wrong context.
    pub fn restore(&mut self) {
        match self.saved.pop() {
            Some(frame) => self.current = frame,
            None => panic!("PaintState::restore called without a matching save"),
        }
    }

    pub fn set_style(&mut self, style: Option<Rc<Style>>) {
        self.current.style = style;
    }

    pub fn style(&self) -> Option<&Rc<Style>> {
        self.current.style.as_ref()
    }

    pub fn translation(&self) -> Point {
        self.current.translation
    }

    pub fn translate(&mut self, offset: Point) {
        self.current.translation += offset;
    }

    /// Intersects the clip with `rect`, given in the current coordinate space.
    ///
    /// Disjoint clips collapse to an empty rect so every later draw is
    /// rejected, rather than being treated as "unclipped".
    pub fn clip_to(&mut self, rect: Rect) {
        let rect = rect.normalized().translate(self.current.translation);
        let next = match self.current.clip {
            Some(clip) => clip
                .intersect(rect)
                .unwrap_or_else(|| Rect::from_origin_size(rect.origin, Default::default())),
            None => rect,
        };
        self.current.clip = Some(next);
    }

    pub fn clip(&self) -> Option<Rect> {
        self.current.clip
    }

    /// Maps a point from the current coordinate space to surface space.
    #[inline]
    pub fn to_surface(&self, p: Point) -> Point {
        p + self.current.translation
    }

    #[inline]
    pub fn rect_to_surface(&self, r: Rect) -> Rect {
        r.translate(self.current.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(width: f32) -> Rc<Style> {
        Style::new().stroke(vellum_engine::paint::Color::BLACK, width).shared()
    }

    #[test]
    fn nested_save_restore_isolates_everything() {
        let mut st = PaintState::new();
        let a = style(1.0);
        st.set_style(Some(a.clone()));
        st.translate(Point::new(3.0, 4.0));
        st.clip_to(Rect::new(0.0, 0.0, 50.0, 50.0));
        let before = (st.translation(), st.clip());

        st.save();
        st.set_style(Some(style(2.0)));
        st.translate(Point::new(10.0, 10.0));
        st.save();
        st.clip_to(Rect::new(5.0, 5.0, 5.0, 5.0));
        st.restore();
        st.restore();

        assert!(Rc::ptr_eq(st.style().unwrap(), &a));
        assert_eq!((st.translation(), st.clip()), before);
        assert_eq!(st.depth(), 0);
    }

    #[test]
    fn translation_accumulates() {
        let mut st = PaintState::new();
        st.translate(Point::new(10.0, 10.0));
        st.save();
        st.translate(Point::new(5.0, -2.0));
        assert_eq!(st.translation(), Point::new(15.0, 8.0));
        assert_eq!(st.to_surface(Point::new(1.0, 1.0)), Point::new(16.0, 9.0));
    }

    #[test]
    fn clip_is_translated_and_intersected() {
        let mut st = PaintState::new();
        st.translate(Point::new(10.0, 10.0));
        st.clip_to(Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(st.clip(), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));

        st.clip_to(Rect::new(15.0, 15.0, 20.0, 20.0));
        assert_eq!(st.clip(), Some(Rect::new(25.0, 25.0, 5.0, 5.0)));
    }

    #[test]
    fn disjoint_clip_is_empty() {
        let mut st = PaintState::new();
        st.clip_to(Rect::new(0.0, 0.0, 10.0, 10.0));
        st.clip_to(Rect::new(20.0, 20.0, 10.0, 10.0));
        assert!(st.clip().is_some_and(|c| c.is_empty()));
    }

    #[test]
    #[should_panic(expected = "without a matching save")]
    fn restore_underflow_panics() {
        PaintState::new().restore();
    }
}
