use std::rc::Rc;

use vellum_engine::coords::{Circle, Point, Rect, Size};
use vellum_engine::paint::Color;

use crate::painter::{PaintEnv, PaintState, Painter};
use crate::resource::ResourceId;
use crate::style::Style;

use super::RecordingSurface;
use super::list::{DrawCmd, PaintOp};

/// Painter that records calls instead of producing pixels.
///
/// Draws are resolved against the paint state exactly as a pixel backend
/// would resolve them, so display lists compare across frames and tests.
pub struct RecordingPainter {
    surface: RecordingSurface,
    env: PaintEnv,
    state: PaintState,
}

impl RecordingPainter {
    /// Painter over a fresh surface of its own.
    pub fn new(size: Size, scale: f32, env: PaintEnv) -> Self {
        Self::bind(&RecordingSurface::new(size, scale), env)
    }

    pub fn bind(surface: &RecordingSurface, env: PaintEnv) -> Self {
        Self { surface: surface.clone(), env, state: PaintState::new() }
    }

    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    fn draw(&mut self, cmd: DrawCmd) {
        let clip = self.state.clip();
        self.surface.recording_mut().draw(cmd, clip);
    }

    fn style(&self) -> Option<&Rc<Style>> {
        self.state.style()
    }
}

impl Painter for RecordingPainter {
    fn backend(&self) -> &'static str {
        "recording"
    }

    fn state(&self) -> &PaintState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PaintState {
        &mut self.state
    }

    fn env(&self) -> &PaintEnv {
        &self.env
    }

    fn size(&self) -> Size {
        self.surface.size()
    }

    fn scale_factor(&self) -> f32 {
        self.surface.scale()
    }

    // ── state, logged ─────────────────────────────────────────────────────

    fn save(&mut self) {
        self.state.save();
        self.surface.recording_mut().op(PaintOp::Save);
    }

    fn restore(&mut self) {
        self.state.restore();
        self.surface.recording_mut().op(PaintOp::Restore);
    }

    fn set_style(&mut self, style: Option<Rc<Style>>) {
        self.surface.recording_mut().op(PaintOp::SetStyle(style.clone()));
        self.state.set_style(style);
    }

    fn translate(&mut self, offset: Point) {
        self.state.translate(offset);
        self.surface.recording_mut().op(PaintOp::Translate(offset));
    }

    fn clip(&mut self, rect: Rect) {
        self.state.clip_to(rect);
        self.surface.recording_mut().op(PaintOp::Clip(rect));
    }

    // ── primitives ────────────────────────────────────────────────────────

    fn clear_all(&mut self, color: Color) {
        self.draw(DrawCmd::Clear { color });
    }

    fn fill_rect(&mut self, rect: Rect) {
        let Some(fill) = self.style().and_then(|s| s.fill) else { return };
        let radius = self.style().map_or(0.0, |s| s.radius);
        let rect = self.state.rect_to_surface(rect.normalized());
        self.draw(DrawCmd::FillRect { rect, color: fill.color, radius });
    }

    fn stroke_rect(&mut self, rect: Rect) {
        let Some(stroke) = self.style().and_then(|s| s.stroke) else { return };
        let radius = self.style().map_or(0.0, |s| s.radius);
        let rect = self.state.rect_to_surface(rect.normalized());
        self.draw(DrawCmd::StrokeRect { rect, color: stroke.color, width: stroke.width, radius });
    }

    fn fill_circle(&mut self, circle: Circle) {
        let Some(fill) = self.style().and_then(|s| s.fill) else { return };
        let circle = circle.translate(self.state.translation());
        self.draw(DrawCmd::FillCircle { circle, color: fill.color });
    }

    fn stroke_circle(&mut self, circle: Circle) {
        let Some(stroke) = self.style().and_then(|s| s.stroke) else { return };
        let circle = circle.translate(self.state.translation());
        self.draw(DrawCmd::StrokeCircle { circle, color: stroke.color, width: stroke.width });
    }

    fn fill_text(&mut self, text: &str, pos: Point, max_width: Option<f32>) {
        if text.is_empty() {
            return;
        }
        let Some(style) = self.style().cloned() else { return };
        let (Some(fill), Some(font)) = (style.fill, style.font.clone()) else { return };
        if self.env.resolve_font(Some(&*style)).is_none() {
            return;
        }
        let origin = self.state.to_surface(pos);
        self.draw(DrawCmd::Text { text: text.to_string(), origin, font, color: fill.color, max_width });
    }

    fn stroke_text(&mut self, text: &str, pos: Point, max_width: Option<f32>) {
        if text.is_empty() {
            return;
        }
        let Some(style) = self.style().cloned() else { return };
        let (Some(stroke), Some(font)) = (style.stroke, style.font.clone()) else { return };
        if self.env.resolve_font(Some(&*style)).is_none() {
            return;
        }
        let origin = self.state.to_surface(pos);
        self.draw(DrawCmd::StrokeText {
            text: text.to_string(),
            origin,
            font,
            color: stroke.color,
            width: stroke.width,
            max_width,
        });
    }

    fn draw_caret(&mut self, pos: Point, height: f32) {
        let Some(fill) = self.style().and_then(|s| s.fill) else { return };
        let origin = self.state.to_surface(pos);
        self.draw(DrawCmd::Caret { origin, height, color: fill.color });
    }

    fn draw_image(&mut self, id: &ResourceId, rect: Rect) {
        if self.env.images.get(id).is_none() {
            log::trace!("recording: image {id} not ready, skipped");
            return;
        }
        let rect = self.state.rect_to_surface(rect.normalized());
        self.draw(DrawCmd::Image { id: id.clone(), rect });
    }

    fn flush(&mut self) {
        self.surface.recording_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::backend::recording::DisplayList;
    use crate::paragraph::ParagraphStyle;
    use crate::resource::ResourceCache;
    use crate::style::Font;

    fn painter() -> RecordingPainter {
        let env = PaintEnv::new(crate::testing::fonts(), ResourceCache::default());
        RecordingPainter::new(Size::new(200.0, 100.0), 1.0, env)
    }

    fn last_frame(p: &RecordingPainter) -> DisplayList {
        p.surface().recording().frames().last().cloned().unwrap_or_default()
    }

    #[test]
    fn fill_after_nested_restore_uses_outer_style() {
        let a = Style::new().fill(Color::WHITE).shared();
        let b = Style::new().fill(Color::BLACK).shared();
        let mut p = painter();

        p.save();
        p.set_style(Some(a));
        p.translate(Point::new(10.0, 10.0));
        p.save();
        p.set_style(Some(b));
        p.restore();
        p.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        p.restore();
        p.flush();

        let frame = last_frame(&p);
        assert_eq!(
            frame.items()[0].cmd,
            DrawCmd::FillRect { rect: Rect::new(10.0, 10.0, 5.0, 5.0), color: Color::WHITE, radius: 0.0 }
        );
    }

    #[test]
    fn each_flush_commits_one_list() {
        let mut p = painter();
        p.set_style(Some(Style::new().fill(Color::WHITE).shared()));
        p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        p.flush();
        p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        p.flush();

        let rec = p.surface().recording();
        assert_eq!(rec.frames().iter().map(DisplayList::len).collect::<Vec<_>>(), vec![1, 2]);
        assert!(rec.pending().is_empty());
    }

    #[test]
    fn draws_carry_the_clip() {
        let mut p = painter();
        p.set_style(Some(Style::new().fill(Color::WHITE).shared()));
        p.translate(Point::new(5.0, 5.0));
        p.clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.fill_circle(Circle::new(Point::new(1.0, 1.0), 2.0));
        p.flush();

        let frame = last_frame(&p);
        let item = &frame.items()[0];
        assert_eq!(item.clip, Some(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert_eq!(
            item.cmd,
            DrawCmd::FillCircle { circle: Circle::new(Point::new(6.0, 6.0), 2.0), color: Color::WHITE }
        );
    }

    #[test]
    fn rect_draws_carry_the_style_radius() {
        let mut p = painter();
        p.set_style(Some(Style::new().fill(Color::WHITE).stroke(Color::BLACK, 2.0).radius(4.0).shared()));
        p.fill_rect(Rect::new(0.0, 0.0, 20.0, 10.0));
        p.stroke_rect(Rect::new(0.0, 0.0, 20.0, 10.0));
        p.flush();

        let frame = last_frame(&p);
        assert_eq!(
            frame.items()[0].cmd,
            DrawCmd::FillRect { rect: Rect::new(0.0, 0.0, 20.0, 10.0), color: Color::WHITE, radius: 4.0 }
        );
        assert!(matches!(frame.items()[1].cmd, DrawCmd::StrokeRect { radius, width, .. } if radius == 4.0 && width == 2.0));
    }

    #[test]
    fn stroke_text_and_caret_use_their_components() {
        let mut p = painter();
        p.set_style(Some(Style::new().font("DejaVu Sans Mono", 12.0).shared()));
        p.stroke_text("outline", Point::zero(), None);
        p.draw_caret(Point::zero(), 12.0);
        assert!(!p.surface().recording().ops().iter().any(PaintOp::is_draw));

        p.set_style(Some(
            Style::new().fill(Color::WHITE).stroke(Color::BLACK, 1.5).font("DejaVu Sans Mono", 12.0).shared(),
        ));
        p.translate(Point::new(3.0, 4.0));
        p.stroke_text("outline", Point::new(1.0, 10.0), Some(50.0));
        p.draw_caret(Point::new(20.0, 0.0), 12.0);
        p.flush();

        let frame = last_frame(&p);
        assert_eq!(
            frame.items()[0].cmd,
            DrawCmd::StrokeText {
                text: "outline".into(),
                origin: Point::new(4.0, 14.0),
                font: Font::new("DejaVu Sans Mono", 12.0),
                color: Color::BLACK,
                width: 1.5,
                max_width: Some(50.0),
            }
        );
        assert_eq!(
            frame.items()[1].cmd,
            DrawCmd::Caret { origin: Point::new(23.0, 4.0), height: 12.0, color: Color::WHITE }
        );
    }

    #[test]
    fn missing_components_record_no_draw() {
        let mut p = painter();
        p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        p.set_style(Some(Style::new().fill(Color::WHITE).shared()));
        p.stroke_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        p.fill_text("no font", Point::zero(), None);
        assert!(!p.surface().recording().ops().iter().any(PaintOp::is_draw));
    }

    #[test]
    fn empty_text_leaves_no_trace() {
        let mut p = painter();
        p.set_style(Some(Style::new().fill(Color::WHITE).font("monospace", 12.0).shared()));
        let ops_before = p.surface().recording().ops().len();
        p.fill_text("", Point::new(3.0, 3.0), Some(10.0));
        assert_eq!(p.surface().recording().ops().len(), ops_before);
        assert_eq!(p.depth(), 0);
    }

    #[test]
    fn paragraph_draws_one_text_per_line() {
        let mut p = painter();
        let engine = p.paragraph_engine();
        let mut para = engine.build(
            ParagraphStyle::new(Font::new("DejaVu Sans Mono", 12.0), Color::BLACK),
            "first\nsecond",
        );
        assert!(p.draw_paragraph(&para, Point::zero()).is_err());

        para.layout(500.0);
        p.draw_paragraph(&para, Point::new(4.0, 0.0)).unwrap();
        p.flush();
        assert_eq!(p.depth(), 0);

        let frame = last_frame(&p);
        let texts: Vec<_> = frame
            .items()
            .iter()
            .filter_map(|i| match &i.cmd {
                DrawCmd::Text { text, origin, .. } => Some((text.clone(), origin.x)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![("first".to_string(), 4.0), ("second".to_string(), 4.0)]);
    }
}
