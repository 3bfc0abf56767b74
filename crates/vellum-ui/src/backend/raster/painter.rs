use std::collections::HashMap;
use std::rc::Rc;

use tiny_skia::{
    FillRule, FilterQuality, IntSize, LineJoin, Mask, PathBuilder, Pixmap, PixmapPaint,
    Transform,
};

use vellum_engine::coords::{Circle, Point, Rect, Size};
use vellum_engine::paint::Color;
use vellum_engine::text::FontId;

use crate::painter::{CARET_WIDTH, PaintEnv, PaintState, Painter};
use crate::resource::ResourceId;

use super::RasterSurface;
use super::skia;

/// A glyph tinted with one color, placed relative to the pen on the baseline.
struct Glyph {
    xmin: i32,
    ymin: i32,
    height: i32,
    /// `None` for glyphs without ink (spaces).
    pixmap: Option<Pixmap>,
}

type GlyphKey = (FontId, u16, u32, [u8; 4]);

/// The clip mask built for the current clip rect.
struct ClipMask {
    clip: Rect,
    mask: Mask,
}

/// Software painter drawing into a [`RasterSurface`].
///
/// Takes logical coordinates; the surface scale and the current translation
/// become the tiny-skia transform, and the clip becomes a [`Mask`].
pub struct RasterPainter {
    surface: RasterSurface,
    env: PaintEnv,
    state: PaintState,
    clip: Option<ClipMask>,
    glyphs: HashMap<GlyphKey, Option<Rc<Glyph>>>,
}

impl RasterPainter {
    pub fn new(surface: &RasterSurface, env: PaintEnv) -> Self {
        Self {
            surface: surface.clone(),
            env,
            state: PaintState::new(),
            clip: None,
            glyphs: HashMap::new(),
        }
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    fn scale(&self) -> f32 {
        self.surface.scale()
    }

    /// Logical current space to physical pixels.
    fn transform(&self) -> Transform {
        let s = self.scale();
        let t = self.state.translation();
        Transform::from_scale(s, s).pre_translate(t.x, t.y)
    }

    /// Runs `f` against the pixmap with the current clip mask. Skipped
    /// entirely when the clip is empty.
    fn with_pixmap(&mut self, f: impl FnOnce(&mut Pixmap, Option<&Mask>)) {
        let clip = self.state.clip();
        if let Some(clip) = clip {
            if clip.is_empty() {
                return;
            }
            if self.clip.as_ref().map(|c| c.clip) != Some(clip) {
                let (w, h) = {
                    let pm = self.surface.pixmap();
                    (pm.width(), pm.height())
                };
                let Some(mask) = skia::clip_mask(w, h, clip, self.scale()) else {
                    log::warn!("raster: cannot build a {w}x{h} clip mask, draw skipped");
                    return;
                };
                self.clip = Some(ClipMask { clip, mask });
            }
        }
        let mask = clip.and(self.clip.as_ref()).map(|c| &c.mask);
        let mut pixmap = self.surface.pixmap_mut();
        f(&mut pixmap, mask);
    }

    fn fill_color(&self) -> Option<Color> {
        let fill = self.state.style().and_then(|s| s.fill);
        if fill.is_none() {
            log::trace!("raster: fill without a fill style");
        }
        fill.map(|f| f.color)
    }

    fn radius(&self) -> f32 {
        self.state.style().map_or(0.0, |s| s.radius)
    }

    fn glyph(&mut self, font: FontId, index: u16, px: f32, color: Color) -> Option<Rc<Glyph>> {
        let fonts = self.env.fonts.clone();
        self.glyphs
            .entry((font, index, px.to_bits(), color.to_premul_rgba8()))
            .or_insert_with(|| {
                let (m, coverage) = fonts.rasterize(font, index, px)?;
                let pixmap = tint(m.width as u32, m.height as u32, coverage, color);
                Some(Rc::new(Glyph { xmin: m.xmin, ymin: m.ymin, height: m.height as i32, pixmap }))
            })
            .clone()
    }

    /// Draws one shaped line in `color`. Each glyph is stamped at every
    /// offset in `offsets` (physical pixels).
    fn draw_line(&mut self, text: &str, pos: Point, max_width: Option<f32>, color: Color, offsets: &[(i32, i32)]) {
        if text.is_empty() {
            return;
        }
        let style = self.state.style().cloned();
        let Some((font, size)) = self.env.resolve_font(style.as_deref()) else {
            log::trace!("raster: text without a usable font");
            return;
        };

        let s = self.scale();
        let px = size * s;
        let line = self.env.fonts.shape_line(text, font, px);
        let origin = self.state.to_surface(pos) * s;
        let limit = max_width.map(|w| w * s);

        let mut stamps = Vec::with_capacity(line.glyphs.len());
        for g in &line.glyphs {
            if limit.is_some_and(|limit| g.x + g.advance > limit + 0.01) {
                break;
            }
            let Some(glyph) = self.glyph(font, g.index, px, color) else { continue };
            if glyph.pixmap.is_none() {
                continue;
            }
            let x = (origin.x + g.x).round() as i32 + glyph.xmin;
            let y = origin.y.round() as i32 - glyph.ymin - glyph.height;
            stamps.push((x, y, glyph));
        }

        let paint = PixmapPaint::default();
        self.with_pixmap(|pm, mask| {
            for (x, y, glyph) in &stamps {
                let Some(ink) = &glyph.pixmap else { continue };
                for (dx, dy) in offsets {
                    pm.draw_pixmap(x + dx, y + dy, ink.as_ref(), &paint, Transform::identity(), mask);
                }
            }
        });
    }
}

/// Glyph coverage turned into a pixmap of `color`.
fn tint(width: u32, height: u32, coverage: Vec<u8>, color: Color) -> Option<Pixmap> {
    let size = IntSize::from_wh(width, height)?;
    let mask = Mask::from_vec(coverage, size)?;
    let mut pixmap = Pixmap::new(width, height)?;
    let paint = skia::solid(color, false)?;
    let full = tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, height as f32)?;
    pixmap.fill_rect(full, &paint, Transform::identity(), Some(&mask));
    Some(pixmap)
}

impl Painter for RasterPainter {
    fn backend(&self) -> &'static str {
        "raster"
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
        self.scale()
    }

    fn clear_all(&mut self, color: Color) {
        self.with_pixmap(|pm, mask| match mask {
            None => pm.fill(skia::color(color).unwrap_or(tiny_skia::Color::TRANSPARENT)),
            Some(mask) => {
                let full = tiny_skia::Rect::from_xywh(0.0, 0.0, pm.width() as f32, pm.height() as f32);
                if let Some(full) = full {
                    pm.fill_rect(full, &skia::replace(color), Transform::identity(), Some(mask));
                }
            }
        });
    }

    fn fill_rect(&mut self, rect: Rect) {
        let Some(color) = self.fill_color() else { return };
        let Some(r) = skia::rect(rect) else { return };
        let radius = self.radius();
        let Some(paint) = skia::solid(color, radius > 0.0) else { return };
        let ts = self.transform();

        self.with_pixmap(|pm, mask| {
            if radius > 0.0 {
                if let Some(path) = skia::rounded_rect(r, radius) {
                    pm.fill_path(&path, &paint, FillRule::Winding, ts, mask);
                }
            } else {
                pm.fill_rect(r, &paint, ts, mask);
            }
        });
    }

    fn stroke_rect(&mut self, rect: Rect) {
        let Some(stroke) = self.state.style().and_then(|s| s.stroke) else {
            log::trace!("raster: stroke without a stroke style");
            return;
        };
        let Some(r) = skia::rect(rect) else { return };
        let radius = self.radius();
        let Some(paint) = skia::solid(stroke.color, radius > 0.0) else { return };
        let ts = self.transform();

        // The pen runs half a width inside the edge; strokes as wide as the
        // rect fill it.
        let w = stroke.width.max(1.0 / self.scale());
        let inner = tiny_skia::Rect::from_ltrb(
            r.left() + w / 2.0,
            r.top() + w / 2.0,
            r.right() - w / 2.0,
            r.bottom() - w / 2.0,
        );
        let Some(inner) = inner.filter(|i| i.width() > 0.0 && i.height() > 0.0) else {
            self.with_pixmap(|pm, mask| match skia::rounded_rect(r, radius) {
                Some(path) => pm.fill_path(&path, &paint, FillRule::Winding, ts, mask),
                None => pm.fill_rect(r, &paint, ts, mask),
            });
            return;
        };
        let Some(path) = skia::rounded_rect(inner, (radius - w / 2.0).max(0.0)) else { return };
        let pen = tiny_skia::Stroke { width: w, line_join: LineJoin::Miter, ..Default::default() };
        self.with_pixmap(|pm, mask| pm.stroke_path(&path, &paint, &pen, ts, mask));
    }

    fn fill_circle(&mut self, circle: Circle) {
        let Some(color) = self.fill_color() else { return };
        let Some(paint) = skia::solid(color, true) else { return };
        let Some(path) = PathBuilder::from_circle(circle.center.x, circle.center.y, circle.radius) else {
            return;
        };
        let ts = self.transform();
        self.with_pixmap(|pm, mask| pm.fill_path(&path, &paint, FillRule::Winding, ts, mask));
    }

    fn stroke_circle(&mut self, circle: Circle) {
        let Some(stroke) = self.state.style().and_then(|s| s.stroke) else {
            log::trace!("raster: stroke without a stroke style");
            return;
        };
        let Some(paint) = skia::solid(stroke.color, true) else { return };
        let Some(path) = PathBuilder::from_circle(circle.center.x, circle.center.y, circle.radius) else {
            return;
        };
        let pen = tiny_skia::Stroke { width: stroke.width.max(1.0 / self.scale()), ..Default::default() };
        let ts = self.transform();
        self.with_pixmap(|pm, mask| pm.stroke_path(&path, &paint, &pen, ts, mask));
    }

    fn fill_text(&mut self, text: &str, pos: Point, max_width: Option<f32>) {
        let Some(color) = self.fill_color() else { return };
        self.draw_line(text, pos, max_width, color, &[(0, 0)]);
    }

    /// fontdue only yields coverage, so the outline is approximated by
    /// stamping the glyphs around a ring of half the stroke width.
    fn stroke_text(&mut self, text: &str, pos: Point, max_width: Option<f32>) {
        let Some(stroke) = self.state.style().and_then(|s| s.stroke) else {
            log::trace!("raster: stroke text without a stroke style");
            return;
        };
        let d = ((stroke.width * self.scale() / 2.0).round() as i32).max(1);
        let ring = [(-d, -d), (0, -d), (d, -d), (-d, 0), (d, 0), (-d, d), (0, d), (d, d)];
        self.draw_line(text, pos, max_width, stroke.color, &ring);
    }

    fn draw_caret(&mut self, pos: Point, height: f32) {
        let Some(color) = self.fill_color() else { return };
        let Some(r) = skia::rect(Rect::new(pos.x, pos.y, CARET_WIDTH, height)) else { return };
        let Some(paint) = skia::solid(color, false) else { return };
        let ts = self.transform();
        self.with_pixmap(|pm, mask| pm.fill_rect(r, &paint, ts, mask));
    }

    fn draw_image(&mut self, id: &ResourceId, rect: Rect) {
        let Some(bitmap) = self.env.images.get(id) else {
            log::trace!("raster: image {id} not ready, skipped");
            return;
        };
        let Some(dst) = skia::rect(rect) else { return };
        let ts = self.transform().pre_translate(dst.x(), dst.y()).pre_scale(
            dst.width() / bitmap.width() as f32,
            dst.height() / bitmap.height() as f32,
        );
        let paint = PixmapPaint { quality: FilterQuality::Nearest, ..Default::default() };
        self.with_pixmap(|pm, mask| pm.draw_pixmap(0, 0, bitmap.as_pixmap(), &paint, ts, mask));
    }

    fn flush(&mut self) {
        self.surface.mark_flushed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::resource::{Bitmap, Completion, Loader, ResourceCache};
    use crate::style::Style;

    const RED: Color = Color::from_premul(1.0, 0.0, 0.0, 1.0);
    const BLUE: Color = Color::from_premul(0.0, 0.0, 1.0, 1.0);

    fn painter(w: f32, h: f32, scale: f32) -> RasterPainter {
        painter_with(w, h, scale, ResourceCache::default())
    }

    fn painter_with(w: f32, h: f32, scale: f32, images: ResourceCache) -> RasterPainter {
        let surface = RasterSurface::new(Size::new(w, h), scale).unwrap();
        let env = PaintEnv::new(crate::testing::fonts(), images);
        RasterPainter::new(&surface, env)
    }

    fn px(p: &RasterPainter, x: u32, y: u32) -> [u8; 4] {
        p.surface().pixel(x, y)
    }

    fn blank(p: &RasterPainter) -> bool {
        p.surface().pixmap().data().iter().all(|&b| b == 0)
    }

    fn inked(p: &RasterPainter) -> Vec<(u32, u32)> {
        let pm = p.surface().pixmap();
        (0..pm.height())
            .flat_map(|y| (0..pm.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| skia::pixel(&pm, x, y)[3] > 0)
            .collect()
    }

    // ── state ─────────────────────────────────────────────────────────────

    #[test]
    fn missing_style_draws_nothing() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.stroke_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.fill_circle(Circle::new(Point::new(5.0, 5.0), 3.0));
        p.fill_text("hi", Point::new(0.0, 8.0), None);
        p.stroke_text("hi", Point::new(0.0, 8.0), None);
        p.draw_caret(Point::new(1.0, 1.0), 5.0);
        assert!(blank(&p));
    }

    #[test]
    fn inner_style_does_not_leak_after_restore() {
        let mut p = painter(40.0, 40.0, 1.0);
        p.save();
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.translate(Point::new(10.0, 10.0));
        p.save();
        p.set_style(Some(Style::new().fill(BLUE).shared()));
        p.restore();
        p.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        p.restore();

        assert_eq!(px(&p, 10, 10), [255, 0, 0, 255]);
        assert_eq!(px(&p, 14, 14), [255, 0, 0, 255]);
        assert_eq!(px(&p, 9, 9), [0; 4]);
        assert_eq!(px(&p, 15, 15), [0; 4]);
    }

    #[test]
    fn clip_limits_drawing() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.translate(Point::new(5.0, 5.0));
        p.clip(Rect::new(0.0, 0.0, 4.0, 4.0));
        p.fill_rect(Rect::new(-5.0, -5.0, 30.0, 30.0));
        assert_eq!(px(&p, 5, 5), [255, 0, 0, 255]);
        assert_eq!(px(&p, 8, 8), [255, 0, 0, 255]);
        assert_eq!(px(&p, 9, 9), [0; 4]);
        assert_eq!(px(&p, 4, 4), [0; 4]);
    }

    #[test]
    fn clip_is_dropped_on_restore() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.save();
        p.clip(Rect::new(0.0, 0.0, 2.0, 2.0));
        p.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.restore();
        assert_eq!(px(&p, 5, 5), [0; 4]);

        p.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(px(&p, 5, 5), [255, 0, 0, 255]);
    }

    #[test]
    fn disjoint_clip_rejects_everything() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.clip(Rect::new(0.0, 0.0, 2.0, 2.0));
        p.clip(Rect::new(5.0, 5.0, 2.0, 2.0));
        p.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        p.clear_all(Color::WHITE);
        assert!(blank(&p));
    }

    #[test]
    fn scale_factor_maps_to_physical_pixels() {
        let mut p = painter(10.0, 10.0, 2.0);
        assert_eq!(p.surface().pixmap().width(), 20);
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.fill_rect(Rect::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(px(&p, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&p, 3, 3), [255, 0, 0, 255]);
        assert_eq!(px(&p, 4, 4), [0; 4]);
    }

    #[test]
    fn half_transparent_fill_blends_over() {
        let mut p = painter(1.0, 1.0, 1.0);
        p.clear_all(Color::WHITE);
        p.set_style(Some(Style::new().fill(Color::from_straight(0.0, 0.0, 0.0, 0.5)).shared()));
        p.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        let [r, g, b, a] = px(&p, 0, 0);
        assert!((126..=129).contains(&r) && r == g && g == b);
        assert_eq!(a, 255);
    }

    // ── shapes ────────────────────────────────────────────────────────────

    #[test]
    fn stroke_stays_inside_rect() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().stroke(RED, 2.0).shared()));
        p.stroke_rect(Rect::new(2.0, 2.0, 10.0, 10.0));
        assert_eq!(px(&p, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&p, 11, 11), [255, 0, 0, 255]);
        assert_eq!(px(&p, 12, 12), [0; 4]);
        assert_eq!(px(&p, 1, 1), [0; 4]);
        assert_eq!(px(&p, 6, 6), [0; 4]);
    }

    #[test]
    fn stroke_wider_than_rect_fills_it() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.set_style(Some(Style::new().stroke(RED, 4.0).shared()));
        p.stroke_rect(Rect::new(2.0, 2.0, 3.0, 6.0));
        assert_eq!(px(&p, 3, 5), [255, 0, 0, 255]);
        assert_eq!(px(&p, 5, 5), [0; 4]);
    }

    #[test]
    fn radius_rounds_fill_and_stroke_corners() {
        let mut p = painter(40.0, 20.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).stroke(BLUE, 2.0).radius(6.0).shared()));
        p.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        p.stroke_rect(Rect::new(20.0, 0.0, 20.0, 20.0));

        assert_eq!(px(&p, 0, 0), [0; 4]);
        assert_eq!(px(&p, 10, 10), [255, 0, 0, 255]);
        assert!(px(&p, 10, 0)[3] > 200);
        assert_eq!(px(&p, 20, 0), [0; 4]);
        assert!(px(&p, 30, 0)[2] > 200);
        assert_eq!(px(&p, 30, 10), [0; 4]);
    }

    #[test]
    fn circle_covers_center_not_corners() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).shared()));
        p.fill_circle(Circle::new(Point::new(10.0, 10.0), 5.0));
        assert_eq!(px(&p, 10, 10), [255, 0, 0, 255]);
        assert_eq!(px(&p, 0, 0), [0; 4]);
        assert_eq!(px(&p, 19, 19), [0; 4]);
    }

    #[test]
    fn ring_leaves_center_empty() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().stroke(RED, 1.0).shared()));
        p.stroke_circle(Circle::new(Point::new(10.0, 10.0), 6.0));
        assert_eq!(px(&p, 10, 10), [0; 4]);
        assert!(px(&p, 16, 10)[3] > 0);
    }

    #[test]
    fn caret_is_a_thin_bar() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).radius(5.0).shared()));
        p.draw_caret(Point::new(4.0, 2.0), 10.0);
        assert_eq!(px(&p, 4, 2), [255, 0, 0, 255]);
        assert_eq!(px(&p, 5, 11), [255, 0, 0, 255]);
        assert_eq!(px(&p, 6, 5), [0; 4]);
        assert_eq!(px(&p, 4, 12), [0; 4]);
    }

    // ── text ──────────────────────────────────────────────────────────────

    #[test]
    fn text_draws_ink_above_baseline() {
        let mut p = painter(100.0, 40.0, 1.0);
        p.set_style(Some(Style::new().fill(Color::BLACK).font("DejaVu Sans Mono", 20.0).shared()));
        p.fill_text("H", Point::new(2.0, 30.0), None);

        let ink = inked(&p);
        assert!(!ink.is_empty());
        assert!(ink.iter().all(|&(_, y)| y < 31 && y > 10));
    }

    #[test]
    fn text_uses_the_fill_color() {
        let mut p = painter(40.0, 40.0, 1.0);
        p.set_style(Some(Style::new().fill(RED).font("DejaVu Sans Mono", 24.0).shared()));
        p.fill_text("H", Point::new(2.0, 30.0), None);
        let ink = inked(&p);
        assert!(ink.iter().any(|&(x, y)| px(&p, x, y)[0] >= 250));
        assert!(ink.iter().all(|&(x, y)| px(&p, x, y)[1] == 0));
    }

    #[test]
    fn stroke_text_spreads_past_the_fill() {
        let style = Style::new().fill(RED).stroke(BLUE, 4.0).font("DejaVu Sans Mono", 20.0);
        let mut filled = painter(60.0, 40.0, 1.0);
        let mut stroked = painter(60.0, 40.0, 1.0);
        filled.set_style(Some(style.clone().shared()));
        stroked.set_style(Some(style.shared()));

        filled.fill_text("H", Point::new(10.0, 30.0), None);
        stroked.stroke_text("H", Point::new(10.0, 30.0), None);

        let f = inked(&filled);
        let s = inked(&stroked);
        assert!(s.len() > f.len());
        assert!(s.iter().all(|&(x, y)| px(&stroked, x, y)[0] == 0));
        let left = |v: &[(u32, u32)]| v.iter().map(|&(x, _)| x).min();
        assert!(left(&s) < left(&f));
    }

    #[test]
    fn empty_text_changes_nothing() {
        let mut p = painter(20.0, 20.0, 1.0);
        p.set_style(Some(Style::new().fill(Color::BLACK).font("DejaVu Sans Mono", 12.0).shared()));
        let depth = p.depth();
        p.fill_text("", Point::new(0.0, 10.0), None);
        assert!(blank(&p));
        assert_eq!(p.depth(), depth);
    }

    #[test]
    fn max_width_drops_trailing_glyphs() {
        let mut full = painter(200.0, 30.0, 1.0);
        let mut cut = painter(200.0, 30.0, 1.0);
        let style = Style::new().fill(Color::BLACK).font("DejaVu Sans Mono", 20.0).shared();
        full.set_style(Some(style.clone()));
        cut.set_style(Some(style));
        let one = full.measure_text("M");

        full.fill_text("MMMM", Point::new(0.0, 25.0), None);
        cut.fill_text("MMMM", Point::new(0.0, 25.0), Some(one * 2.0));

        let right_edge = |p: &RasterPainter| inked(p).iter().map(|&(x, _)| x).max();
        assert!(right_edge(&cut).unwrap() < (one * 2.0).ceil() as u32 + 1);
        assert!(right_edge(&full).unwrap() > (one * 3.0) as u32);
    }

    // ── images ────────────────────────────────────────────────────────────

    #[test]
    fn uncached_image_is_skipped() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.draw_image(&ResourceId::from("nowhere.png"), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(blank(&p));
    }

    #[test]
    fn image_is_scaled_nearest_into_rect() {
        struct Fixed(Bitmap);

        impl Loader for Fixed {
            fn load(&self, _: &ResourceId, done: Completion) {
                done.finish(Ok(self.0.clone()));
            }
        }

        let bmp = Bitmap::from_straight_rgba8(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let images = ResourceCache::new(Fixed(bmp));
        let id = ResourceId::from("two.png");
        images.request(id.clone(), |_| {});
        assert_eq!(images.poll(), 1);

        let mut p = painter_with(8.0, 4.0, 1.0, images);
        p.translate(Point::new(2.0, 1.0));
        p.draw_image(&id, Rect::new(0.0, 0.0, 4.0, 2.0));

        assert_eq!(px(&p, 2, 1), [255, 0, 0, 255]);
        assert_eq!(px(&p, 3, 2), [255, 0, 0, 255]);
        assert_eq!(px(&p, 4, 1), [0, 0, 255, 255]);
        assert_eq!(px(&p, 5, 2), [0, 0, 255, 255]);
        assert_eq!(px(&p, 6, 1), [0; 4]);
        assert_eq!(px(&p, 1, 1), [0; 4]);
    }

    // ── clear and flush ───────────────────────────────────────────────────

    #[test]
    fn clear_all_replaces_pixels_in_clip() {
        let mut p = painter(10.0, 10.0, 1.0);
        p.clear_all(Color::WHITE);
        p.clip(Rect::new(0.0, 0.0, 2.0, 2.0));
        p.clear_all(Color::transparent());
        assert_eq!(px(&p, 0, 0), [0; 4]);
        assert_eq!(px(&p, 5, 5), [255; 4]);
    }

    #[test]
    fn flush_is_counted() {
        let mut p = painter(4.0, 4.0, 1.0);
        p.flush();
        p.flush();
        assert_eq!(p.surface().flush_count(), 2);
    }
}
