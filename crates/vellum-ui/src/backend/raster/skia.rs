//! Glue between vellum geometry/colors and tiny-skia.

use tiny_skia::{BlendMode, FillRule, Mask, Paint, Path, PathBuilder, Pixmap, Transform};

use vellum_engine::coords::Rect;
use vellum_engine::paint::Color;

/// Cubic control-point distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

pub(super) fn rect(r: Rect) -> Option<tiny_skia::Rect> {
    let r = r.normalized();
    if r.is_empty() || !r.is_finite() {
        return None;
    }
    tiny_skia::Rect::from_xywh(r.origin.x, r.origin.y, r.size.width, r.size.height)
}

/// tiny-skia colors are straight alpha.
pub(super) fn color(c: Color) -> Option<tiny_skia::Color> {
    if !c.is_finite() {
        return None;
    }
    let (r, g, b, a) = c.clamped().to_straight();
    tiny_skia::Color::from_rgba(r.min(1.0), g.min(1.0), b.min(1.0), a)
}

/// Solid source-over paint; `None` for colors that would draw nothing.
pub(super) fn solid(c: Color, anti_alias: bool) -> Option<Paint<'static>> {
    if c.is_transparent() {
        return None;
    }
    let mut paint = Paint::default();
    paint.set_color(color(c)?);
    paint.anti_alias = anti_alias;
    Some(paint)
}

/// Paint that replaces destination pixels instead of blending over them.
pub(super) fn replace(c: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(c).unwrap_or(tiny_skia::Color::TRANSPARENT));
    paint.blend_mode = BlendMode::Source;
    paint.anti_alias = false;
    paint
}

/// Rectangle path whose corners are rounded by `radius`, clamped to half
/// the shorter side.
pub(super) fn rounded_rect(r: tiny_skia::Rect, radius: f32) -> Option<Path> {
    let radius = radius.min(r.width() / 2.0).min(r.height() / 2.0);
    if !(radius > 0.0) {
        return Some(PathBuilder::from_rect(r));
    }
    let (l, t, rt, b) = (r.left(), r.top(), r.right(), r.bottom());
    let c = radius * (1.0 - KAPPA);

    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(rt - radius, t);
    pb.cubic_to(rt - c, t, rt, t + c, rt, t + radius);
    pb.line_to(rt, b - radius);
    pb.cubic_to(rt, b - c, rt - c, b, rt - radius, b);
    pb.line_to(l + radius, b);
    pb.cubic_to(l + c, b, l, b - c, l, b - radius);
    pb.line_to(l, t + radius);
    pb.cubic_to(l, t + c, l + c, t, l + radius, t);
    pb.close();
    pb.finish()
}

/// Hard-edged mask covering `clip` (surface space, logical) on a pixmap of
/// `width` x `height` scaled by `scale`. An empty clip yields an all-zero
/// mask, so nothing passes.
pub(super) fn clip_mask(width: u32, height: u32, clip: Rect, scale: f32) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    if let Some(r) = rect(clip) {
        let path = PathBuilder::from_rect(r);
        mask.fill_path(&path, FillRule::Winding, false, Transform::from_scale(scale, scale));
    }
    Some(mask)
}

/// Premultiplied RGBA at (`x`, `y`), transparent outside the pixmap.
pub fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
    pixmap
        .pixel(x, y)
        .map_or([0; 4], |p| [p.red(), p.green(), p.blue(), p.alpha()])
}

#[cfg(test)]
mod tests {
    use super::*;

    use tiny_skia::PixmapPaint;

    #[test]
    fn straight_color_roundtrips() {
        let c = color(Color::from_straight(1.0, 0.5, 0.0, 0.5)).unwrap();
        assert!((c.red() - 1.0).abs() < 1e-5);
        assert!((c.green() - 0.5).abs() < 1e-5);
        assert!((c.alpha() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn transparent_has_no_solid_paint() {
        assert!(solid(Color::transparent(), true).is_none());
        assert!(solid(Color::from_premul(f32::NAN, 0.0, 0.0, 1.0), true).is_none());
    }

    #[test]
    fn degenerate_rects_are_rejected() {
        assert!(rect(Rect::new(0.0, 0.0, 0.0, 5.0)).is_none());
        assert!(rect(Rect::new(0.0, f32::INFINITY, 5.0, 5.0)).is_none());
        let r = rect(Rect::new(4.0, 4.0, -2.0, -2.0)).unwrap();
        assert_eq!((r.left(), r.top(), r.right(), r.bottom()), (2.0, 2.0, 4.0, 4.0));
    }

    #[test]
    fn rounded_corner_leaves_the_corner_pixel_empty() {
        let mut pm = Pixmap::new(20, 20).unwrap();
        let r = rect(Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
        let path = rounded_rect(r, 8.0).unwrap();
        let paint = solid(Color::WHITE, true).unwrap();
        pm.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

        assert_eq!(pixel(&pm, 0, 0), [0; 4]);
        assert_eq!(pixel(&pm, 10, 10), [255; 4]);
        assert!(pixel(&pm, 10, 0)[3] > 200);
    }

    #[test]
    fn oversized_radius_is_clamped() {
        let r = rect(Rect::new(0.0, 0.0, 10.0, 4.0)).unwrap();
        let bounds = rounded_rect(r, 100.0).unwrap().bounds();
        assert_eq!((bounds.width(), bounds.height()), (10.0, 4.0));
    }

    #[test]
    fn empty_clip_masks_everything() {
        let mask = clip_mask(4, 4, Rect::new(1.0, 1.0, 0.0, 0.0), 1.0).unwrap();
        let src = {
            let mut p = Pixmap::new(4, 4).unwrap();
            p.fill(tiny_skia::Color::WHITE);
            p
        };
        let mut dst = Pixmap::new(4, 4).unwrap();
        dst.draw_pixmap(0, 0, src.as_ref(), &PixmapPaint::default(), Transform::identity(), Some(&mask));
        assert!(dst.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn clip_mask_follows_scale() {
        let mask = clip_mask(8, 8, Rect::new(1.0, 1.0, 2.0, 2.0), 2.0).unwrap();
        let mut dst = Pixmap::new(8, 8).unwrap();
        let full = rect(Rect::new(0.0, 0.0, 8.0, 8.0)).unwrap();
        dst.fill_rect(full, &replace(Color::WHITE), Transform::identity(), Some(&mask));

        assert_eq!(pixel(&dst, 1, 1), [0; 4]);
        assert_eq!(pixel(&dst, 2, 2), [255; 4]);
        assert_eq!(pixel(&dst, 5, 5), [255; 4]);
        assert_eq!(pixel(&dst, 6, 6), [0; 4]);
    }
}
