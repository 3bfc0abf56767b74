//! Multi-line text layout.
//!
//! Shaping comes from the engine's [`FontSystem`]; this module only breaks
//! text into lines and places them. A paragraph must be laid out before it
//! can be measured or drawn.

use std::rc::Rc;

use vellum_engine::paint::Color;
use vellum_engine::text::{FontId, FontMetrics, FontSystem, ShapedLine};

use crate::style::{Font, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParagraphError {
    #[error("paragraph has not been laid out")]
    NotLaidOut,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphStyle {
    pub font: Font,
    pub color: Color,
    /// Multiplier applied to the font's natural line height.
    pub line_spacing: f32,
    pub align: TextAlign,
}

impl ParagraphStyle {
    pub fn new(font: Font, color: Color) -> Self {
        Self { font, color, line_spacing: 1.0, align: TextAlign::Left }
    }

    pub fn line_spacing(mut self, k: f32) -> Self {
        self.line_spacing = k;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// One laid-out line, relative to the paragraph's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

#[derive(Debug, Clone)]
struct Layout {
    max_width: f32,
    height: f32,
    longest_line: f32,
    lines: Vec<ParagraphLine>,
}

/// Builds paragraphs that measure with a given font system and scale.
#[derive(Clone)]
pub struct ParagraphEngine {
    fonts: Rc<FontSystem>,
    scale: f32,
}

impl ParagraphEngine {
    pub fn new(fonts: Rc<FontSystem>) -> Self {
        Self::with_scale(fonts, 1.0)
    }

    /// `scale` should match the painter that will draw the paragraphs.
    pub fn with_scale(fonts: Rc<FontSystem>, scale: f32) -> Self {
        Self { fonts, scale: scale.max(0.01) }
    }

    pub fn build(&self, style: ParagraphStyle, text: impl Into<String>) -> Paragraph {
        let text_style = Style::new()
            .fill(style.color)
            .font(style.font.family.clone(), style.font.size)
            .shared();
        Paragraph {
            fonts: self.fonts.clone(),
            scale: self.scale,
            face: self.fonts.resolve(&style.font.family),
            style,
            text_style,
            text: text.into(),
            layout: None,
        }
    }

    /// Same as [`Paragraph::layout`].
    pub fn layout(&self, paragraph: &mut Paragraph, max_width: f32) {
        paragraph.layout(max_width);
    }
}

/// Styled text plus, once laid out, its line breaks.
pub struct Paragraph {
    fonts: Rc<FontSystem>,
    scale: f32,
    face: Option<FontId>,
    style: ParagraphStyle,
    text_style: Rc<Style>,
    text: String,
    layout: Option<Layout>,
}

impl Paragraph {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &ParagraphStyle {
        &self.style
    }

    /// Painter style equivalent to the paragraph style.
    pub fn text_style(&self) -> Rc<Style> {
        self.text_style.clone()
    }

    /// Breaks the text into lines no wider than `max_width`.
    ///
    /// Replaces any previous layout. Words wrap greedily, `\n` always breaks,
    /// and a word wider than the limit is split between characters (keeping
    /// at least one character per line). A NaN width means "unbounded".
    pub fn layout(&mut self, max_width: f32) {
        let limit = if max_width.is_nan() { f32::INFINITY } else { max_width.max(0.0) };
        let metrics = self.metrics();
        let line_height = metrics.line_height() * self.style.line_spacing.max(0.0);

        let mut raw = Vec::new();
        for hard_line in self.text.split('\n') {
            self.wrap(hard_line.trim_end_matches('\r'), limit, &mut raw);
        }

        let mut longest_line = 0.0f32;
        let lines = raw
            .into_iter()
            .enumerate()
            .map(|(i, (text, width))| {
                longest_line = longest_line.max(width);
                let slack = if limit.is_finite() { (limit - width).max(0.0) } else { 0.0 };
                let x = match self.style.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => slack / 2.0,
                    TextAlign::Right => slack,
                };
                ParagraphLine { text, x, baseline: i as f32 * line_height + metrics.ascent, width }
            })
            .collect::<Vec<_>>();

        log::trace!("paragraph laid out at {limit}: {} line(s)", lines.len());
        self.layout = Some(Layout {
            max_width: limit,
            height: lines.len() as f32 * line_height,
            longest_line,
            lines,
        });
    }

    pub fn is_laid_out(&self) -> bool {
        self.layout.is_some()
    }

    /// Total height of all lines.
    pub fn height(&self) -> Result<f32, ParagraphError> {
        self.laid_out().map(|l| l.height)
    }

    /// The width passed to the latest [`layout`](Self::layout).
    pub fn max_width(&self) -> Result<f32, ParagraphError> {
        self.laid_out().map(|l| l.max_width)
    }

    /// Width of the widest line.
    pub fn longest_line(&self) -> Result<f32, ParagraphError> {
        self.laid_out().map(|l| l.longest_line)
    }

    pub fn lines(&self) -> Result<&[ParagraphLine], ParagraphError> {
        self.laid_out().map(|l| l.lines.as_slice())
    }

    fn laid_out(&self) -> Result<&Layout, ParagraphError> {
        self.layout.as_ref().ok_or(ParagraphError::NotLaidOut)
    }

    fn metrics(&self) -> FontMetrics {
        match self.face {
            Some(id) if self.style.font.size > 0.0 => {
                self.fonts.metrics_scaled(id, self.style.font.size, self.scale)
            }
            _ => FontMetrics::default(),
        }
    }

    /// Pen span `(start, end)` of every char of `line`, in logical pixels.
    ///
    /// The line is shaped once; the width of any run of chars is then the end
    /// of its last span minus the start of its first, kerning included.
    /// Control chars take no space.
    fn spans(&self, line: &str) -> Vec<(f32, f32)> {
        let shaped = match self.face {
            Some(id) if self.style.font.size > 0.0 => {
                self.fonts.shape_line(line, id, self.style.font.size * self.scale)
            }
            _ => ShapedLine::default(),
        };
        let mut glyphs = shaped.glyphs.iter();
        let mut pen = 0.0f32;
        line.chars()
            .map(|ch| {
                if ch.is_control() {
                    return (pen, pen);
                }
                match glyphs.next() {
                    Some(g) => {
                        pen = (g.x + g.advance) / self.scale;
                        (g.x / self.scale, pen)
                    }
                    None => (pen, pen),
                }
            })
            .collect()
    }

    fn wrap(&self, line: &str, limit: f32, out: &mut Vec<(String, f32)>) {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let spans = self.spans(line);
        let byte = |i: usize| chars.get(i).map_or(line.len(), |c| c.0);
        let width = |from: usize, to: usize| if to > from { spans[to - 1].1 - spans[from].0 } else { 0.0 };
        let mut push = |from: usize, to: usize| {
            let text = line[byte(from)..byte(to)].trim_end();
            let ink = from + text.chars().count();
            out.push((text.to_string(), width(from, ink)));
        };

        // Chars [start, pos) are the current line.
        let mut start = 0;
        let mut pos = 0;
        for word in words(line) {
            let word_start = pos;
            let ink = pos + word.trim_end().chars().count();
            pos += word.chars().count();
            if width(start, ink) <= limit {
                continue;
            }
            if !line[byte(start)..byte(word_start)].trim_end().is_empty() {
                push(start, word_start);
            }
            start = word_start;
            if width(word_start, ink) <= limit {
                continue;
            }
            let mut line_ink = start;
            for (k, &(_, ch)) in chars.iter().enumerate().take(pos).skip(word_start) {
                let end = if ch.is_whitespace() { line_ink } else { k + 1 };
                if k == start || width(start, end) <= limit {
                    line_ink = end;
                    continue;
                }
                push(start, k);
                start = k;
                line_ink = if ch.is_whitespace() { k } else { k + 1 };
            }
        }
        push(start, chars.len());
    }
}

/// Splits into tokens of a word plus its trailing whitespace.
fn words(line: &str) -> impl Iterator<Item = &str> {
    let mut rest = line;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let tail = &rest[word_end..];
        let space_end = tail.find(|c: char| !c.is_whitespace()).unwrap_or(tail.len());
        let (token, next) = rest.split_at(word_end + space_end);
        rest = next;
        Some(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ParagraphEngine {
        ParagraphEngine::new(crate::testing::fonts())
    }

    fn style() -> ParagraphStyle {
        ParagraphStyle::new(Font::new("DejaVu Sans Mono", 20.0), Color::BLACK)
    }

    fn texts(p: &Paragraph) -> Vec<&str> {
        p.lines().unwrap().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn words_keep_trailing_space() {
        assert_eq!(words("ab  cd e").collect::<Vec<_>>(), vec!["ab  ", "cd ", "e"]);
        assert_eq!(words(" x").collect::<Vec<_>>(), vec![" ", "x"]);
    }

    #[test]
    fn measurements_require_layout() {
        let p = engine().build(style(), "hello");
        assert_eq!(p.height(), Err(ParagraphError::NotLaidOut));
        assert_eq!(p.max_width(), Err(ParagraphError::NotLaidOut));
        assert!(p.lines().is_err());
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let e = engine();
        let mut p = e.build(style(), "aaa bbb ccc");
        let fonts = crate::testing::fonts();
        let id = fonts.resolve("DejaVu Sans Mono").unwrap();
        let limit = fonts.measure_text("aaa bbb", id, 20.0) + 0.5;

        e.layout(&mut p, limit);
        assert_eq!(texts(&p), vec!["aaa bbb", "ccc"]);
        assert_eq!(p.max_width(), Ok(limit));
    }

    #[test]
    fn newlines_always_break() {
        let mut p = engine().build(style(), "one\n\ntwo");
        p.layout(f32::INFINITY);
        assert_eq!(texts(&p), vec!["one", "", "two"]);
    }

    #[test]
    fn long_words_break_between_characters() {
        let fonts = crate::testing::fonts();
        let id = fonts.resolve("DejaVu Sans Mono").unwrap();
        let mut p = engine().build(style(), "abcdefgh");
        p.layout(fonts.measure_text("abc", id, 20.0) + 0.1);
        assert_eq!(texts(&p), vec!["abc", "def", "gh"]);

        p.layout(0.0);
        assert_eq!(p.lines().unwrap().len(), 8);
    }

    #[test]
    fn line_widths_match_a_fresh_measurement() {
        let fonts = crate::testing::fonts();
        let id = fonts.resolve("DejaVu Sans Mono").unwrap();
        let mut p = engine().build(style(), "lorem ipsum dolor   sit amet");
        p.layout(fonts.measure_text("lorem ipsum", id, 20.0) + 0.5);

        assert_eq!(texts(&p), vec!["lorem ipsum", "dolor   sit", "amet"]);
        for line in p.lines().unwrap() {
            let fresh = fonts.measure_text(&line.text, id, 20.0);
            assert!((line.width - fresh).abs() < 1e-3, "{:?}: {} vs {fresh}", line.text, line.width);
        }
    }

    #[test]
    fn long_words_continue_after_a_break() {
        let fonts = crate::testing::fonts();
        let id = fonts.resolve("DejaVu Sans Mono").unwrap();
        let mut p = engine().build(style(), "ab cdefgh i");
        p.layout(fonts.measure_text("abc", id, 20.0) + 0.1);
        assert_eq!(texts(&p), vec!["ab", "cde", "fgh", "i"]);
    }

    #[test]
    fn relayout_replaces_previous_result() {
        let mut p = engine().build(style(), "aaa bbb ccc ddd");
        p.layout(30.0);
        let narrow = p.height().unwrap();
        p.layout(10_000.0);
        assert_eq!(texts(&p), vec!["aaa bbb ccc ddd"]);
        assert!(p.height().unwrap() < narrow);
    }

    #[test]
    fn height_is_line_count_times_line_height() {
        let fonts = crate::testing::fonts();
        let id = fonts.resolve("DejaVu Sans Mono").unwrap();
        let lh = fonts.metrics(id, 20.0).line_height();

        let mut p = engine().build(style().line_spacing(1.5), "a\nb\nc");
        p.layout(f32::INFINITY);
        let h = p.height().unwrap();
        assert!((h - 3.0 * lh * 1.5).abs() < 1e-3);

        let lines = p.lines().unwrap();
        assert!((lines[1].baseline - lines[0].baseline - lh * 1.5).abs() < 1e-3);
    }

    #[test]
    fn alignment_offsets_lines() {
        let mut p = engine().build(style().align(TextAlign::Right), "ab");
        p.layout(200.0);
        let line = &p.lines().unwrap()[0];
        assert!((line.x + line.width - 200.0).abs() < 1e-3);
    }
}
