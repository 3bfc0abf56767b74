use std::collections::HashMap;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Generic CSS family names. They never name a registered face directly
/// unless a caller aliases them with [`FontSystem::alias`].
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// Vertical metrics for one font at one pixel size.
///
/// All values are distances in the same pixel space as the requested size;
/// `descent` is positive below the baseline.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    /// Height of a flat capital letter above the baseline.
    pub cap_height: f32,
}

impl FontMetrics {
    #[inline]
    pub fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }

    #[inline]
    fn scaled(self, k: f32) -> Self {
        Self {
            ascent: self.ascent * k,
            descent: self.descent * k,
            line_gap: self.line_gap * k,
            cap_height: self.cap_height * k,
        }
    }
}

/// One glyph placed on a single line, pen-relative.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub ch: char,
    pub index: u16,
    /// Pen x position where the glyph origin sits.
    pub x: f32,
    pub advance: f32,
}

/// A shaped single line of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedLine {
    pub glyphs: Vec<ShapedGlyph>,
    /// Final pen position (the advance width of the whole line).
    pub width: f32,
}

/// Owns a collection of loaded fonts, addressable by family name.
///
/// Fonts are immutable after loading. Drawing and measurement both go through
/// [`FontSystem::resolve`] and [`FontSystem::shape_line`], so a string
/// measures exactly as wide as it draws.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
    families: HashMap<String, FontId>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new(), families: HashMap::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    ///
    /// The first font loaded becomes the fallback for unresolved families.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    /// Loads `bytes` and registers the face under `family`.
    pub fn register_family(&mut self, family: &str, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let id = self.load_font(bytes)?;
        self.alias(family, id);
        log::debug!("registered font family {family:?} as {id:?}");
        Ok(id)
    }

    /// Makes `family` resolve to an already loaded face.
    pub fn alias(&mut self, family: &str, id: FontId) {
        self.families.insert(normalize_family(family), id);
    }

    /// Looks up one family name, without fallback.
    pub fn family(&self, name: &str) -> Option<FontId> {
        self.families.get(&normalize_family(name)).copied()
    }

    /// The fallback face (first loaded), if any font is loaded.
    pub fn default_font(&self) -> Option<FontId> {
        (!self.fonts.is_empty()).then_some(FontId(0))
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Resolves a CSS-like family stack such as `"'Fira Sans', Arial, sans-serif"`.
    ///
    /// Returns the first registered family. Generic names match only when
    /// aliased. Falls back to [`default_font`](Self::default_font).
    pub fn resolve(&self, family_stack: &str) -> Option<FontId> {
        family_stack
            .split(',')
            .map(normalize_family)
            .filter(|name| !name.is_empty())
            .find_map(|name| {
                let hit = self.families.get(&name).copied();
                if hit.is_none() && !GENERIC_FAMILIES.contains(&name.as_str()) {
                    log::trace!("font family {name:?} not registered");
                }
                hit
            })
            .or_else(|| self.default_font())
    }

    /// Returns the underlying `fontdue::Font`, if `id` is valid.
    pub fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Shapes one line at `px` pixels: per-glyph pen positions with kerning.
    ///
    /// Control characters (including `\n`) take no space and are skipped.
    pub fn shape_line(&self, text: &str, id: FontId, px: f32) -> ShapedLine {
        let Some(font) = self.get(id) else {
            return ShapedLine::default();
        };

        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen = 0.0f32;
        let mut prev: Option<u16> = None;

        for ch in text.chars().filter(|c| !c.is_control()) {
            let index = font.lookup_glyph_index(ch);
            if let Some(left) = prev {
                pen += font.horizontal_kern_indexed(left, index, px).unwrap_or(0.0);
            }
            let advance = font.metrics_indexed(index, px).advance_width;
            glyphs.push(ShapedGlyph { ch, index, x: pen, advance });
            pen += advance;
            prev = Some(index);
        }

        ShapedLine { glyphs, width: pen }
    }

    /// Advance width of `text` in logical pixels.
    #[must_use]
    pub fn measure_text(&self, text: &str, id: FontId, size: f32) -> f32 {
        self.measure_text_scaled(text, id, size, 1.0)
    }

    /// Like [`measure_text`](Self::measure_text) but shapes at `size * scale`
    /// and divides the result back to logical pixels.
    ///
    /// Pass the scale the rasterizer draws at so the measured width matches
    /// the physical glyph positions exactly; fontdue advances are not
    /// perfectly proportional across pixel sizes.
    #[must_use]
    pub fn measure_text_scaled(&self, text: &str, id: FontId, size: f32, scale: f32) -> f32 {
        let scale = scale.max(0.01);
        self.shape_line(text, id, size * scale).width / scale
    }

    /// Vertical metrics at `size` logical pixels.
    pub fn metrics(&self, id: FontId, size: f32) -> FontMetrics {
        self.metrics_scaled(id, size, 1.0)
    }

    /// Vertical metrics computed at `size * scale`, returned in logical pixels.
    pub fn metrics_scaled(&self, id: FontId, size: f32, scale: f32) -> FontMetrics {
        let Some(font) = self.get(id) else {
            return FontMetrics::default();
        };
        let scale = scale.max(0.01);
        let px = size * scale;

        let (ascent, descent, line_gap) = match font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent, lm.descent.abs(), lm.line_gap),
            None => (px * 0.8, px * 0.2, 0.0),
        };
        let cap_height = font.metrics('H', px).bounds.height;

        FontMetrics { ascent, descent, line_gap, cap_height }.scaled(1.0 / scale)
    }

    /// Rasterizes one glyph to an 8-bit coverage mask.
    pub fn rasterize(&self, id: FontId, index: u16, px: f32) -> Option<(fontdue::Metrics, Vec<u8>)> {
        self.get(id).map(|font| font.rasterize_indexed(index, px))
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_family(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
        .to_ascii_lowercase()
}
