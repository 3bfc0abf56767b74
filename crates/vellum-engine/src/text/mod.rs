//! Font loading, family resolution, shaping and measurement.

mod font_system;

pub use font_system::{FontId, FontLoadError, FontMetrics, FontSystem, ShapedGlyph, ShapedLine};
