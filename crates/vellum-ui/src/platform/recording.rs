use vellum_engine::coords::{Rect, Size};

use crate::backend::recording::{RecordingPainter, RecordingSurface};
use crate::event::CursorKind;
use crate::frame::FrameConfig;
use crate::painter::{PaintEnv, Painter};

use super::Platform;

/// Headless platform over the recording backend.
///
/// Keeps every surface it ever created, so tests can check which surface a
/// draw landed on after a resize.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    scale: f32,
    open: bool,
    surfaces: Vec<RecordingSurface>,
    presents: Vec<usize>,
    cursors: Vec<CursorKind>,
    ime_rects: Vec<Rect>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self { scale: 1.0, ..Self::default() }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Surfaces in creation order.
    pub fn surfaces(&self) -> &[RecordingSurface] {
        &self.surfaces
    }

    /// For each present, the index of the surface that was shown.
    pub fn presents(&self) -> &[usize] {
        &self.presents
    }

    pub fn cursors(&self) -> &[CursorKind] {
        &self.cursors
    }

    pub fn ime_rects(&self) -> &[Rect] {
        &self.ime_rects
    }
}

impl Platform for RecordingPlatform {
    type Surface = RecordingSurface;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn open(&mut self, config: &FrameConfig) -> anyhow::Result<Size> {
        self.scale = config.scale_factor;
        self.open = true;
        Ok(config.size())
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn create_surface(&mut self, size: Size, scale: f32) -> anyhow::Result<RecordingSurface> {
        let surface = RecordingSurface::new(size, scale);
        self.surfaces.push(surface.clone());
        Ok(surface)
    }

    fn bind_painter(&mut self, surface: &RecordingSurface, env: &PaintEnv) -> Box<dyn Painter> {
        Box::new(RecordingPainter::bind(surface, env.clone()))
    }

    fn present(&mut self, surface: &RecordingSurface) -> anyhow::Result<()> {
        let index = self
            .surfaces
            .iter()
            .position(|s| s.same_surface(surface))
            .ok_or_else(|| anyhow::anyhow!("present of a surface this platform never created"))?;
        self.presents.push(index);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn set_cursor(&mut self, cursor: CursorKind) {
        self.cursors.push(cursor);
    }

    fn set_ime_cursor_rect(&mut self, rect: Rect) {
        self.ime_rects.push(rect);
    }
}
