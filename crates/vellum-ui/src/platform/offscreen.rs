use vellum_engine::coords::Size;

use crate::backend::raster::{RasterPainter, RasterSurface};
use crate::event::CursorKind;
use crate::frame::{FrameConfig, FrameError};
use crate::painter::{PaintEnv, Painter};

use super::Platform;

/// Headless platform over the raster backend.
///
/// The window is imaginary: its size and scale come from the frame config.
/// Clipboard text stays in memory.
#[derive(Debug, Default)]
pub struct OffscreenPlatform {
    scale: f32,
    open: bool,
    presented: u64,
    last_presented: Option<RasterSurface>,
    cursor: CursorKind,
    clipboard: Option<String>,
}

impl OffscreenPlatform {
    pub fn new() -> Self {
        Self { scale: 1.0, ..Self::default() }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of successful presents.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Surface shown by the last present.
    pub fn last_presented(&self) -> Option<&RasterSurface> {
        self.last_presented.as_ref()
    }

    pub fn cursor(&self) -> CursorKind {
        self.cursor
    }
}

impl Platform for OffscreenPlatform {
    type Surface = RasterSurface;

    fn name(&self) -> &'static str {
        "offscreen"
    }

    fn open(&mut self, config: &FrameConfig) -> anyhow::Result<Size> {
        anyhow::ensure!(!self.open, "offscreen platform is already open");
        self.scale = config.scale_factor;
        self.open = true;
        Ok(config.size())
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn create_surface(&mut self, size: Size, scale: f32) -> anyhow::Result<RasterSurface> {
        RasterSurface::new(size, scale)
    }

    fn bind_painter(&mut self, surface: &RasterSurface, env: &PaintEnv) -> Box<dyn Painter> {
        Box::new(RasterPainter::new(surface, env.clone()))
    }

    fn present(&mut self, surface: &RasterSurface) -> anyhow::Result<()> {
        anyhow::ensure!(self.open, "present on a closed offscreen platform");
        self.presented += 1;
        self.last_presented = Some(surface.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.last_presented = None;
    }

    fn set_cursor(&mut self, cursor: CursorKind) {
        self.cursor = cursor;
    }

    fn clipboard_get(&mut self) -> Result<String, FrameError> {
        Ok(self.clipboard.clone().unwrap_or_default())
    }

    fn clipboard_set(&mut self, text: &str) -> Result<(), FrameError> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }
}
