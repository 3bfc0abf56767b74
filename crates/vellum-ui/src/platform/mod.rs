//! What a frame needs from the host: a place to show pixels, a surface to
//! paint into, and the odds and ends around a window.
//!
//! Two headless platforms ship with the crate. [`OffscreenPlatform`] renders
//! into a CPU pixmap and [`RecordingPlatform`] records display lists; both are
//! what the frame tests run on. [`desktop`] puts the raster surface in a winit
//! window.

pub mod desktop;
mod offscreen;
mod recording;

pub use offscreen::OffscreenPlatform;
pub use recording::RecordingPlatform;

use vellum_engine::coords::{Rect, Size};

use crate::event::CursorKind;
use crate::frame::{FrameConfig, FrameError};
use crate::painter::{PaintEnv, Painter};

pub trait Platform {
    /// Backing surface painters are bound to.
    type Surface;

    fn name(&self) -> &'static str;

    /// Creates the window or canvas. Returns its logical size.
    fn open(&mut self, config: &FrameConfig) -> anyhow::Result<Size>;

    /// Physical pixels per logical pixel.
    fn scale_factor(&self) -> f32;

    fn create_surface(&mut self, size: Size, scale: f32) -> anyhow::Result<Self::Surface>;

    /// A fresh painter drawing into `surface`.
    fn bind_painter(&mut self, surface: &Self::Surface, env: &PaintEnv) -> Box<dyn Painter>;

    /// Shows whatever the last flush committed to `surface`.
    fn present(&mut self, surface: &Self::Surface) -> anyhow::Result<()>;

    fn close(&mut self);

    fn set_cursor(&mut self, cursor: CursorKind) {
        let _ = cursor;
    }

    /// Where the IME candidate window should appear, in logical window
    /// coordinates.
    fn set_ime_cursor_rect(&mut self, rect: Rect) {
        let _ = rect;
    }

    fn clipboard_get(&mut self) -> Result<String, FrameError> {
        Err(FrameError::Unsupported("clipboard"))
    }

    fn clipboard_set(&mut self, text: &str) -> Result<(), FrameError> {
        let _ = text;
        Err(FrameError::Unsupported("clipboard"))
    }
}
