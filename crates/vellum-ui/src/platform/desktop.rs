//! Windowed platform: raster surface shown through the engine runtime.
//!
//! ```rust,ignore
//! Application::new()
//!     .title("Gallery")
//!     .font("DejaVu Sans", include_bytes!("DejaVuSans.ttf").to_vec())
//!     .run(|frame| {
//!         frame.router_mut()
//!             .on_mouse_down(|e| log::info!("down at {:?}", e.pos))
//!             .on_mouse_up(|_| {})
//!             .on_cursor_pos(|_| {})
//!             .on_input_char(|_| {})
//!             .on_input_key(|_| {})
//!             .on_redraw(|painter, _| {
//!                 painter.clear_all(Color::WHITE);
//!                 Ok(())
//!             });
//!         Ok(())
//!     })
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use winit::dpi::LogicalSize;
use winit::window::CursorIcon;

use vellum_engine::core::{App as EngineApp, AppControl, WindowCtx};
use vellum_engine::coords::{Rect, Size, Viewport};
use vellum_engine::device::GpuInit;
use vellum_engine::input::InputEvent;
use vellum_engine::logging::{LoggingConfig, init_logging};
use vellum_engine::paint::Color;
use vellum_engine::render::{PixelPresenter, PixelSource};
use vellum_engine::text::FontSystem;
use vellum_engine::window::{Runtime, RuntimeConfig};

use crate::backend::raster::{RasterPainter, RasterSurface};
use crate::event::CursorKind;
use crate::frame::{Frame, FrameConfig, FrameError};
use crate::router::InputKind;
use crate::painter::{PaintEnv, Painter};

use super::Platform;

// ── DesktopPlatform ───────────────────────────────────────────────────────

/// Last presented pixels and requests for the window, applied by the
/// runtime callback that follows.
#[derive(Default)]
struct Screen {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
    cursor: Option<CursorKind>,
    ime_area: Option<Rect>,
}

/// Platform backed by a winit window that the engine runtime already opened.
pub struct DesktopPlatform {
    size: Size,
    scale: f32,
    screen: Rc<RefCell<Screen>>,
    clipboard: Option<arboard::Clipboard>,
}

impl DesktopPlatform {
    fn new(viewport: Viewport, screen: Rc<RefCell<Screen>>) -> Self {
        Self {
            size: Size::new(viewport.width, viewport.height),
            scale: viewport.scale_factor,
            screen,
            clipboard: None,
        }
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, FrameError> {
        if self.clipboard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .context("failed to open the system clipboard")
                .map_err(FrameError::Platform)?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or(FrameError::Unsupported("clipboard"))
    }
}

impl Platform for DesktopPlatform {
    type Surface = RasterSurface;

    fn name(&self) -> &'static str {
        "desktop"
    }

    fn open(&mut self, _config: &FrameConfig) -> anyhow::Result<Size> {
        anyhow::ensure!(!self.size.is_empty(), "window has no area");
        Ok(self.size)
    }

    fn scale_factor(&self) -> f32 {
        self.scale
    }

    fn create_surface(&mut self, size: Size, scale: f32) -> anyhow::Result<RasterSurface> {
        let surface = RasterSurface::new(size, scale)?;
        self.size = size;
        self.scale = surface.scale();
        Ok(surface)
    }

    fn bind_painter(&mut self, surface: &RasterSurface, env: &PaintEnv) -> Box<dyn Painter> {
        Box::new(RasterPainter::new(surface, env.clone()))
    }

    fn present(&mut self, surface: &RasterSurface) -> anyhow::Result<()> {
        let pixmap = surface.pixmap();
        let mut screen = self.screen.borrow_mut();
        screen.width = pixmap.width();
        screen.height = pixmap.height();
        screen.pixels.clear();
        screen.pixels.extend_from_slice(pixmap.data());
        screen.dirty = true;
        Ok(())
    }

    fn close(&mut self) {
        *self.screen.borrow_mut() = Screen::default();
        self.clipboard = None;
    }

    fn set_cursor(&mut self, cursor: CursorKind) {
        self.screen.borrow_mut().cursor = Some(cursor);
    }

    fn set_ime_cursor_rect(&mut self, rect: Rect) {
        self.screen.borrow_mut().ime_area = Some(rect);
    }

    fn clipboard_get(&mut self) -> Result<String, FrameError> {
        self.clipboard()?
            .get_text()
            .context("failed to read clipboard text")
            .map_err(FrameError::Platform)
    }

    fn clipboard_set(&mut self, text: &str) -> Result<(), FrameError> {
        self.clipboard()?
            .set_text(text)
            .context("failed to write clipboard text")
            .map_err(FrameError::Platform)
    }
}

pub fn cursor_icon(kind: CursorKind) -> CursorIcon {
    match kind {
        CursorKind::Arrow => CursorIcon::Default,
        CursorKind::Text => CursorIcon::Text,
        CursorKind::Pointer => CursorIcon::Pointer,
        CursorKind::Crosshair => CursorIcon::Crosshair,
        CursorKind::ResizeHorizontal => CursorIcon::EwResize,
        CursorKind::ResizeVertical => CursorIcon::NsResize,
    }
}

// ── Application ───────────────────────────────────────────────────────────

type Setup = Box<dyn FnOnce(&mut Frame<DesktopPlatform>) -> anyhow::Result<()>>;

/// Opens one window and runs a [`Frame`] in it.
///
/// Fonts are registered by family name before the frame starts; the first
/// one that loads becomes the fallback for unknown families.
pub struct Application {
    config: FrameConfig,
    fonts: Vec<(String, Vec<u8>)>,
    logging: Option<LoggingConfig>,
}

impl Application {
    pub fn new() -> Self {
        Self { config: FrameConfig::default(), fonts: Vec::new(), logging: None }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.config.background = color;
        self
    }

    pub fn font(mut self, family: impl Into<String>, data: Vec<u8>) -> Self {
        self.fonts.push((family.into(), data));
        self
    }

    /// Installs `env_logger` with `config` before the window opens.
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Runs until the window closes.
    ///
    /// `setup` is called once the window exists and before the frame starts;
    /// it must subscribe every input handler and the redraw handler.
    pub fn run<F>(self, setup: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Frame<DesktopPlatform>) -> anyhow::Result<()> + 'static,
    {
        if let Some(cfg) = self.logging.clone() {
            init_logging(cfg);
        }

        let mut fonts = FontSystem::new();
        for (family, bytes) in &self.fonts {
            if let Err(e) = fonts.register_family(family, bytes) {
                log::warn!("failed to load font '{family}': {e}");
            }
        }
        if fonts.is_empty() {
            log::warn!("no fonts registered; text will not be drawn");
        }

        let runtime = RuntimeConfig {
            title: self.config.title.clone(),
            initial_size: LogicalSize::new(self.config.width as f64, self.config.height as f64),
        };
        let app = DesktopApp {
            config: self.config,
            fonts: Rc::new(fonts),
            setup: Some(Box::new(setup)),
            frame: None,
            screen: Rc::new(RefCell::new(Screen::default())),
            presenter: PixelPresenter::new(),
        };
        Runtime::run(runtime, GpuInit::default(), app)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

// ── DesktopApp ────────────────────────────────────────────────────────────

/// Engine-facing side of [`Application`].
struct DesktopApp {
    config: FrameConfig,
    fonts: Rc<FontSystem>,
    setup: Option<Setup>,
    frame: Option<Frame<DesktopPlatform>>,
    screen: Rc<RefCell<Screen>>,
    presenter: PixelPresenter,
}

impl DesktopApp {
    /// Applies what the frame asked of the window during the last callback.
    fn sync(&mut self, ctx: &mut WindowCtx<'_, '_>) {
        let mut screen = self.screen.borrow_mut();
        if let Some(cursor) = screen.cursor.take() {
            ctx.set_cursor(cursor_icon(cursor));
        }
        if let Some(area) = screen.ime_area.take() {
            ctx.set_ime_cursor_area(area);
        }
        if screen.dirty {
            ctx.request_redraw();
        }
    }

    fn settle<T>(&mut self, ctx: &mut WindowCtx<'_, '_>, result: Result<T, FrameError>) -> AppControl {
        self.sync(ctx);
        match result {
            Ok(_) => AppControl::Continue,
            Err(err) if err.is_recoverable() => {
                log::warn!("frame: {err:#}");
                AppControl::Continue
            }
            Err(err) => {
                log::error!("frame: {err:#}");
                AppControl::Exit
            }
        }
    }
}

impl EngineApp for DesktopApp {
    fn on_start(&mut self, ctx: &mut WindowCtx<'_, '_>) -> anyhow::Result<()> {
        let platform = DesktopPlatform::new(ctx.viewport(), self.screen.clone());
        let mut frame = Frame::new(platform, self.config.clone(), self.fonts.clone());

        let waker = ctx.runtime.waker();
        frame.set_waker(Some(Arc::new(move || waker.wake())));

        if let Some(setup) = self.setup.take() {
            setup(&mut frame).context("application setup failed")?;
        }
        if frame.router().is_subscribed(InputKind::ImePreedit) {
            ctx.set_ime_allowed(true);
        }
        frame.start().context("failed to start frame")?;
        frame.process_pending().context("initial redraw failed")?;

        self.frame = Some(frame);
        self.sync(ctx);
        Ok(())
    }

    fn on_input(&mut self, ctx: &mut WindowCtx<'_, '_>, event: &InputEvent) -> AppControl {
        let Some(frame) = self.frame.as_mut() else { return AppControl::Continue };
        let result = frame.dispatch_input(event).and_then(|_| frame.process_pending());
        self.settle(ctx, result)
    }

    fn on_resize(&mut self, ctx: &mut WindowCtx<'_, '_>, viewport: Viewport) -> AppControl {
        let Some(frame) = self.frame.as_mut() else { return AppControl::Continue };
        let size = Size::new(viewport.width, viewport.height);
        let result = frame.resize(size, viewport.scale_factor);
        self.settle(ctx, result)
    }

    fn on_wake(&mut self, ctx: &mut WindowCtx<'_, '_>) -> AppControl {
        let Some(frame) = self.frame.as_mut() else { return AppControl::Continue };
        let result = frame.process_pending();
        self.settle(ctx, result)
    }

    fn on_frame(&mut self, ctx: &mut WindowCtx<'_, '_>) -> AppControl {
        let mut screen = self.screen.borrow_mut();
        screen.dirty = false;
        if screen.pixels.is_empty() {
            return AppControl::Continue;
        }
        let source = PixelSource { width: screen.width, height: screen.height, pixels: &screen.pixels };
        ctx.present_pixels(&mut self.presenter, source, self.config.background)
    }

    fn on_close(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            if let Err(err) = frame.destroy() {
                log::warn!("frame: {err:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_kinds_map_to_window_icons() {
        assert_eq!(cursor_icon(CursorKind::Arrow), CursorIcon::Default);
        assert_eq!(cursor_icon(CursorKind::ResizeVertical), CursorIcon::NsResize);
    }

    #[test]
    fn present_copies_the_committed_pixels() {
        let screen = Rc::new(RefCell::new(Screen::default()));
        let mut platform = DesktopPlatform::new(Viewport::new(4.0, 2.0, 1.0), screen.clone());
        let surface = platform.create_surface(Size::new(4.0, 2.0), 1.0).unwrap();

        platform.present(&surface).unwrap();
        let s = screen.borrow();
        assert!(s.dirty);
        assert_eq!((s.width, s.height), (4, 2));
        assert_eq!(s.pixels.len(), 4 * 2 * 4);
    }

    #[test]
    fn cursor_requests_wait_for_the_next_callback() {
        let screen = Rc::new(RefCell::new(Screen::default()));
        let mut platform = DesktopPlatform::new(Viewport::new(4.0, 2.0, 1.0), screen.clone());
        platform.set_cursor(CursorKind::Pointer);
        assert_eq!(screen.borrow().cursor, Some(CursorKind::Pointer));
        platform.close();
        assert_eq!(screen.borrow().cursor, None);
    }

    #[test]
    fn ime_area_is_held_until_close() {
        let screen = Rc::new(RefCell::new(Screen::default()));
        let mut platform = DesktopPlatform::new(Viewport::new(4.0, 2.0, 1.0), screen.clone());
        platform.set_ime_cursor_rect(Rect::new(1.0, 2.0, 2.0, 14.0));
        assert_eq!(screen.borrow().ime_area, Some(Rect::new(1.0, 2.0, 2.0, 14.0)));
        platform.close();
        assert_eq!(screen.borrow().ime_area, None);
    }

    #[test]
    fn failed_allocation_keeps_the_previous_geometry() {
        let screen = Rc::new(RefCell::new(Screen::default()));
        let mut platform = DesktopPlatform::new(Viewport::new(4.0, 2.0, 1.0), screen);
        assert!(platform.create_surface(Size::new(1.0e9, 1.0e9), 2.0).is_err());
        assert_eq!(platform.scale_factor(), 1.0);
        assert!(platform.create_surface(Size::new(8.0, 8.0), 2.0).is_ok());
        assert_eq!(platform.scale_factor(), 2.0);
    }
}
