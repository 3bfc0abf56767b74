use winit::window::{CursorIcon, Window};

use crate::coords::{Rect, Size, Viewport};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::InputState;
use crate::paint::Color;
use crate::render::{PixelPresenter, PixelSource, RenderCtx, RenderTarget};
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-callback context passed to `core::App`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct WindowCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> WindowCtx<'a, 'w> {
    /// Logical window size.
    pub fn logical_size(&self) -> Size {
        let logical: winit::dpi::LogicalSize<f64> =
            self.window.inner_size().to_logical(self.window.scale_factor());
        Size::new(logical.width as f32, logical.height as f32)
    }

    pub fn scale_factor(&self) -> f32 {
        self.window.scale_factor() as f32
    }

    pub fn viewport(&self) -> Viewport {
        let size = self.logical_size();
        Viewport::new(size.width, size.height, self.scale_factor())
    }

    pub fn set_cursor(&self, cursor: CursorIcon) {
        self.window.set_cursor(cursor);
    }

    /// Enables IME composition events for the window.
    pub fn set_ime_allowed(&self, allowed: bool) {
        self.window.set_ime_allowed(allowed);
    }

    /// Places the IME candidate window next to `area` (logical coordinates).
    pub fn set_ime_cursor_area(&self, area: Rect) {
        let pos = winit::dpi::LogicalPosition::new(area.origin.x as f64, area.origin.y as f64);
        let size = winit::dpi::LogicalSize::new(area.size.width as f64, area.size.height as f64);
        self.window.set_ime_cursor_area(pos, size);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Acquires a swapchain frame, clears it with `clear`, composites `source`
    /// through `presenter` and presents.
    pub fn present_pixels(
        &mut self,
        presenter: &mut PixelPresenter,
        source: PixelSource<'_>,
        clear: Color,
    ) -> AppControl {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured => {
                        self.window.request_redraw();
                        AppControl::Continue
                    }
                    SurfaceErrorAction::SkipFrame => AppControl::Continue,
                };
            }
        };

        // The target borrows the frame's encoder until the pass is recorded.
        {
            let rctx = RenderCtx::from_gpu(self.gpu);
            let mut target = RenderTarget::for_frame(&mut frame);
            presenter.present(&rctx, &mut target, source, clear);
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}
