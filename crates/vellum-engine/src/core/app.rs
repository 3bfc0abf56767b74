use anyhow::Result;

use crate::coords::Viewport;
use crate::input::InputEvent;

use super::ctx::WindowCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Every callback runs on the event-loop thread. Nothing is redrawn unless
/// the app asks for it with [`WindowCtx::request_redraw`].
pub trait App {
    /// Called once the window and GPU exist. An error aborts the runtime.
    fn on_start(&mut self, ctx: &mut WindowCtx<'_, '_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called for each translated input event, in arrival order.
    fn on_input(&mut self, ctx: &mut WindowCtx<'_, '_>, event: &InputEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called after the swapchain has been reconfigured for a new size or
    /// scale factor.
    fn on_resize(&mut self, ctx: &mut WindowCtx<'_, '_>, viewport: Viewport) -> AppControl {
        let _ = (ctx, viewport);
        AppControl::Continue
    }

    /// Called when another thread woke the loop through a
    /// [`RuntimeWaker`](crate::window::RuntimeWaker).
    fn on_wake(&mut self, ctx: &mut WindowCtx<'_, '_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called when the platform asks for the window contents.
    fn on_frame(&mut self, ctx: &mut WindowCtx<'_, '_>) -> AppControl;

    /// Called once before the window is destroyed.
    fn on_close(&mut self) {}
}
