//! GPU presentation.
//!
//! The UI bridge rasterizes on the CPU; this module only moves finished
//! pixels onto the swapchain.

mod ctx;
mod presenter;

pub use ctx::{RenderCtx, RenderTarget};
pub use presenter::{PixelPresenter, PixelSource};
