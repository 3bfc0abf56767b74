//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, and wires them to the GPU layer.

mod runtime;
mod waker;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
pub use waker::{RuntimeWaker, Wake};
pub use winit::window::CursorIcon;
