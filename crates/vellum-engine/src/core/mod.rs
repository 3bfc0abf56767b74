//! Core engine-facing contracts.
//!
//! Defines the stable interface between the runtime (platform loop) and the
//! layers above it, and the per-callback context handed to them.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::WindowCtx;
