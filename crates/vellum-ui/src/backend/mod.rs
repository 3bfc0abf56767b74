//! Painter backends.
//!
//! - `raster`: CPU pixels, presented on the desktop through the engine's
//!   pixel presenter or snapshotted to PNG.
//! - `recording`: display lists and an op log, for headless frames.

pub mod raster;
pub mod recording;
