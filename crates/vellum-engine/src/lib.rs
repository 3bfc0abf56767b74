//! Vellum engine crate.
//!
//! Owns the platform + GPU runtime pieces used by the UI bridge: geometry,
//! color, fonts, platform-agnostic input, the winit window loop and the wgpu
//! presenter that puts CPU-rendered pixels on screen.

pub mod core;
pub mod device;
pub mod input;
pub mod render;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod text;
