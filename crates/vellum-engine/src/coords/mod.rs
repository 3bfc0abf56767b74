//! Coordinate and geometry types shared by the engine and the UI bridge.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Backends convert to physical pixels by multiplying with the surface
//! scale factor.

mod circle;
mod point;
mod rect;
mod size;
mod viewport;

pub use circle::Circle;
pub use point::Point;
pub use rect::Rect;
pub use size::Size;
pub use viewport::Viewport;
