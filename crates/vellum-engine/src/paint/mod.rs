//! Paint primitives.

mod color;

pub use color::{Color, ColorParseError};
