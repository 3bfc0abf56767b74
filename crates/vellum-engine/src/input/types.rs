use std::fmt;

use crate::coords::Point;

/// Keyboard key identifier, keyed by physical position.
///
/// Keys without a dedicated variant carry their platform code in
/// `Key::Unknown(u32)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    Minus,
    Equal,
    Comma,
    Period,
    Slash,
    Semicolon,
    Quote,
    BracketLeft,
    BracketRight,
    Backslash,
    Backquote,

    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    Unknown(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Key transition. Auto-repeat is reported as its own state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Repeated,
    Released,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const SHIFT_BIT: u8 = 0x1;
    pub const CTRL_BIT: u8 = 0x2;
    pub const ALT_BIT: u8 = 0x4;
    pub const META_BIT: u8 = 0x8;

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Packed bit form (shift=0x1, ctrl=0x2, alt=0x4, meta=0x8).
    pub fn bits(&self) -> u8 {
        (self.shift as u8 * Self::SHIFT_BIT)
            | (self.ctrl as u8 * Self::CTRL_BIT)
            | (self.alt as u8 * Self::ALT_BIT)
            | (self.meta as u8 * Self::META_BIT)
    }
}

/// Mouse wheel delta.
///
/// `Line` is notch-based input; `Pixel` is high precision (touchpads), already
/// in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

/// Pointer button transition at a logical position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: MouseButtonState,
    pub pos: Point,
    pub modifiers: Modifiers,
}

/// Platform-agnostic input events emitted by the runtime.
///
/// Positions are logical pixels relative to the window's content area.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ModifiersChanged(Modifiers),

    Key {
        key: Key,
        state: KeyState,
        modifiers: Modifiers,
        /// Stable platform code when available (scancode).
        code: u32,
    },

    PointerMoved(Point),
    PointerButton(PointerButtonEvent),

    MouseWheel {
        delta: MouseWheelDelta,
        modifiers: Modifiers,
    },

    /// Committed text (not IME composition).
    Text(String),

    /// IME composition in progress. An empty `text` ends the composition.
    ImePreedit {
        text: String,
        /// Caret position within `text`, in chars.
        cursor: usize,
    },

    PointerLeft,
    Focused(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_bits_pack() {
        let m = Modifiers { shift: true, alt: true, ..Modifiers::default() };
        assert_eq!(m.bits(), 0x5);
        assert!(m.any());
        assert_eq!(Modifiers::default().bits(), 0);
    }
}
