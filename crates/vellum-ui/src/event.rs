//! Typed events delivered by the router, and redraw requests.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use vellum_engine::coords::Point;
use vellum_engine::input::{Key, KeyState, Modifiers};

use crate::widget::Widget;

/// Line-based wheel deltas are converted to pixels with this factor. The sign
/// flip turns "wheel moved up" into "content scrolls towards the top".
pub const WHEEL_LINE_PIXELS: f32 = -20.0;

/// Left-button press/release or pointer move, in logical surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub pos: Point,
}

impl MouseEvent {
    /// Same event seen from a coordinate space whose origin is `origin`.
    pub fn relative_to(self, origin: Point) -> Self {
        Self { pos: self.pos - origin }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub pos: Point,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// One committed text character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharEvent {
    pub character: char,
}

/// IME composition text not committed yet. An empty `text` means the
/// composition ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImePreeditEvent {
    pub text: String,
    /// Caret position within `text`, in chars.
    pub cursor_pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

impl From<KeyState> for KeyAction {
    fn from(state: KeyState) -> Self {
        match state {
            KeyState::Pressed => Self::Press,
            KeyState::Repeated => Self::Repeat,
            KeyState::Released => Self::Release,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub code: Key,
    pub scancode: u32,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Press or auto-repeat.
    pub fn is_down(&self) -> bool {
        matches!(self.action, KeyAction::Press | KeyAction::Repeat)
    }
}

/// Mouse cursor shapes a widget may request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorKind {
    #[default]
    Arrow,
    Text,
    Pointer,
    Crosshair,
    ResizeHorizontal,
    ResizeVertical,
}

/// What a redraw request repaints.
#[derive(Clone)]
pub enum RedrawTarget {
    /// The whole surface, painted by the subscribed redraw handler with no
    /// translation or clip.
    Root,
    /// One widget, painted in its own coordinate space and clipped to its
    /// bounds. Held weakly: the tree owns its widgets.
    Widget(Weak<RefCell<dyn Widget>>),
}

impl RedrawTarget {
    pub fn widget<W: Widget + 'static>(widget: &Rc<RefCell<W>>) -> Self {
        let erased: Rc<RefCell<dyn Widget>> = widget.clone();
        Self::Widget(Rc::downgrade(&erased))
    }

    /// Whether both targets name the same thing.
    pub fn same_as(&self, other: &RedrawTarget) -> bool {
        match (self, other) {
            (Self::Root, Self::Root) => true,
            (Self::Widget(a), Self::Widget(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for RedrawTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Widget(w) => write!(f, "Widget({:p})", w.as_ptr()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedrawRequest {
    pub target: RedrawTarget,
    pub completely: bool,
}

impl RedrawRequest {
    pub fn root(completely: bool) -> Self {
        Self { target: RedrawTarget::Root, completely }
    }

    pub fn widget<W: Widget + 'static>(widget: &Rc<RefCell<W>>, completely: bool) -> Self {
        Self { target: RedrawTarget::widget(widget), completely }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_engine::coords::Size;

    use crate::painter::Painter;

    struct Dot;

    impl Widget for Dot {
        fn pos(&self) -> Point { Point::zero() }
        fn size(&self) -> Size { Size::new(1.0, 1.0) }
        fn redraw(&mut self, _: &mut dyn Painter, _: bool) -> anyhow::Result<()> { Ok(()) }
    }

    #[test]
    fn widget_targets_compare_by_identity() {
        let a = Rc::new(RefCell::new(Dot));
        let b = Rc::new(RefCell::new(Dot));
        assert!(RedrawTarget::widget(&a).same_as(&RedrawTarget::widget(&a)));
        assert!(!RedrawTarget::widget(&a).same_as(&RedrawTarget::widget(&b)));
        assert!(!RedrawTarget::widget(&a).same_as(&RedrawTarget::Root));
        assert!(RedrawTarget::Root.same_as(&RedrawTarget::Root));
    }

    #[test]
    fn key_actions_follow_engine_states() {
        assert_eq!(KeyAction::from(KeyState::Repeated), KeyAction::Repeat);
        let ev = KeyEvent {
            action: KeyAction::Repeat,
            code: Key::A,
            scancode: 0,
            modifiers: Modifiers::default(),
        };
        assert!(ev.is_down());
    }

    #[test]
    fn mouse_event_relative_to_origin() {
        let ev = MouseEvent { pos: Point::new(15.0, 20.0) };
        assert_eq!(ev.relative_to(Point::new(10.0, 5.0)).pos, Point::new(5.0, 15.0));
    }
}
