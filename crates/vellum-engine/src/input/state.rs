use std::collections::HashSet;

use crate::coords::Point;

use super::types::{InputEvent, KeyState, Modifiers, MouseButton, MouseButtonState};

/// Current input state for a window.
///
/// Tracks what the platform does not repeat on every event: modifier state,
/// focus, pointer position and held buttons. The winit translator reads it to
/// fill in button and wheel positions.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Pointer position in logical pixels; `None` while outside the window.
    pub pointer_pos: Option<Point>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Folds `ev` into the tracked state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoid stuck buttons when focus changes mid-press.
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(pos) => self.pointer_pos = Some(*pos),
            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::PointerButton(b) => {
                self.pointer_pos = Some(b.pos);
                self.modifiers = b.modifiers;
                match b.state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(b.button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(&b.button);
                    }
                }
            }

            InputEvent::Key { modifiers, state, .. } => {
                if *state != KeyState::Repeated {
                    self.modifiers = *modifiers;
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => self.modifiers = *modifiers,
            InputEvent::Text(_) | InputEvent::ImePreedit { .. } => {}
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    /// Pointer position, or the origin when unknown.
    pub fn pointer_or_origin(&self) -> Point {
        self.pointer_pos.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerButtonEvent;

    #[test]
    fn tracks_pointer_and_buttons() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::PointerMoved(Point::new(3.0, 4.0)));
        assert_eq!(s.pointer_or_origin(), Point::new(3.0, 4.0));

        s.apply_event(&InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            pos: Point::new(5.0, 6.0),
            modifiers: Modifiers::default(),
        }));
        assert!(s.button_down(MouseButton::Left));
        assert_eq!(s.pointer_pos, Some(Point::new(5.0, 6.0)));

        s.apply_event(&InputEvent::PointerLeft);
        assert_eq!(s.pointer_pos, None);
    }

    #[test]
    fn focus_loss_releases_buttons() {
        let mut s = InputState::default();
        s.buttons_down.insert(MouseButton::Right);
        s.apply_event(&InputEvent::Focused(false));
        assert!(!s.button_down(MouseButton::Right));
    }
}
