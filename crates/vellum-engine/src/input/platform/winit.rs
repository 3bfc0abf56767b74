use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::coords::Point;
use crate::input::{
    InputEvent, InputState, Key, KeyState, Modifiers, MouseButton, MouseButtonState,
    MouseWheelDelta, PointerButtonEvent,
};

/// Translates a winit `WindowEvent` into engine `InputEvent`s.
///
/// `scale_factor` converts physical positions to logical pixels. A key press
/// that produces text yields both a `Key` and a `Text` event, in that order.
/// Events not represented by the input subsystem yield nothing.
pub fn translate_window_event(
    scale_factor: f64,
    state: &InputState,
    event: &WindowEvent,
) -> Vec<InputEvent> {
    let mut out = Vec::with_capacity(1);

    match event {
        WindowEvent::ModifiersChanged(m) => {
            out.push(InputEvent::ModifiersChanged(map_modifiers(m.state())));
        }

        WindowEvent::Focused(f) => out.push(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => out.push(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            out.push(InputEvent::PointerMoved(to_logical(scale_factor, *position)));
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            let st = match st {
                ElementState::Pressed => MouseButtonState::Pressed,
                ElementState::Released => MouseButtonState::Released,
            };

            // winit 0.30 has no cursor query; use the tracked pointer position.
            out.push(InputEvent::PointerButton(PointerButtonEvent {
                button: map_mouse_button(*button),
                state: st,
                pos: state.pointer_or_origin(),
                modifiers: state.modifiers,
            }));
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let delta = match delta {
                MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                MouseScrollDelta::PixelDelta(p) => {
                    let p = to_logical(scale_factor, *p);
                    MouseWheelDelta::Pixel { x: p.x, y: p.y }
                }
            };
            out.push(InputEvent::MouseWheel { delta, modifiers: state.modifiers });
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let st = match (event.state, event.repeat) {
                (ElementState::Pressed, false) => KeyState::Pressed,
                (ElementState::Pressed, true) => KeyState::Repeated,
                (ElementState::Released, _) => KeyState::Released,
            };

            let (key, code) = map_key(event.physical_key);
            out.push(InputEvent::Key { key, state: st, modifiers: state.modifiers, code });

            if event.state == ElementState::Pressed {
                if let Some(text) = event.text.as_ref() {
                    let printable: String = text.chars().filter(|c| !c.is_control()).collect();
                    if !printable.is_empty() {
                        out.push(InputEvent::Text(printable));
                    }
                }
            }
        }

        WindowEvent::Ime(winit::event::Ime::Commit(text)) if !text.is_empty() => {
            out.push(InputEvent::Text(text.clone()));
        }

        WindowEvent::Ime(winit::event::Ime::Preedit(text, cursor)) => {
            out.push(preedit(text, *cursor));
        }

        WindowEvent::Ime(winit::event::Ime::Disabled) => {
            out.push(InputEvent::ImePreedit { text: String::new(), cursor: 0 });
        }

        _ => {}
    }

    out
}

/// winit reports the preedit caret as a byte range; a hidden caret sits at
/// the end of the text.
fn preedit(text: &str, cursor: Option<(usize, usize)>) -> InputEvent {
    let cursor = match cursor {
        Some((start, _)) => text.get(..start).map_or(0, |s| s.chars().count()),
        None => text.chars().count(),
    };
    InputEvent::ImePreedit { text: text.to_string(), cursor }
}

fn to_logical(scale_factor: f64, pos: PhysicalPosition<f64>) -> Point {
    let logical = pos.to_logical::<f64>(scale_factor);
    Point::new(logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> (Key, u32) {
    match pk {
        PhysicalKey::Code(code) => (map_key_code(code), code as u32),
        // NativeKeyCode has no stable numeric form in winit 0.30.
        PhysicalKey::Unidentified(_) => (Key::Unknown(0), 0),
    }
}

fn map_key_code(code: KeyCode) -> Key {
    const LETTERS: [Key; 26] = [
        Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
        Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
        Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    ];
    const DIGITS: [Key; 10] = [
        Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
        Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
    ];
    const FUNCTION: [Key; 12] = [
        Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6,
        Key::F7, Key::F8, Key::F9, Key::F10, Key::F11, Key::F12,
    ];

    let letter = |c: KeyCode| -> Option<usize> {
        use KeyCode::*;
        [
            KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
            KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
        ]
        .iter()
        .position(|k| *k == c)
    };
    let digit = |c: KeyCode| -> Option<usize> {
        use KeyCode::*;
        [Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9]
            .iter()
            .position(|k| *k == c)
    };
    let function = |c: KeyCode| -> Option<usize> {
        use KeyCode::*;
        [F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12].iter().position(|k| *k == c)
    };

    if let Some(i) = letter(code) {
        return LETTERS[i];
    }
    if let Some(i) = digit(code) {
        return DIGITS[i];
    }
    if let Some(i) = function(code) {
        return FUNCTION[i];
    }

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        KeyCode::Minus => Key::Minus,
        KeyCode::Equal => Key::Equal,
        KeyCode::Comma => Key::Comma,
        KeyCode::Period => Key::Period,
        KeyCode::Slash => Key::Slash,
        KeyCode::Semicolon => Key::Semicolon,
        KeyCode::Quote => Key::Quote,
        KeyCode::BracketLeft => Key::BracketLeft,
        KeyCode::BracketRight => Key::BracketRight,
        KeyCode::Backslash => Key::Backslash,
        KeyCode::Backquote => Key::Backquote,

        other => Key::Unknown(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_digits_and_function_keys_map() {
        assert_eq!(map_key_code(KeyCode::KeyA), Key::A);
        assert_eq!(map_key_code(KeyCode::KeyZ), Key::Z);
        assert_eq!(map_key_code(KeyCode::Digit7), Key::Digit7);
        assert_eq!(map_key_code(KeyCode::F12), Key::F12);
        assert_eq!(map_key_code(KeyCode::NumpadEnter), Key::Enter);
    }

    #[test]
    fn unmapped_keys_keep_their_code() {
        let code = KeyCode::CapsLock;
        assert_eq!(map_key_code(code), Key::Unknown(code as u32));
    }

    #[test]
    fn preedit_cursor_counts_chars() {
        let ev = |text: &str, cursor| match preedit(text, cursor) {
            InputEvent::ImePreedit { text, cursor } => (text, cursor),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(ev("にほん", Some((6, 6))), ("にほん".to_string(), 2));
        assert_eq!(ev("abc", None), ("abc".to_string(), 3));
        assert_eq!(ev("にほん", Some((1, 1))).1, 0);
    }

    #[test]
    fn ime_events_translate() {
        let state = InputState::default();
        let commit = WindowEvent::Ime(winit::event::Ime::Commit("日本".into()));
        assert_eq!(translate_window_event(1.0, &state, &commit), vec![InputEvent::Text("日本".into())]);

        let off = WindowEvent::Ime(winit::event::Ime::Disabled);
        assert_eq!(
            translate_window_event(1.0, &state, &off),
            vec![InputEvent::ImePreedit { text: String::new(), cursor: 0 }]
        );
    }

    #[test]
    fn physical_positions_become_logical() {
        let p = to_logical(2.0, PhysicalPosition::new(20.0, 8.0));
        assert_eq!(p, Point::new(10.0, 4.0));
    }
}
