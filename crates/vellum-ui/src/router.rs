//! Input subscriptions and redraw delivery.
//!
//! The router owns the handlers the widget tree registers with a frame. Raw
//! [`InputEvent`]s go in through [`EventRouter::dispatch`] and come out as the
//! typed events of [`crate::event`]; redraw requests are resolved to a scope
//! (origin + clip) and handed to the right painter entry point.

use std::fmt;

use vellum_engine::coords::{Point, Rect, Size};
use vellum_engine::input::{InputEvent, MouseButton, MouseButtonState, MouseWheelDelta};

use crate::event::{
    CharEvent, ImePreeditEvent, KeyEvent, MouseEvent, RedrawTarget, WHEEL_LINE_PIXELS, WheelEvent,
};
use crate::frame::FrameError;
use crate::painter::Painter;
use crate::widget::WidgetRef;

pub type MouseHandler = Box<dyn FnMut(MouseEvent)>;
pub type WheelHandler = Box<dyn FnMut(WheelEvent)>;
pub type CharHandler = Box<dyn FnMut(CharEvent)>;
pub type KeyHandler = Box<dyn FnMut(KeyEvent)>;
pub type ImeHandler = Box<dyn FnMut(ImePreeditEvent)>;
pub type RedrawHandler = Box<dyn FnMut(&mut dyn Painter, bool) -> anyhow::Result<()>>;

/// Subscriptions a frame knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    MouseDown,
    MouseUp,
    CursorPos,
    InputChar,
    InputKey,
    MouseWheel,
    ImePreedit,
    Redraw,
}

impl InputKind {
    /// Subscriptions that must all exist before a frame starts.
    pub const REQUIRED: [InputKind; 6] = [
        InputKind::MouseDown,
        InputKind::MouseUp,
        InputKind::CursorPos,
        InputKind::InputChar,
        InputKind::InputKey,
        InputKind::Redraw,
    ];

    pub fn is_required(self) -> bool {
        !matches!(self, InputKind::MouseWheel | InputKind::ImePreedit)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputKind::MouseDown => "mouse-down",
            InputKind::MouseUp => "mouse-up",
            InputKind::CursorPos => "cursor-pos",
            InputKind::InputChar => "input-char",
            InputKind::InputKey => "input-key",
            InputKind::MouseWheel => "mouse-wheel",
            InputKind::ImePreedit => "ime-preedit",
            InputKind::Redraw => "redraw",
        };
        f.write_str(name)
    }
}

/// Where a redraw lands on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedrawScope {
    pub origin: Point,
    /// Clip in the target's own coordinates. `None` for the root and for
    /// targets without a finite size.
    pub clip: Option<Rect>,
}

impl RedrawScope {
    pub const ROOT: RedrawScope = RedrawScope { origin: Point { x: 0.0, y: 0.0 }, clip: None };

    fn for_bounds(origin: Point, size: Size) -> Self {
        let bounded = size.width.is_finite() && size.height.is_finite();
        Self { origin, clip: bounded.then(|| Rect::at_origin(size)) }
    }
}

/// A redraw target pinned for the duration of one cycle.
pub enum ResolvedTarget {
    Root,
    Widget(WidgetRef),
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Widget(w) => write!(f, "Widget({:p})", std::rc::Rc::as_ptr(w)),
        }
    }
}

#[derive(Debug)]
pub struct Resolved {
    pub target: ResolvedTarget,
    pub scope: RedrawScope,
}

#[derive(Default)]
pub struct EventRouter {
    mouse_down: Option<MouseHandler>,
    mouse_up: Option<MouseHandler>,
    cursor_pos: Option<MouseHandler>,
    input_char: Option<CharHandler>,
    input_key: Option<KeyHandler>,
    mouse_wheel: Option<WheelHandler>,
    ime_preedit: Option<ImeHandler>,
    redraw: Option<RedrawHandler>,

    pointer: Point,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    // ── subscriptions ─────────────────────────────────────────────────────

    pub fn on_mouse_down(&mut self, f: impl FnMut(MouseEvent) + 'static) -> &mut Self {
        self.mouse_down = Some(Box::new(f));
        self
    }

    pub fn on_mouse_up(&mut self, f: impl FnMut(MouseEvent) + 'static) -> &mut Self {
        self.mouse_up = Some(Box::new(f));
        self
    }

    pub fn on_cursor_pos(&mut self, f: impl FnMut(MouseEvent) + 'static) -> &mut Self {
        self.cursor_pos = Some(Box::new(f));
        self
    }

    pub fn on_input_char(&mut self, f: impl FnMut(CharEvent) + 'static) -> &mut Self {
        self.input_char = Some(Box::new(f));
        self
    }

    pub fn on_input_key(&mut self, f: impl FnMut(KeyEvent) + 'static) -> &mut Self {
        self.input_key = Some(Box::new(f));
        self
    }

    /// Optional; wheel input is dropped when nobody subscribed.
    pub fn on_mouse_wheel(&mut self, f: impl FnMut(WheelEvent) + 'static) -> &mut Self {
        self.mouse_wheel = Some(Box::new(f));
        self
    }

    /// Optional; composition updates are dropped when nobody subscribed.
    pub fn on_ime_preedit(&mut self, f: impl FnMut(ImePreeditEvent) + 'static) -> &mut Self {
        self.ime_preedit = Some(Box::new(f));
        self
    }

    /// Handler that paints the root target.
    pub fn on_redraw(
        &mut self,
        f: impl FnMut(&mut dyn Painter, bool) -> anyhow::Result<()> + 'static,
    ) -> &mut Self {
        self.redraw = Some(Box::new(f));
        self
    }

    pub fn is_subscribed(&self, kind: InputKind) -> bool {
        match kind {
            InputKind::MouseDown => self.mouse_down.is_some(),
            InputKind::MouseUp => self.mouse_up.is_some(),
            InputKind::CursorPos => self.cursor_pos.is_some(),
            InputKind::InputChar => self.input_char.is_some(),
            InputKind::InputKey => self.input_key.is_some(),
            InputKind::MouseWheel => self.mouse_wheel.is_some(),
            InputKind::ImePreedit => self.ime_preedit.is_some(),
            InputKind::Redraw => self.redraw.is_some(),
        }
    }

    /// Required subscriptions nobody registered yet.
    pub fn missing(&self) -> Vec<InputKind> {
        InputKind::REQUIRED.into_iter().filter(|k| !self.is_subscribed(*k)).collect()
    }

    pub fn ensure_complete(&self) -> Result<(), FrameError> {
        match self.missing().first() {
            Some(kind) => Err(FrameError::MissingSubscription(*kind)),
            None => Ok(()),
        }
    }

    /// Drops every handler.
    pub fn clear(&mut self) {
        *self = Self { pointer: self.pointer, ..Self::default() };
    }

    /// Last pointer position seen, in logical surface pixels.
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Routes one platform event. Returns whether a handler received it.
    pub fn dispatch(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerMoved(pos) => {
                self.pointer = *pos;
                deliver(&mut self.cursor_pos, MouseEvent { pos: *pos })
            }
            InputEvent::PointerButton(ev) => {
                self.pointer = ev.pos;
                if ev.button != MouseButton::Left {
                    return false;
                }
                let mouse = MouseEvent { pos: ev.pos };
                match ev.state {
                    MouseButtonState::Pressed => deliver(&mut self.mouse_down, mouse),
                    MouseButtonState::Released => deliver(&mut self.mouse_up, mouse),
                }
            }
            InputEvent::MouseWheel { delta, .. } => {
                let (x_offset, y_offset) = match *delta {
                    MouseWheelDelta::Line { x, y } => (x * WHEEL_LINE_PIXELS, y * WHEEL_LINE_PIXELS),
                    MouseWheelDelta::Pixel { x, y } => (-x, -y),
                };
                deliver(&mut self.mouse_wheel, WheelEvent { pos: self.pointer, x_offset, y_offset })
            }
            InputEvent::Text(text) => {
                let Some(handler) = self.input_char.as_mut() else { return false };
                let mut any = false;
                for character in text.chars().filter(|c| !c.is_control()) {
                    handler(CharEvent { character });
                    any = true;
                }
                any
            }
            InputEvent::ImePreedit { text, cursor } => deliver(
                &mut self.ime_preedit,
                ImePreeditEvent { text: text.clone(), cursor_pos: *cursor },
            ),
            InputEvent::Key { key, state, modifiers, code } => deliver(
                &mut self.input_key,
                KeyEvent { action: (*state).into(), code: *key, scancode: *code, modifiers: *modifiers },
            ),
            InputEvent::ModifiersChanged(_)
            | InputEvent::PointerLeft
            | InputEvent::Focused(_) => false,
        }
    }

    // ── redraw ────────────────────────────────────────────────────────────

    /// Pins `target` and computes where it paints.
    ///
    /// Widgets are placed at their absolute position and clipped to their size.
    pub fn resolve(target: &RedrawTarget) -> Result<Resolved, FrameError> {
        match target {
            RedrawTarget::Root => Ok(Resolved { target: ResolvedTarget::Root, scope: RedrawScope::ROOT }),
            RedrawTarget::Widget(weak) => {
                let widget = weak.upgrade().ok_or(FrameError::TargetDropped)?;
                let scope = {
                    let w = widget.try_borrow().map_err(|_| FrameError::TargetBusy)?;
                    RedrawScope::for_bounds(w.pos(), w.size())
                };
                Ok(Resolved { target: ResolvedTarget::Widget(widget), scope })
            }
        }
    }

    pub fn scope_for(target: &RedrawTarget) -> Result<RedrawScope, FrameError> {
        Self::resolve(target).map(|r| r.scope)
    }

    /// Runs the target's paint routine. The painter is expected to be
    /// positioned and clipped for the target already.
    pub fn redraw(
        &mut self,
        target: &ResolvedTarget,
        painter: &mut dyn Painter,
        completely: bool,
    ) -> Result<(), FrameError> {
        match target {
            ResolvedTarget::Root => {
                let handler = self
                    .redraw
                    .as_mut()
                    .ok_or(FrameError::MissingSubscription(InputKind::Redraw))?;
                handler(painter, completely).map_err(FrameError::Redraw)
            }
            ResolvedTarget::Widget(widget) => {
                let mut w = widget.try_borrow_mut().map_err(|_| FrameError::TargetBusy)?;
                w.redraw(painter, completely).map_err(FrameError::Redraw)
            }
        }
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribed: Vec<_> = [
            InputKind::MouseDown,
            InputKind::MouseUp,
            InputKind::CursorPos,
            InputKind::InputChar,
            InputKind::InputKey,
            InputKind::MouseWheel,
            InputKind::ImePreedit,
            InputKind::Redraw,
        ]
        .into_iter()
        .filter(|k| self.is_subscribed(*k))
        .collect();
        f.debug_struct("EventRouter")
            .field("subscribed", &subscribed)
            .field("pointer", &self.pointer)
            .finish()
    }
}

fn deliver<E>(handler: &mut Option<Box<dyn FnMut(E)>>, event: E) -> bool {
    match handler {
        Some(h) => {
            h(event);
            true
        }
        None => false,
    }
}
