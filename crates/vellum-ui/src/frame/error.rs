use std::fmt;

use crate::router::InputKind;

/// Lifecycle of a [`Frame`](super::Frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameState {
    Uninitialized,
    Running,
    Destroyed,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameState::Uninitialized => "uninitialized",
            FrameState::Running => "running",
            FrameState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is {found}, expected {expected}")]
    InvalidState { expected: FrameState, found: FrameState },

    #[error("no {0} handler subscribed")]
    MissingSubscription(InputKind),

    #[error("redraw target was dropped")]
    TargetDropped,

    #[error("redraw target is already borrowed")]
    TargetBusy,

    #[error("redraw handler failed")]
    Redraw(#[source] anyhow::Error),

    /// A redraw returned with a different save depth than it was given.
    #[error("paint state unbalanced after redraw: depth {found}, expected {expected}")]
    UnbalancedPaintState { expected: usize, found: usize },

    /// Running without a bound surface and painter.
    #[error("frame has no surface to draw on")]
    NoSurface,

    #[error("platform failure")]
    Platform(#[source] anyhow::Error),

    #[error("{0} is not supported by this platform")]
    Unsupported(&'static str),
}

impl FrameError {
    /// Errors that leave the frame usable; the request is dropped.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::TargetDropped | FrameError::TargetBusy | FrameError::Redraw(_))
    }
}
