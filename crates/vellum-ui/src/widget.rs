//! The interface widgets expose to the bridge.
//!
//! The widget tree itself lives outside this crate; the frame only needs to
//! know where a widget sits and how to ask it to repaint.

use std::cell::RefCell;
use std::rc::Rc;

use vellum_engine::coords::{Point, Size};

use crate::painter::Painter;

/// A paintable node of the external widget tree.
pub trait Widget {
    /// Top-left position in surface coordinates (logical pixels).
    fn pos(&self) -> Point;

    /// Bounded size. Redraws of this widget are clipped to it.
    fn size(&self) -> Size;

    /// Repaints the widget into `painter`, whose origin is the widget's
    /// top-left corner. `completely` asks for a full repaint rather than an
    /// incremental one.
    ///
    /// The painter's save depth must be the same on return as on entry.
    fn redraw(&mut self, painter: &mut dyn Painter, completely: bool) -> anyhow::Result<()>;
}

/// Shared handle to a widget, as held by the widget tree.
pub type WidgetRef = Rc<RefCell<dyn Widget>>;
