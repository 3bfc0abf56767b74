use std::rc::Rc;

use vellum_engine::coords::{Circle, Point, Rect};
use vellum_engine::paint::Color;

use crate::resource::ResourceId;
use crate::style::{Font, Style};

/// A resolved draw call. Geometry is in surface space (logical pixels, all
/// translations applied); colors come from the style at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear { color: Color },
    FillRect { rect: Rect, color: Color, radius: f32 },
    StrokeRect { rect: Rect, color: Color, width: f32, radius: f32 },
    FillCircle { circle: Circle, color: Color },
    StrokeCircle { circle: Circle, color: Color, width: f32 },
    Text { text: String, origin: Point, font: Font, color: Color, max_width: Option<f32> },
    StrokeText { text: String, origin: Point, font: Font, color: Color, width: f32, max_width: Option<f32> },
    Caret { origin: Point, height: f32, color: Color },
    Image { id: ResourceId, rect: Rect },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub cmd: DrawCmd,
    /// Clip in surface space at the time of the call.
    pub clip: Option<Rect>,
}

/// Draw calls committed by one flush, in issue order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    items: Vec<DrawItem>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: DrawCmd, clip: Option<Rect>) {
        self.items.push(DrawItem { cmd, clip });
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every call made on a recording painter, state changes included.
#[derive(Debug, Clone)]
pub enum PaintOp {
    Save,
    Restore,
    SetStyle(Option<Rc<Style>>),
    Translate(Point),
    Clip(Rect),
    Draw(DrawCmd),
    Flush,
}

impl PaintOp {
    pub fn is_draw(&self) -> bool {
        matches!(self, PaintOp::Draw(_))
    }
}

/// Shared log behind a recording surface.
#[derive(Debug, Default)]
pub struct Recording {
    ops: Vec<PaintOp>,
    pending: DisplayList,
    frames: Vec<DisplayList>,
}

impl Recording {
    pub(crate) fn op(&mut self, op: PaintOp) {
        self.ops.push(op);
    }

    pub(crate) fn draw(&mut self, cmd: DrawCmd, clip: Option<Rect>) {
        self.pending.push(cmd.clone(), clip);
        self.ops.push(PaintOp::Draw(cmd));
    }

    pub(crate) fn flush(&mut self) {
        self.ops.push(PaintOp::Flush);
        self.frames.push(std::mem::take(&mut self.pending));
    }

    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// One display list per flush, oldest first.
    pub fn frames(&self) -> &[DisplayList] {
        &self.frames
    }

    /// Draws issued since the last flush.
    pub fn pending(&self) -> &DisplayList {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.pending = DisplayList::new();
        self.frames.clear();
    }
}
