//! Display-list backend: records draw calls for inspection and replay.

mod list;
mod painter;

pub use list::{DisplayList, DrawCmd, DrawItem, PaintOp, Recording};
pub use painter::RecordingPainter;

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use vellum_engine::coords::Size;

/// Backing surface of the recording backend. Clones share one [`Recording`].
#[derive(Clone)]
pub struct RecordingSurface {
    size: Size,
    scale: f32,
    recording: Rc<RefCell<Recording>>,
}

impl RecordingSurface {
    pub fn new(size: Size, scale: f32) -> Self {
        Self { size, scale, recording: Rc::new(RefCell::new(Recording::default())) }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn recording(&self) -> Ref<'_, Recording> {
        self.recording.borrow()
    }

    pub(crate) fn recording_mut(&self) -> RefMut<'_, Recording> {
        self.recording.borrow_mut()
    }

    pub fn same_surface(&self, other: &RecordingSurface) -> bool {
        Rc::ptr_eq(&self.recording, &other.recording)
    }
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("size", &self.size)
            .field("scale", &self.scale)
            .field("frames", &self.recording.borrow().frames().len())
            .finish()
    }
}
