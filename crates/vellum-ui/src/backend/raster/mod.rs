//! CPU raster backend on top of `tiny-skia`.

mod painter;
mod skia;

pub use painter::RasterPainter;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use tiny_skia::Pixmap;

use vellum_engine::coords::Size;

struct SurfaceInner {
    size: Size,
    scale: f32,
    pixmap: RefCell<Pixmap>,
    flushes: Cell<u64>,
}

/// Backing surface of the raster backend: a premultiplied RGBA pixmap sized
/// for a logical size at a scale factor. Clones share the pixels.
#[derive(Clone)]
pub struct RasterSurface {
    inner: Rc<SurfaceInner>,
}

impl RasterSurface {
    pub fn new(size: Size, scale: f32) -> anyhow::Result<Self> {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let (w, h) = size.to_physical(scale);
        let pixmap = Pixmap::new(w, h).with_context(|| format!("cannot allocate a {w}x{h} pixmap"))?;
        Ok(Self {
            inner: Rc::new(SurfaceInner {
                size,
                scale,
                pixmap: RefCell::new(pixmap),
                flushes: Cell::new(0),
            }),
        })
    }

    /// Logical size.
    pub fn size(&self) -> Size {
        self.inner.size
    }

    pub fn scale(&self) -> f32 {
        self.inner.scale
    }

    pub fn pixmap(&self) -> Ref<'_, Pixmap> {
        self.inner.pixmap.borrow()
    }

    pub fn pixmap_mut(&self) -> RefMut<'_, Pixmap> {
        self.inner.pixmap.borrow_mut()
    }

    /// Premultiplied RGBA at physical (`x`, `y`), transparent outside.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        skia::pixel(&self.pixmap(), x, y)
    }

    pub(crate) fn mark_flushed(&self) {
        self.inner.flushes.set(self.inner.flushes.get() + 1);
    }

    /// Number of painter flushes committed to this surface.
    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.get()
    }

    /// Whether both handles point at the same surface.
    pub fn same_surface(&self, other: &RasterSurface) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Writes the current pixels as a PNG snapshot.
    pub fn save_png(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        self.pixmap()
            .save_png(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("size", &self.inner.size)
            .field("scale", &self.inner.scale)
            .finish()
    }
}
