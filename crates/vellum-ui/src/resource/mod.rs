//! Identity-keyed cache of decoded images.
//!
//! Loads run off the rendering thread; their results come back through a
//! channel and are applied by [`ResourceCache::poll`] on the rendering
//! thread, which is also where waiters run.

mod bitmap;
mod cache;
mod id;
mod loader;

pub use bitmap::Bitmap;
pub use cache::{ResourceCache, ResourceStatus, Waker};
pub use id::{ContentKey, ContentKind, ResourceId};
pub use loader::{Completion, Loader, ThreadLoader};

use std::path::PathBuf;
use std::sync::Arc;

/// Why an image could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {message}")]
    Http { url: String, message: String },

    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    BadPixelBuffer { width: u32, height: u32, len: usize },

    #[error("loader dropped the request without a result")]
    Abandoned,
}

/// What every waiter of one load receives. The same `Arc` goes to all of them.
pub type LoadResult = Result<Arc<Bitmap>, Arc<ResourceError>>;
