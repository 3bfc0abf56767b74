use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use super::{Bitmap, ContentKind, LoadResult, ResourceError, ResourceId, Waker};

/// A load result on its way back to the cache.
pub(crate) struct Delivery {
    pub(crate) ticket: u64,
    pub(crate) id: ResourceId,
    pub(crate) result: LoadResult,
}

/// One-shot completion handle for a load.
///
/// `Send`, so loaders can finish on any thread. Dropping it unfinished
/// reports [`ResourceError::Abandoned`], so waiters are never left hanging.
pub struct Completion {
    ticket: u64,
    id: ResourceId,
    tx: Sender<Delivery>,
    waker: Option<Waker>,
    done: bool,
}

impl Completion {
    pub(crate) fn new(ticket: u64, id: ResourceId, tx: Sender<Delivery>, waker: Option<Waker>) -> Self {
        Self { ticket, id, tx, waker, done: false }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn finish(mut self, result: Result<Bitmap, ResourceError>) {
        self.deliver(result.map(Arc::new).map_err(Arc::new));
    }

    fn deliver(&mut self, result: LoadResult) {
        self.done = true;
        let delivery = Delivery { ticket: self.ticket, id: self.id.clone(), result };
        if self.tx.send(delivery).is_err() {
            log::trace!("resource cache gone before {} completed", self.id);
            return;
        }
        if let Some(wake) = &self.waker {
            wake();
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.done {
            self.deliver(Err(Arc::new(ResourceError::Abandoned)));
        }
    }
}

/// Starts fetching and decoding one resource.
///
/// Called on the rendering thread, at most once per pending entry. The
/// implementation must not block; it reports through `done`.
pub trait Loader {
    fn load(&self, id: &ResourceId, done: Completion);
}

/// Loads each resource on its own short-lived thread: file read, HTTP GET
/// or in-memory bytes, then decode.
#[derive(Debug, Clone)]
pub struct ThreadLoader {
    pub http_timeout: Duration,
    /// Response bodies are truncated to this many bytes.
    pub max_download: u64,
}

impl Default for ThreadLoader {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(10),
            max_download: 32 * 1024 * 1024,
        }
    }
}

impl Loader for ThreadLoader {
    fn load(&self, id: &ResourceId, done: Completion) {
        let id = id.clone();
        let cfg = self.clone();
        let spawned = std::thread::Builder::new()
            .name("vellum-image".to_string())
            .spawn(move || {
                let result = cfg.fetch_and_decode(&id);
                if let Err(e) = &result {
                    log::debug!("loading {id} failed: {e}");
                }
                done.finish(result);
            });
        // On failure the closure, and with it `done`, is dropped: the entry
        // fails as abandoned.
        if let Err(e) = spawned {
            log::warn!("could not spawn image loader thread: {e}");
        }
    }
}

impl ThreadLoader {
    fn fetch_and_decode(&self, id: &ResourceId) -> Result<Bitmap, ResourceError> {
        match id {
            ResourceId::Path(path) => Bitmap::decode(&read_file(path)?),
            ResourceId::Url(url) => Bitmap::decode(&self.download(url)?),
            ResourceId::Content(key) => match key.kind() {
                ContentKind::Encoded => Bitmap::decode(key.bytes()),
                ContentKind::Rgba { width, height } => {
                    Bitmap::from_straight_rgba8(width, height, key.bytes().to_vec())
                }
            },
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, ResourceError> {
        let http = |message: String| ResourceError::Http { url: url.to_string(), message };

        let response = ureq::get(url)
            .timeout(self.http_timeout)
            .call()
            .map_err(|e| http(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_download)
            .read_to_end(&mut bytes)
            .map_err(|e| http(e.to_string()))?;
        Ok(bytes)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ResourceError> {
    std::fs::read(path).map_err(|source| ResourceError::Io { path: path.to_path_buf(), source })
}
