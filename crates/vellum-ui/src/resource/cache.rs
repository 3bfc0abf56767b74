use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use super::loader::{Completion, Delivery};
use super::{Bitmap, LoadResult, Loader, ResourceError, ResourceId, ThreadLoader};

/// Thread-safe callback run after a load result was queued for the cache,
/// typically to wake the event loop so it calls [`ResourceCache::poll`].
pub type Waker = Arc<dyn Fn() + Send + Sync>;

type Waiter = Box<dyn FnOnce(&LoadResult)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    Pending,
    Ready,
    Failed,
}

enum Slot {
    /// `ticket` identifies the load that will resolve this entry.
    Pending { ticket: u64, waiters: Vec<Waiter> },
    Ready(Arc<Bitmap>),
    Failed(Arc<ResourceError>),
}

impl Slot {
    fn status(&self) -> ResourceStatus {
        match self {
            Slot::Pending { .. } => ResourceStatus::Pending,
            Slot::Ready(_) => ResourceStatus::Ready,
            Slot::Failed(_) => ResourceStatus::Failed,
        }
    }
}

struct Entries {
    map: HashMap<ResourceId, Slot>,
    next_ticket: u64,
    loads_started: u64,
}

struct Shared {
    entries: RefCell<Entries>,
    loader: Box<dyn Loader>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
    waker: RefCell<Option<Waker>>,
}

/// Deduplicating image cache.
///
/// A handle: clones share one cache. All methods must be called on the
/// rendering thread. Entries live until [`remove`](Self::remove) or
/// [`clear`](Self::clear); there is no eviction.
#[derive(Clone)]
pub struct ResourceCache {
    shared: Rc<Shared>,
}

impl ResourceCache {
    pub fn new(loader: impl Loader + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            shared: Rc::new(Shared {
                entries: RefCell::new(Entries { map: HashMap::new(), next_ticket: 0, loads_started: 0 }),
                loader: Box::new(loader),
                tx,
                rx,
                waker: RefCell::new(None),
            }),
        }
    }

    /// Called from the loading side whenever a result is queued. Applies to
    /// loads started after this call.
    pub fn set_waker(&self, waker: Option<Waker>) {
        *self.shared.waker.borrow_mut() = waker;
    }

    /// Asks for `id`, calling `on_ready` once with the result.
    ///
    /// - Ready or failed: `on_ready` runs before this returns.
    /// - Pending: `on_ready` is queued behind earlier waiters.
    /// - Unknown: a pending entry is created and exactly one load starts.
    ///
    /// Queued waiters run from [`poll`](Self::poll), in request order.
    pub fn request<F>(&self, id: ResourceId, on_ready: F) -> ResourceStatus
    where
        F: FnOnce(&LoadResult) + 'static,
    {
        let mut entries = self.shared.entries.borrow_mut();
        let resolved: Option<LoadResult> = match entries.map.get_mut(&id) {
            Some(Slot::Ready(bitmap)) => Some(Ok(bitmap.clone())),
            Some(Slot::Failed(err)) => Some(Err(err.clone())),
            Some(Slot::Pending { waiters, .. }) => {
                waiters.push(Box::new(on_ready));
                return ResourceStatus::Pending;
            }
            None => None,
        };

        if let Some(result) = resolved {
            drop(entries);
            let status = if result.is_ok() { ResourceStatus::Ready } else { ResourceStatus::Failed };
            on_ready(&result);
            return status;
        }

        let ticket = entries.next_ticket;
        entries.next_ticket += 1;
        entries.loads_started += 1;
        entries
            .map
            .insert(id.clone(), Slot::Pending { ticket, waiters: vec![Box::new(on_ready)] });
        drop(entries);

        log::debug!("resource {id}: load #{ticket} started");
        let waker = self.shared.waker.borrow().clone();
        let done = Completion::new(ticket, id.clone(), self.shared.tx.clone(), waker);
        self.shared.loader.load(&id, done);
        ResourceStatus::Pending
    }

    /// Applies every queued load result and runs the waiters it releases.
    ///
    /// Results for entries that were removed or cleared since their load
    /// started are dropped. Returns how many entries were resolved.
    pub fn poll(&self) -> usize {
        let mut resolved = 0;
        while let Ok(delivery) = self.shared.rx.try_recv() {
            let waiters = {
                let mut entries = self.shared.entries.borrow_mut();
                let current = matches!(
                    entries.map.get(&delivery.id),
                    Some(Slot::Pending { ticket, .. }) if *ticket == delivery.ticket
                );
                if !current {
                    log::debug!("resource {}: stale result of load #{} ignored", delivery.id, delivery.ticket);
                    continue;
                }

                let slot = match &delivery.result {
                    Ok(bitmap) => Slot::Ready(bitmap.clone()),
                    Err(err) => Slot::Failed(err.clone()),
                };
                match entries.map.insert(delivery.id.clone(), slot) {
                    Some(Slot::Pending { waiters, .. }) => waiters,
                    _ => Vec::new(),
                }
            };

            match &delivery.result {
                Ok(bitmap) => log::debug!(
                    "resource {}: ready {}x{}, {} waiter(s)",
                    delivery.id,
                    bitmap.width(),
                    bitmap.height(),
                    waiters.len()
                ),
                Err(err) => log::warn!("resource {}: failed: {err}", delivery.id),
            }

            for waiter in waiters {
                waiter(&delivery.result);
            }
            resolved += 1;
        }
        resolved
    }

    pub fn status(&self, id: &ResourceId) -> Option<ResourceStatus> {
        self.shared.entries.borrow().map.get(id).map(Slot::status)
    }

    /// The decoded bitmap, if `id` is ready.
    pub fn get(&self, id: &ResourceId) -> Option<Arc<Bitmap>> {
        match self.shared.entries.borrow().map.get(id) {
            Some(Slot::Ready(bitmap)) => Some(bitmap.clone()),
            _ => None,
        }
    }

    pub fn error(&self, id: &ResourceId) -> Option<Arc<ResourceError>> {
        match self.shared.entries.borrow().map.get(id) {
            Some(Slot::Failed(err)) => Some(err.clone()),
            _ => None,
        }
    }

    /// Forgets one entry. Waiters of a pending entry are dropped uncalled.
    pub fn remove(&self, id: &ResourceId) -> bool {
        let removed = self.shared.entries.borrow_mut().map.remove(id);
        removed.is_some()
    }

    /// Forgets every entry. Pending waiters are dropped uncalled and late
    /// results are ignored by [`poll`](Self::poll).
    pub fn clear(&self) {
        let old = std::mem::take(&mut self.shared.entries.borrow_mut().map);
        log::debug!("resource cache cleared ({} entries)", old.len());
        // Waiter closures may own cache handles; drop them outside the borrow.
        drop(old);
    }

    pub fn len(&self) -> usize {
        self.shared.entries.borrow().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loads handed to the loader so far.
    pub fn loads_started(&self) -> u64 {
        self.shared.entries.borrow().loads_started
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(ThreadLoader::default())
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    /// Loader that parks completions until the test finishes them.
    #[derive(Clone, Default)]
    struct ManualLoader {
        pending: Rc<RefCell<Vec<Completion>>>,
    }

    impl Loader for ManualLoader {
        fn load(&self, _id: &ResourceId, done: Completion) {
            self.pending.borrow_mut().push(done);
        }
    }

    impl ManualLoader {
        fn take(&self, i: usize) -> Completion {
            self.pending.borrow_mut().remove(i)
        }
    }

    fn bitmap() -> Bitmap {
        Bitmap::from_straight_rgba8(1, 1, vec![1, 2, 3, 255]).unwrap()
    }

    type Log = Rc<RefCell<Vec<(usize, Option<Arc<Bitmap>>)>>>;

    fn recorder(log: &Log, tag: usize) -> impl FnOnce(&LoadResult) + 'static {
        let log = log.clone();
        move |r: &LoadResult| log.borrow_mut().push((tag, r.as_ref().ok().cloned()))
    }

    #[test]
    fn concurrent_requests_share_one_load() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let log: Log = Default::default();
        let id = ResourceId::from("logo.png");

        for tag in 0..3 {
            assert_eq!(cache.request(id.clone(), recorder(&log, tag)), ResourceStatus::Pending);
        }
        assert_eq!(cache.loads_started(), 1);
        assert_eq!(loader.pending.borrow().len(), 1);
        assert!(log.borrow().is_empty());

        loader.take(0).finish(Ok(bitmap()));
        assert_eq!(cache.poll(), 1);

        let log = log.borrow();
        assert_eq!(log.iter().map(|(t, _)| *t).collect::<Vec<_>>(), vec![0, 1, 2]);
        let first = log[0].1.clone().unwrap();
        assert!(log.iter().all(|(_, b)| b.as_ref().is_some_and(|b| Arc::ptr_eq(b, &first))));
        assert_eq!(cache.status(&id), Some(ResourceStatus::Ready));
    }

    #[test]
    fn ready_entries_answer_immediately() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let id = ResourceId::from("a.png");
        cache.request(id.clone(), |_| {});
        loader.take(0).finish(Ok(bitmap()));
        cache.poll();

        let log: Log = Default::default();
        assert_eq!(cache.request(id.clone(), recorder(&log, 9)), ResourceStatus::Ready);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(cache.loads_started(), 1);
        assert!(cache.get(&id).is_some());
    }

    #[test]
    fn failures_reach_current_and_later_waiters() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let id = ResourceId::from("broken.png");
        let log: Log = Default::default();

        cache.request(id.clone(), recorder(&log, 0));
        cache.request(id.clone(), recorder(&log, 1));
        loader.take(0).finish(Err(ResourceError::Abandoned));
        cache.poll();

        assert_eq!(cache.request(id.clone(), recorder(&log, 2)), ResourceStatus::Failed);
        assert_eq!(*log.borrow(), vec![(0, None), (1, None), (2, None)]);
        assert!(cache.error(&id).is_some());
        assert_eq!(cache.loads_started(), 1);
    }

    #[test]
    fn completion_after_clear_is_ignored() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let id = ResourceId::from("logo.png");
        let log: Log = Default::default();

        cache.request(id.clone(), recorder(&log, 0));
        cache.clear();
        assert!(cache.is_empty());

        cache.request(id.clone(), recorder(&log, 1));
        assert_eq!(cache.loads_started(), 2);

        // The first load lands after the clear.
        loader.take(0).finish(Err(ResourceError::Abandoned));
        assert_eq!(cache.poll(), 0);
        assert_eq!(cache.status(&id), Some(ResourceStatus::Pending));
        assert!(log.borrow().is_empty());

        loader.take(0).finish(Ok(bitmap()));
        assert_eq!(cache.poll(), 1);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].0, 1);
        assert_eq!(cache.status(&id), Some(ResourceStatus::Ready));
    }

    #[test]
    fn removed_entry_reloads_on_next_request() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let id = ResourceId::from("a.png");
        cache.request(id.clone(), |_| {});
        loader.take(0).finish(Ok(bitmap()));
        cache.poll();

        assert!(cache.remove(&id));
        assert!(!cache.remove(&id));
        assert_eq!(cache.request(id, |_| {}), ResourceStatus::Pending);
        assert_eq!(cache.loads_started(), 2);
    }

    #[test]
    fn dropped_loader_handle_fails_the_entry() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let id = ResourceId::from("a.png");
        cache.request(id.clone(), |_| {});
        drop(loader.take(0));
        cache.poll();
        assert!(matches!(cache.error(&id).as_deref(), Some(ResourceError::Abandoned)));
    }

    #[test]
    fn waiters_may_reenter_the_cache() {
        let loader = ManualLoader::default();
        let cache = ResourceCache::new(loader.clone());
        let inner = cache.clone();
        cache.request(ResourceId::from("a.png"), move |_| {
            inner.request(ResourceId::from("b.png"), |_| {});
            inner.clear();
        });
        loader.take(0).finish(Ok(bitmap()));
        cache.poll();
        assert!(cache.is_empty());
        assert_eq!(cache.loads_started(), 2);
    }

    #[test]
    fn thread_loader_decodes_files_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        std::fs::write(&path, crate::testing::png_bytes(4, 3, [255, 0, 0, 255])).unwrap();

        let cache = ResourceCache::default();
        let woken = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = woken.clone();
        cache.set_waker(Some(Arc::new(move || flag.store(true, std::sync::atomic::Ordering::SeqCst))));

        let got: Rc<RefCell<Option<LoadResult>>> = Default::default();
        let sink = got.clone();
        let id = ResourceId::Path(path);
        cache.request(id.clone(), move |r| *sink.borrow_mut() = Some(r.clone()));

        let deadline = Instant::now() + Duration::from_secs(10);
        while got.borrow().is_none() && Instant::now() < deadline {
            cache.poll();
            std::thread::sleep(Duration::from_millis(5));
        }

        let bitmap = got.borrow().clone().unwrap().unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (4, 3));
        assert!(woken.load(std::sync::atomic::Ordering::SeqCst));
    }
}
