use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use crate::event::{RedrawRequest, RedrawTarget};
use crate::resource::Waker;
use crate::widget::Widget;

/// Redraw requests waiting for the next [`Frame::process_pending`].
///
/// Clones share the queue. Requests for a target that is already queued are
/// merged; the merged request is complete if either one was.
///
/// [`Frame::process_pending`]: super::Frame::process_pending
#[derive(Clone, Default)]
pub struct RedrawQueue {
    inner: Rc<RefCell<VecDeque<RedrawRequest>>>,
}

impl RedrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, request: RedrawRequest) {
        let mut q = self.inner.borrow_mut();
        match q.iter_mut().find(|r| r.target.same_as(&request.target)) {
            Some(queued) => queued.completely |= request.completely,
            None => q.push_back(request),
        }
    }

    pub fn post_root(&self, completely: bool) {
        self.post(RedrawRequest::root(completely));
    }

    pub fn post_widget<W: Widget + 'static>(&self, widget: &Rc<RefCell<W>>, completely: bool) {
        self.post(RedrawRequest::widget(widget, completely));
    }

    /// Takes everything queued so far, oldest first. Requests posted while
    /// the batch is processed wait for the next call.
    pub fn take(&self) -> Vec<RedrawRequest> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn is_queued(&self, target: &RedrawTarget) -> bool {
        self.inner.borrow().iter().any(|r| r.target.same_as(target))
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl std::fmt::Debug for RedrawQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}

pub(crate) type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Root redraw requests from other threads.
///
/// Requests are marshalled onto the rendering thread and queued by the next
/// `process_pending`; the frame's waker, if any, is called after each send.
#[derive(Clone)]
pub struct RedrawSender {
    tx: Sender<bool>,
    waker: SharedWaker,
}

impl RedrawSender {
    /// Returns `false` once the frame is gone.
    pub fn request_root(&self, completely: bool) -> bool {
        if self.tx.send(completely).is_err() {
            return false;
        }
        let waker = match self.waker.lock() {
            Ok(w) => w.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(wake) = waker {
            wake();
        }
        true
    }
}

impl std::fmt::Debug for RedrawSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedrawSender").finish_non_exhaustive()
    }
}

pub(crate) struct RemoteRedraws {
    tx: Sender<bool>,
    rx: Receiver<bool>,
    pub(crate) waker: SharedWaker,
}

impl RemoteRedraws {
    pub(crate) fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, waker: Arc::new(Mutex::new(None)) }
    }

    pub(crate) fn sender(&self) -> RedrawSender {
        RedrawSender { tx: self.tx.clone(), waker: self.waker.clone() }
    }

    pub(crate) fn set_waker(&self, waker: Option<Waker>) {
        match self.waker.lock() {
            Ok(mut w) => *w = waker,
            Err(poisoned) => *poisoned.into_inner() = waker,
        }
    }

    /// Moves every received request into `queue`.
    pub(crate) fn drain_into(&self, queue: &RedrawQueue) -> usize {
        let mut n = 0;
        while let Ok(completely) = self.rx.try_recv() {
            queue.post_root(completely);
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use vellum_engine::coords::{Point, Size};

    use crate::painter::Painter;

    struct Leaf;

    impl Widget for Leaf {
        fn pos(&self) -> Point {
            Point::zero()
        }

        fn size(&self) -> Size {
            Size::new(4.0, 4.0)
        }

        fn redraw(&mut self, _: &mut dyn Painter, _: bool) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn same_target_is_merged_and_keeps_order() {
        let a = Rc::new(RefCell::new(Leaf));
        let b = Rc::new(RefCell::new(Leaf));
        let q = RedrawQueue::new();

        q.post_widget(&a, false);
        q.post_root(false);
        q.post_widget(&b, false);
        q.post_widget(&a, true);

        let batch = q.take();
        assert_eq!(batch.len(), 3);
        assert!(batch[0].target.same_as(&RedrawTarget::widget(&a)));
        assert!(batch[0].completely);
        assert!(batch[1].target.same_as(&RedrawTarget::Root));
        assert!(!batch[2].completely);
        assert!(q.is_empty());
    }

    #[test]
    fn clones_share_the_queue() {
        let q = RedrawQueue::new();
        let other = q.clone();
        other.post_root(true);
        assert!(q.is_queued(&RedrawTarget::Root));
    }

    #[test]
    fn remote_requests_wake_and_drain() {
        let remote = RemoteRedraws::new();
        let woken = Arc::new(AtomicUsize::new(0));
        let counter = woken.clone();
        remote.set_waker(Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        let sender = remote.sender();
        std::thread::spawn(move || {
            sender.request_root(false);
            sender.request_root(true);
        })
        .join()
        .unwrap();

        let q = RedrawQueue::new();
        assert_eq!(remote.drain_into(&q), 2);
        assert_eq!(woken.load(Ordering::SeqCst), 2);
        let batch = q.take();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].completely);
    }
}
