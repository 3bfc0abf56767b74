use std::sync::{Arc, Mutex};

use winit::event_loop::EventLoopProxy;

/// User event that wakes the runtime loop.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Wake;

/// Thread-safe handle that wakes the event loop, delivering
/// [`App::on_wake`](crate::core::App::on_wake) on the loop thread.
#[derive(Clone)]
pub struct RuntimeWaker {
    proxy: Arc<Mutex<EventLoopProxy<Wake>>>,
}

impl RuntimeWaker {
    pub(crate) fn new(proxy: EventLoopProxy<Wake>) -> Self {
        Self { proxy: Arc::new(Mutex::new(proxy)) }
    }

    /// Wakes the loop. A closed loop is ignored.
    pub fn wake(&self) {
        let proxy = match self.proxy.lock() {
            Ok(p) => p,
            Err(poisoned) => poisoned.into_inner(),
        };
        if proxy.send_event(Wake).is_err() {
            log::trace!("wake ignored: event loop closed");
        }
    }
}

impl std::fmt::Debug for RuntimeWaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeWaker").finish_non_exhaustive()
    }
}
