use crate::runtime::task::Runnable;

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared handle to the run queue.
pub(crate) type InjectorHandle = Arc<Injector>;

/// Upper bound on a single park, so a missed notification only costs a
/// short delay.
const PARK_TIMEOUT: Duration = Duration::from_millis(10);

/// The runtime's run queue.
///
/// Every spawned or woken task is pushed here and popped by the first
/// worker that is free. Idle workers park on a condition variable until a
/// task is pushed or the runtime shuts down.
pub(crate) struct Injector {
    /// Tasks ready to be polled, in wake order.
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,

    /// Signalled on push and shutdown.
    condvar: Condvar,

    /// Set once the runtime starts shutting down.
    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Signals shutdown and wakes every parked worker.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);

        let _queue = self.queue.lock();
        self.condvar.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Queues a task and wakes one parked worker.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().push_back(task);
        self.condvar.notify_one();
    }

    /// Takes the oldest queued task.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().pop_front()
    }

    /// Parks the calling worker until a task is pushed, the runtime shuts
    /// down, or [`PARK_TIMEOUT`] elapses.
    pub(crate) fn park(&self) {
        let mut queue = self.queue.lock();

        if queue.is_empty() && !self.is_shutdown() {
            self.condvar.wait_for(&mut queue, PARK_TIMEOUT);
        }
    }

    /// Drops every queued task.
    ///
    /// Called after the workers have exited; dropping a task drops its
    /// future, which releases whatever the future owned.
    pub(crate) fn drain(&self) {
        let drained: Vec<_> = self.queue.lock().drain(..).collect();
        drop(drained);
    }
}
