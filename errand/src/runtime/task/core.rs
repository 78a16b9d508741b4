use super::handle::{JoinError, JoinHandle};
use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::context;
use crate::runtime::injector::InjectorHandle;
use crate::runtime::registry::OwnedTasksHandle;
use crate::utils::panic_message;

use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Wake, Waker};
use tracing::error;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A unit of work the executor can run without knowing its output type.
pub(crate) trait Runnable: Send + Sync {
    /// Polls the task once. Called by a worker thread.
    fn run(self: Arc<Self>);

    /// Id of the task within its runtime.
    fn id(&self) -> u64;

    /// Aborts the task during runtime shutdown.
    fn shutdown(&self);
}

/// A spawned future and everything needed to drive it.
///
/// The `state` word decides who may touch the future: only the worker that
/// moved the task to `RUNNING`, or the aborter that moved it from `IDLE` or
/// `QUEUED` to `CANCELLED`.
pub(crate) struct Task<T> {
    /// Key in the runtime's [`OwnedTasks`](crate::runtime::registry::OwnedTasks).
    id: u64,

    /// The future; `None` once it finished, panicked, or was aborted.
    future: UnsafeCell<Option<BoxFuture<T>>>,

    /// Output, written before the state becomes `COMPLETED`.
    result: UnsafeCell<Option<Result<T, JoinError>>>,

    /// Lifecycle state, one of the constants in [`super::state`].
    pub(crate) state: AtomicUsize,

    /// Run queue used to reschedule the task when woken.
    injector: InjectorHandle,

    /// Registry the task leaves once it is finished.
    tasks: OwnedTasksHandle,

    /// Wakers of join handles awaiting this task.
    waiters: Mutex<Vec<Waker>>,
}

// Safety: the `UnsafeCell`s are only accessed by the party that owns the
// task according to `state`.
unsafe impl<T: Send> Send for Task<T> {}
unsafe impl<T: Send> Sync for Task<T> {}

impl<T: Send + 'static> Task<T> {
    /// Creates a task in the `QUEUED` state; the caller pushes it.
    pub(crate) fn new<F>(future: F, injector: InjectorHandle, tasks: OwnedTasksHandle) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            id: tasks.next_id(),
            future: UnsafeCell::new(Some(Box::pin(future))),
            result: UnsafeCell::new(None),
            state: AtomicUsize::new(QUEUED),
            injector,
            tasks,
            waiters: Mutex::new(Vec::new()),
        }
    }

    /// Polls the future once.
    ///
    /// A panic inside the future completes the task with
    /// [`JoinError::Panicked`] instead of unwinding through the worker.
    pub(crate) fn run(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: RUNNING grants exclusive access to the future.
        let slot = unsafe { &mut *self.future.get() };
        let Some(future) = slot.as_mut() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(&mut cx))) {
            Ok(Poll::Pending) => self.suspend(),
            Ok(Poll::Ready(value)) => {
                *slot = None;
                self.finish(Ok(value));
            }
            Err(payload) => {
                *slot = None;

                let message = panic_message(payload.as_ref());
                error!(panic = %message, "spawned task panicked");
                self.finish(Err(JoinError::Panicked(message)));
            }
        }
    }

    /// Leaves `RUNNING` after a pending poll.
    fn suspend(self: Arc<Self>) {
        let mut current = RUNNING;

        loop {
            let next = match current {
                RUNNING => IDLE,
                NOTIFIED => QUEUED,
                _ => {
                    // Aborted mid-poll; the aborter left the future to us.
                    // Safety: still the only party allowed to touch it.
                    drop(unsafe { (*self.future.get()).take() });
                    return;
                }
            };

            match self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if next == QUEUED {
                        self.injector.push(self.clone());
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Stores the output and wakes the join handle, unless the task was
    /// aborted first.
    fn finish(&self, result: Result<T, JoinError>) {
        // Safety: written before COMPLETED is published; readers wait for it.
        unsafe {
            *self.result.get() = Some(result);
        }

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == CANCELLED {
                return;
            }

            match self.state.compare_exchange(
                current,
                COMPLETED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.tasks.remove(self.id);
        self.notify_waiters();
    }

    /// Reschedules the task.
    ///
    /// An idle task is queued; a running one is marked `NOTIFIED` so that
    /// it is requeued when its current poll returns.
    fn schedule(self: Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            let next = match state {
                IDLE => QUEUED,
                RUNNING => NOTIFIED,
                _ => return,
            };

            if self
                .state
                .compare_exchange(state, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if next == QUEUED {
                    self.injector.push(self.clone());
                }
                return;
            }
        }
    }

    /// Aborts the task.
    ///
    /// If the task is not being polled its future is dropped right away;
    /// otherwise the polling worker drops it when the poll returns.
    pub(crate) fn abort(&self) {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            if current == COMPLETED || current == CANCELLED {
                return;
            }

            match self.state.compare_exchange(
                current,
                CANCELLED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if current == IDLE || current == QUEUED {
            // Safety: no worker polls a task once it left IDLE/QUEUED for
            // CANCELLED, so the future is ours.
            drop(unsafe { (*self.future.get()).take() });
        }

        self.tasks.remove(self.id);
        self.notify_waiters();
    }

    /// Returns the output once the task is finished.
    ///
    /// # Panics
    ///
    /// Panics if the output of a completed task was already taken.
    pub(crate) fn try_take_output(&self) -> Option<Result<T, JoinError>> {
        match self.state.load(Ordering::Acquire) {
            // Safety: COMPLETED was published after the result was written,
            // and only the single join handle reads it.
            COMPLETED => Some(
                unsafe { (*self.result.get()).take() }.expect("task output already taken"),
            ),
            CANCELLED => Some(Err(JoinError::Cancelled)),
            _ => None,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.state.load(Ordering::Acquire), COMPLETED | CANCELLED)
    }

    /// Registers `waker` to be woken when the task finishes.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut waiters = self.waiters.lock();

        if !waiters.iter().any(|w| w.will_wake(waker)) {
            waiters.push(waker.clone());
        }
    }

    fn notify_waiters(&self) {
        let waiters = std::mem::take(&mut *self.waiters.lock());

        for waker in waiters {
            waker.wake();
        }
    }
}

impl<T: Send + 'static> Wake for Task<T> {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        Arc::clone(self).schedule();
    }
}

impl<T: Send + 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::run(self)
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn shutdown(&self) {
        self.abort();
    }
}

/// Spawns a future onto the current runtime.
///
/// The returned [`JoinHandle`] resolves to the future's output. Dropping
/// it does not cancel the task; use [`JoinHandle::abort`] for that.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn<F, T>(future: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let Some(runtime) = context::current() else {
        panic!("spawn must be called within the context of a runtime");
    };

    spawn_onto(future, &runtime.injector, &runtime.tasks)
}

/// Registers a new task with `tasks` and queues it on `injector`.
///
/// Once the runtime is shutting down the task is aborted instead, and its
/// handle resolves to [`JoinError::Cancelled`].
pub(crate) fn spawn_onto<F, T>(
    future: F,
    injector: &InjectorHandle,
    tasks: &OwnedTasksHandle,
) -> JoinHandle<T>
where
    T: Send + 'static,
    F: Future<Output = T> + Send + 'static,
{
    let task = Arc::new(Task::new(future, injector.clone(), tasks.clone()));

    if tasks.insert(task.clone()) {
        injector.push(task.clone());
    }

    JoinHandle::new(task)
}
