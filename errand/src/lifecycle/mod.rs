//! Blocking work with a managed lifecycle.
//!
//! A [`TaskLifecycle`] wraps one blocking work function. Starting it runs the
//! function on a dedicated worker thread and reports the [`Outcome`] through
//! a callback; cancelling it interrupts the worker and reports through a
//! second callback. Exactly one of the two callbacks fires for every started
//! task.
//!
//! The same contract is available to `async` callers through
//! [`TaskLifecycle::start_and_await`], which suspends until the task
//! completes or is cancelled.
//!
//! ```rust,ignore
//! use errand::{BoxError, TaskLifecycle};
//! use std::time::Duration;
//!
//! let task = TaskLifecycle::new(|interrupt| {
//!     interrupt.sleep(Duration::from_millis(500))?;
//!     Ok::<_, BoxError>("ok")
//! });
//!
//! task.start(
//!     || println!("cancelled"),
//!     |outcome| println!("finished: {outcome:?}"),
//! );
//! ```

mod bridge;
mod builder;
mod id;
mod interrupt;
mod outcome;
mod slot;
mod state;

pub use bridge::StartAndAwait;
pub use builder::TaskBuilder;
pub use id::TaskId;
pub use interrupt::{Interrupt, Interrupted};
pub use outcome::{BoxError, Cancelled, Outcome, TaskFailure};
pub use state::{Completion, TaskStatus};

use slot::{SlotConfig, WorkerSlot};
use state::{CancelHook, ResultHook, Running, TaskState, Work};

use crate::utils::panic_message;

use parking_lot::Mutex;
use std::error::Error;
use std::fmt;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A unit of blocking work that can be started once and cancelled while it
/// runs.
///
/// `TaskLifecycle` is a cheap handle: clones refer to the same task, so one
/// thread can start it while another cancels it.
///
/// # Guarantees
///
/// - `start` has an effect only the first time it is called.
/// - `cancel` has an effect only while the task is running.
/// - After `start`, exactly one of `on_result` and `on_cancel` fires, exactly
///   once. When completion and cancellation race, whichever reaches the
///   state lock first wins and the other becomes a no-op.
/// - Callbacks run outside the state lock, after the terminal state is
///   visible through [`status`](Self::status).
pub struct TaskLifecycle<V> {
    shared: Arc<Shared<V>>,
}

struct Shared<V> {
    id: TaskId,
    config: SlotConfig,
    state: Mutex<TaskState<V>>,
}

impl<V: Send + 'static> TaskLifecycle<V> {
    /// Creates an idle lifecycle around `work` with default worker settings.
    ///
    /// The work function receives the task's [`Interrupt`] token. Returning
    /// an error that is, or is caused by, [`Interrupted`] is treated as
    /// cancellation; any other error is reported as [`TaskFailure::Failed`].
    pub fn new<F, E>(work: F) -> Self
    where
        F: FnOnce(&Interrupt) -> Result<V, E> + Send + 'static,
        E: Into<BoxError>,
    {
        TaskBuilder::new().build(work)
    }

    pub(crate) fn from_parts(config: SlotConfig, work: Work<V>) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: TaskId::next(),
                config,
                state: Mutex::new(TaskState::Idle(work)),
            }),
        }
    }

    /// Starts the task on a new worker.
    ///
    /// `on_result` receives the outcome on the worker thread once the work
    /// function returns. `on_cancel` fires on the thread that cancels the
    /// task. Calls after the first are ignored.
    pub fn start<C, R>(&self, on_cancel: C, on_result: R)
    where
        C: FnOnce() + Send + 'static,
        R: FnOnce(Outcome<V>) + Send + 'static,
    {
        self.try_start(Box::new(on_cancel), Box::new(on_result));
    }

    /// Starts the task, returning `false` if it was not idle.
    pub(crate) fn try_start(&self, on_cancel: CancelHook, on_result: ResultHook<V>) -> bool {
        let mut state = self.shared.state.lock();

        let Some(work) = state.take_work() else {
            trace!(task.id = %self.shared.id, "start ignored; task already started");
            return false;
        };

        let shared = Arc::clone(&self.shared);
        let spawned = WorkerSlot::spawn(&self.shared.config, self.shared.id, move |interrupt| {
            shared.run(work, interrupt)
        });

        match spawned {
            Ok(slot) => {
                *state = TaskState::Running(Running {
                    slot,
                    on_cancel,
                    on_result,
                });
                debug!(task.id = %self.shared.id, "task started");
            }
            Err(err) => {
                *state = TaskState::Completed(Completion::Failed);
                drop(state);

                warn!(task.id = %self.shared.id, error = %err, "failed to spawn worker");
                on_result(Err(TaskFailure::Spawn(err)));
            }
        }

        true
    }

    /// Starts the task and returns a future resolving to its outcome.
    ///
    /// The future resolves to `Err(Cancelled)` if the task is cancelled, and
    /// dropping it before then cancels the task. See [`StartAndAwait`].
    pub fn start_and_await(&self) -> StartAndAwait<V> {
        StartAndAwait::new(self.clone())
    }
}

impl<V> TaskLifecycle<V> {
    /// Returns a builder for configuring the worker before supplying the
    /// work function.
    pub fn builder() -> TaskBuilder<V> {
        TaskBuilder::new()
    }

    /// Returns the identifier of this task.
    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    /// Returns a snapshot of the current state.
    pub fn status(&self) -> TaskStatus {
        self.shared.state.lock().status()
    }

    /// Cancels the task if it is running.
    ///
    /// Raises the worker's interrupt, fires `on_cancel` on the calling
    /// thread and releases the worker. Calling it on an idle, completed or
    /// already cancelled task does nothing.
    pub fn cancel(&self) {
        self.shared.cancel();
    }
}

impl<V> Shared<V> {
    /// Worker body: runs the work function and settles the outcome.
    fn run(&self, work: Work<V>, interrupt: Interrupt) {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(&interrupt))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) if is_interruption(&*err) => {
                trace!(task.id = %self.id, "work observed interruption");
                self.cancel();
                return;
            }
            Ok(Err(err)) => Err(TaskFailure::Failed(err)),
            Err(payload) => Err(TaskFailure::Panicked(panic_message(payload.as_ref()))),
        };

        self.complete(outcome);
    }

    fn complete(&self, outcome: Outcome<V>) {
        let completion = Completion::of(&outcome);

        let Some(running) = self.state.lock().finish(TaskState::Completed(completion)) else {
            trace!(task.id = %self.id, "outcome discarded; task already cancelled");
            return;
        };

        debug!(task.id = %self.id, ?completion, "task completed");

        let Running {
            slot, on_result, ..
        } = running;

        on_result(outcome);
        slot.release();
    }

    fn cancel(&self) {
        let Some(running) = self.state.lock().finish(TaskState::Cancelled) else {
            return;
        };

        debug!(task.id = %self.id, "task cancelled");

        let Running {
            slot, on_cancel, ..
        } = running;

        slot.interrupt();
        on_cancel();
        slot.release();
    }
}

/// Whether `err`, or any error in its source chain, is [`Interrupted`].
///
/// Work functions often wrap the error from [`Interrupt::sleep`] in their
/// own error type; the interruption is still recognised.
fn is_interruption(err: &(dyn Error + 'static)) -> bool {
    iter::successors(Some(err), |&err| err.source()).any(|err| err.is::<Interrupted>())
}

impl<V> Clone for TaskLifecycle<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> fmt::Debug for TaskLifecycle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskLifecycle")
            .field("id", &self.shared.id)
            .field("status", &self.status())
            .finish()
    }
}
