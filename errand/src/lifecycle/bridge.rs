use super::TaskLifecycle;
use super::outcome::{Cancelled, Outcome};

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use tracing::{trace, warn};

/// Future returned by [`TaskLifecycle::start_and_await`].
///
/// The task is started on the first poll. The future then resolves exactly
/// once:
///
/// - `Ok(outcome)` when the work function finishes, whether it succeeded or
///   failed,
/// - `Err(Cancelled)` when the task is cancelled through
///   [`TaskLifecycle::cancel`] or observes its interrupt.
///
/// Cancellation also flows the other way: dropping the future after it has
/// started and before it resolves cancels the task, so a caller that times
/// out or is aborted never leaks a worker.
///
/// If the lifecycle was already started by someone else, no callback can
/// ever reach this future and it resolves immediately with `Err(Cancelled)`.
#[must_use = "futures do nothing unless polled"]
pub struct StartAndAwait<V> {
    task: TaskLifecycle<V>,

    /// Created on first poll; `None` means the task was not started by us.
    continuation: Option<Arc<Continuation<V>>>,

    /// Set once the output has been returned.
    done: bool,
}

/// Single-shot resume point shared with the lifecycle callbacks.
struct Continuation<V> {
    state: Mutex<Resume<V>>,
}

enum Resume<V> {
    Waiting(Waker),
    Resumed(Result<Outcome<V>, Cancelled>),
    Taken,
}

impl<V> Continuation<V> {
    fn new(waker: Waker) -> Self {
        Self {
            state: Mutex::new(Resume::Waiting(waker)),
        }
    }

    fn resume(&self, value: Result<Outcome<V>, Cancelled>) {
        let mut state = self.state.lock();

        if !matches!(*state, Resume::Waiting(_)) {
            trace!("continuation already resumed");
            return;
        }

        if let Resume::Waiting(waker) = mem::replace(&mut *state, Resume::Resumed(value)) {
            drop(state);
            waker.wake();
        }
    }
}

impl<V> StartAndAwait<V> {
    pub(super) fn new(task: TaskLifecycle<V>) -> Self {
        Self {
            task,
            continuation: None,
            done: false,
        }
    }
}

impl<V: Send + 'static> StartAndAwait<V> {
    /// Starts the task with callbacks resuming `continuation`.
    fn start(&self, continuation: &Arc<Continuation<V>>) -> bool {
        let on_cancel = {
            let continuation = Arc::clone(continuation);
            move || continuation.resume(Err(Cancelled))
        };

        let on_result = {
            let continuation = Arc::clone(continuation);
            move |outcome: Outcome<V>| continuation.resume(Ok(outcome))
        };

        self.task.try_start(Box::new(on_cancel), Box::new(on_result))
    }
}

impl<V: Send + 'static> Future for StartAndAwait<V> {
    type Output = Result<Outcome<V>, Cancelled>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        assert!(!this.done, "`StartAndAwait` polled after completion");

        let continuation = match this.continuation.clone() {
            Some(continuation) => continuation,
            None => {
                let continuation = Arc::new(Continuation::new(cx.waker().clone()));
                this.continuation = Some(Arc::clone(&continuation));

                if !this.start(&continuation) {
                    warn!(
                        task.id = %this.task.id(),
                        "task already started elsewhere; await bridge resolves as cancelled"
                    );
                    this.done = true;
                    return Poll::Ready(Err(Cancelled));
                }

                continuation
            }
        };

        let mut state = continuation.state.lock();

        match mem::replace(&mut *state, Resume::Taken) {
            Resume::Resumed(value) => {
                this.done = true;
                Poll::Ready(value)
            }
            Resume::Waiting(waker) => {
                // Keep the registered waker unless the task moved.
                *state = if waker.will_wake(cx.waker()) {
                    Resume::Waiting(waker)
                } else {
                    Resume::Waiting(cx.waker().clone())
                };
                Poll::Pending
            }
            Resume::Taken => unreachable!("continuation taken before completion"),
        }
    }
}

impl<V> Drop for StartAndAwait<V> {
    fn drop(&mut self) {
        if self.continuation.is_some() && !self.done {
            trace!(task.id = %self.task.id(), "await bridge dropped; cancelling task");
            self.task.cancel();
        }
    }
}

impl<V> fmt::Debug for StartAndAwait<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartAndAwait")
            .field("task", &self.task)
            .field("started", &self.continuation.is_some())
            .field("done", &self.done)
            .finish()
    }
}
