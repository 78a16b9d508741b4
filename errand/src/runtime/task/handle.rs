use crate::runtime::task::Task;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Why a spawned task produced no output.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The task was aborted through [`JoinHandle::abort`], or by the
    /// runtime shutting down before it finished.
    #[error("task was aborted")]
    Cancelled,

    /// The task's future panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl JoinError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JoinError::Cancelled)
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, JoinError::Panicked(_))
    }
}

/// A handle to a spawned task.
///
/// Awaiting the handle yields the task's output, or a [`JoinError`] if the
/// task was aborted or panicked.
///
/// Dropping a `JoinHandle` does **not** cancel the task; it only discards
/// the ability to observe its output.
pub struct JoinHandle<T> {
    task: Arc<Task<T>>,
}

impl<T: Send + 'static> JoinHandle<T> {
    pub(crate) fn new(task: Arc<Task<T>>) -> Self {
        Self { task }
    }

    /// Aborts the task.
    ///
    /// A task that is not currently being polled has its future dropped
    /// immediately, which runs the future's destructors on the calling
    /// thread. A task in the middle of a poll is dropped by its worker once
    /// the poll returns. Aborting a finished task does nothing.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Returns `true` once the task completed, panicked, or was aborted.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T: Send + 'static> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    /// The waker is registered before the state is checked a second time,
    /// so a completion racing with this poll is never missed.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(output) = self.task.try_take_output() {
            return Poll::Ready(output);
        }

        self.task.register(cx.waker());

        match self.task.try_take_output() {
            Some(output) => Poll::Ready(output),
            None => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinHandle").finish_non_exhaustive()
    }
}
