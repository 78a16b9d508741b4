use std::error::Error;
use std::io;

/// A type-erased error returned by a work function.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// The result envelope delivered once per naturally completed task.
///
/// `Ok` carries the value produced by the work function, `Err` the
/// [`TaskFailure`] that prevented it.
pub type Outcome<V> = Result<V, TaskFailure>;

/// Why a task finished without producing a value.
///
/// A `TaskFailure` is always delivered as data through `on_result`; it is
/// never returned from [`start`](super::TaskLifecycle::start) or
/// [`cancel`](super::TaskLifecycle::cancel).
#[derive(thiserror::Error, Debug)]
pub enum TaskFailure {
    /// The work function returned an error.
    #[error("task failed: {0}")]
    Failed(#[source] BoxError),

    /// The work function panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The worker thread could not be created.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

impl TaskFailure {
    /// Returns the error raised by the work function, if any.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            TaskFailure::Failed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// The task was cancelled before it could deliver an [`Outcome`].
///
/// Returned by the await bridge in place of an outcome so that callers can
/// forward it with `?` instead of treating it as an ordinary failure.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task was cancelled")]
pub struct Cancelled;
