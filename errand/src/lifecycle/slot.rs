use super::id::TaskId;
use super::interrupt::Interrupt;

use std::io;
use std::thread::{self, JoinHandle};
use tracing::trace;

/// Thread settings applied to every worker slot of a lifecycle.
#[derive(Clone, Debug, Default)]
pub(crate) struct SlotConfig {
    /// Prefix of the worker thread name; the task id is appended.
    pub(crate) name: Option<String>,

    /// Stack size of the worker thread, in bytes.
    pub(crate) stack_size: Option<usize>,
}

/// The dedicated worker running one task body.
///
/// A slot is created by `start`, owned by the `Running` state, and released
/// exactly once when the task reaches a terminal state. Releasing detaches
/// the thread: a body that ignores its interrupt keeps running until it
/// returns, but nothing it produces is delivered any more.
pub(crate) struct WorkerSlot {
    name: String,
    interrupt: Interrupt,
    thread: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    /// Spawns `body` on a new thread, handing it the slot's interrupt token.
    ///
    /// Every failure to create the thread, an unusable name included, is
    /// returned as an error.
    pub(crate) fn spawn<F>(config: &SlotConfig, id: TaskId, body: F) -> io::Result<Self>
    where
        F: FnOnce(Interrupt) + Send + 'static,
    {
        let prefix = config.name.as_deref().unwrap_or("errand-worker");
        if prefix.contains('\0') {
            // `thread::Builder` panics on these instead of failing.
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "worker thread name contains a NUL byte",
            ));
        }

        let name = format!("{prefix}-{id}");
        let interrupt = Interrupt::new();

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let token = interrupt.clone();
        let thread = builder.spawn(move || body(token))?;

        trace!(task.id = %id, worker = %name, "worker slot allocated");

        Ok(Self {
            name,
            interrupt,
            thread: Some(thread),
        })
    }

    /// Raises the interrupt token and unparks the worker so that
    /// [`Interrupt::sleep`] returns immediately.
    pub(crate) fn interrupt(&self) {
        self.interrupt.raise();

        if let Some(thread) = &self.thread {
            thread.thread().unpark();
        }
    }

    /// Gives up ownership of the worker thread.
    pub(crate) fn release(mut self) {
        // Detached: the worker may be the current thread.
        drop(self.thread.take());
        trace!(worker = %self.name, "worker slot released");
    }
}
