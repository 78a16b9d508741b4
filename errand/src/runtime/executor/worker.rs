use crate::runtime::injector::InjectorHandle;

use tracing::trace;

/// A worker thread of the executor.
///
/// Workers pop tasks from the shared run queue in FIFO order and park when
/// it is empty.
pub(crate) struct Worker {
    /// Index of the worker, used in log fields.
    id: usize,

    /// Run queue shared with the other workers.
    injector: InjectorHandle,
}

impl Worker {
    pub(crate) fn new(id: usize, injector: InjectorHandle) -> Self {
        Self { id, injector }
    }

    /// Runs tasks until the runtime shuts down.
    pub(crate) fn run(&self) {
        trace!(worker = self.id, "worker started");

        while !self.injector.is_shutdown() {
            match self.injector.pop() {
                Some(task) => task.run(),
                None => self.injector.park(),
            }
        }

        trace!(worker = self.id, "worker stopped");
    }
}
