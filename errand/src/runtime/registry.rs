use crate::runtime::task::Runnable;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Shared handle to the task registry.
pub(crate) type OwnedTasksHandle = Arc<OwnedTasks>;

/// Every unfinished task spawned on a runtime.
///
/// The run queue only sees tasks that are ready to be polled. A task
/// waiting for a wake-up lives nowhere but in its wakers, which may be
/// owned by the task itself. Keeping a reference here lets shutdown reach
/// it and drop its future.
pub(crate) struct OwnedTasks {
    tasks: Mutex<HashMap<u64, Arc<dyn Runnable>>>,

    /// Source of task ids, unique within the runtime.
    next_id: AtomicU64,

    /// Set by [`shutdown_all`](Self::shutdown_all); no task is accepted
    /// afterwards.
    closed: AtomicBool,
}

impl OwnedTasks {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Tracks `task` until it finishes.
    ///
    /// Returns `false`, after aborting the task, if the registry is already
    /// closed.
    pub(crate) fn insert(&self, task: Arc<dyn Runnable>) -> bool {
        let mut tasks = self.tasks.lock();

        if self.closed.load(Ordering::Acquire) {
            drop(tasks);
            task.shutdown();
            return false;
        }

        tasks.insert(task.id(), task);
        true
    }

    /// Stops tracking the task with the given id.
    pub(crate) fn remove(&self, id: u64) {
        let removed = self.tasks.lock().remove(&id);

        // Dropped outside the lock: the last reference may own a future
        // whose drop reaches back into this registry.
        drop(removed);
    }

    /// Closes the registry and aborts every task still in it.
    ///
    /// Must run after the workers have exited, so that no task is in the
    /// middle of a poll.
    pub(crate) fn shutdown_all(&self) {
        let tasks: Vec<_> = {
            let mut tasks = self.tasks.lock();

            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            tasks.drain().map(|(_, task)| task).collect()
        };

        debug!(tasks = tasks.len(), "aborting unfinished tasks");

        for task in tasks {
            task.shutdown();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::runtime::injector::Injector;
    use crate::runtime::task::core::spawn_onto;

    use std::future;
    use std::sync::atomic::AtomicUsize;

    /// Counts how many times it was dropped.
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn shutdown_all_drops_parked_futures() {
        let injector = Arc::new(Injector::new());
        let tasks = Arc::new(OwnedTasks::new());
        let drops = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let guard = DropCounter(drops.clone());
                spawn_onto(
                    async move {
                        let _guard = guard;
                        future::pending::<()>().await
                    },
                    &injector,
                    &tasks,
                )
            })
            .collect();
        assert_eq!(tasks.len(), 3);

        tasks.shutdown_all();
        injector.drain();

        assert_eq!(tasks.len(), 0);
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert!(handles.iter().all(|handle| handle.is_finished()));
    }

    #[test]
    fn closed_registry_aborts_new_tasks() {
        let injector = Arc::new(Injector::new());
        let tasks = Arc::new(OwnedTasks::new());

        tasks.shutdown_all();
        let handle = spawn_onto(async { 1 }, &injector, &tasks);

        assert!(handle.is_finished());
        assert_eq!(tasks.len(), 0);
        assert!(injector.pop().is_none());
    }

    #[test]
    fn aborted_task_leaves_registry() {
        let injector = Arc::new(Injector::new());
        let tasks = Arc::new(OwnedTasks::new());

        let handle = spawn_onto(future::pending::<()>(), &injector, &tasks);
        assert_eq!(tasks.len(), 1);

        handle.abort();
        assert_eq!(tasks.len(), 0);
    }
}
