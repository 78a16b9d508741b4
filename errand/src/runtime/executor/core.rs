use crate::reactor::ReactorHandle;
use crate::runtime::context::{self, RuntimeContext};
use crate::runtime::executor::worker::Worker;
use crate::runtime::injector::Injector;
use crate::runtime::registry::OwnedTasks;
use crate::runtime::task::JoinHandle;
use crate::runtime::task::core::spawn_onto;

use std::io;
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// Multi-threaded task executor.
///
/// Owns the run queue, the task registry and the worker threads polling
/// the queue.
pub(crate) struct Executor {
    /// Run queue shared by all workers.
    injector: Arc<Injector>,

    /// Every unfinished task, aborted on shutdown.
    tasks: Arc<OwnedTasks>,

    /// Join handles for worker threads.
    handles: Vec<thread::JoinHandle<()>>,
}

impl Executor {
    /// Spawns `threads` workers named `<name>-<index>`.
    ///
    /// If any worker fails to start, the ones already running are shut
    /// down and joined before the error is returned.
    pub(crate) fn new(reactor: ReactorHandle, threads: usize, name: &str) -> io::Result<Self> {
        let mut executor = Self {
            injector: Arc::new(Injector::new()),
            tasks: Arc::new(OwnedTasks::new()),
            handles: Vec::with_capacity(threads),
        };

        for id in 0..threads {
            let worker = Worker::new(id, executor.injector.clone());
            let runtime = RuntimeContext {
                reactor: reactor.clone(),
                injector: executor.injector.clone(),
                tasks: executor.tasks.clone(),
            };

            let spawned = thread::Builder::new()
                .name(format!("{name}-{id}"))
                .spawn(move || context::enter(runtime, || worker.run()));

            match spawned {
                Ok(handle) => executor.handles.push(handle),
                Err(err) => {
                    executor.shutdown();
                    executor.join();
                    return Err(err);
                }
            }
        }

        debug!(workers = threads, "executor started");

        Ok(executor)
    }

    /// Signals all workers to stop after their current task.
    pub(crate) fn shutdown(&self) {
        self.injector.shutdown();
    }

    /// Queues a new task.
    pub(crate) fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        spawn_onto(future, &self.injector, &self.tasks)
    }

    /// Waits for all workers to exit, then aborts every unfinished task and
    /// empties the run queue.
    ///
    /// Aborting drops the task's future wherever it is parked, which runs
    /// its destructors: a pending await bridge cancels its lifecycle.
    pub(crate) fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }

        self.tasks.shutdown_all();
        self.injector.drain();
    }
}
