use super::Runtime;

use std::io;

/// Builder for configuring and creating a [`Runtime`].
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(2)
///     .thread_name("app-runtime")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    /// Number of worker threads in the executor.
    worker_threads: usize,

    /// Prefix of every thread the runtime spawns.
    thread_name: String,
}

impl RuntimeBuilder {
    /// Creates a builder with one worker thread and threads named
    /// `errand-runtime-*`.
    pub fn new() -> Self {
        Self {
            worker_threads: 1,
            thread_name: String::from("errand-runtime"),
        }
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the name prefix of the runtime's threads.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Builds the runtime, starting its reactor and worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned.
    pub fn build(self) -> io::Result<Runtime> {
        Runtime::new(self.worker_threads, &self.thread_name)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
