use super::TaskLifecycle;
use super::interrupt::Interrupt;
use super::outcome::BoxError;
use super::slot::SlotConfig;

use std::fmt;
use std::marker::PhantomData;

/// Builder for configuring the worker of a [`TaskLifecycle`].
///
/// `V` is the output type of the lifecycle being built. It is usually
/// inferred from the work function passed to [`build`](Self::build).
///
/// # Examples
///
/// ```rust,ignore
/// let task = TaskLifecycle::builder()
///     .name("fetch-user")
///     .stack_size(256 * 1024)
///     .build(|_| Ok::<_, BoxError>(load_user()));
/// ```
pub struct TaskBuilder<V> {
    config: SlotConfig,
    _output: PhantomData<fn() -> V>,
}

impl<V> TaskBuilder<V> {
    /// Creates a builder with default settings: threads are named
    /// `errand-worker-<id>` and use the platform's default stack size.
    pub fn new() -> Self {
        Self {
            config: SlotConfig::default(),
            _output: PhantomData,
        }
    }

    /// Sets the worker thread name prefix. The task id is appended.
    ///
    /// A name containing a NUL byte cannot name a thread; starting the
    /// task then reports [`TaskFailure::Spawn`](super::TaskFailure::Spawn).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the worker thread stack size, in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.config.stack_size = Some(bytes);
        self
    }

    /// Creates an idle lifecycle around `work`.
    pub fn build<F, E>(self, work: F) -> TaskLifecycle<V>
    where
        V: Send + 'static,
        F: FnOnce(&Interrupt) -> Result<V, E> + Send + 'static,
        E: Into<BoxError>,
    {
        TaskLifecycle::from_parts(
            self.config,
            Box::new(move |interrupt| work(interrupt).map_err(Into::into)),
        )
    }
}

impl<V> Default for TaskBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for TaskBuilder<V> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            _output: PhantomData,
        }
    }
}

impl<V> fmt::Debug for TaskBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskBuilder")
            .field("config", &self.config)
            .finish()
    }
}
