use super::executor::core::Executor;
use super::task::JoinHandle;
use crate::reactor::{Reactor, ReactorHandle};

use pin_project::pin_project;
use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};
use std::thread;
use tracing::debug;

/// The runtime driving `async` callers.
///
/// Owns the executor's worker threads and the timer reactor. Dropping the
/// runtime stops both and joins their threads, then aborts every task that
/// has not finished: its future is dropped and its join handle resolves to
/// [`JoinError::Cancelled`](crate::task::JoinError::Cancelled).
///
/// Build one with [`RuntimeBuilder`](crate::RuntimeBuilder).
pub struct Runtime {
    /// Worker threads and run queue.
    executor: Executor,

    /// Command channel of the reactor thread.
    reactor: ReactorHandle,

    /// The reactor thread itself.
    reactor_thread: Option<thread::JoinHandle<()>>,
}

impl Runtime {
    pub(crate) fn new(worker_threads: usize, thread_name: &str) -> io::Result<Self> {
        let (reactor, reactor_thread) = Reactor::start(thread_name)?;

        let executor = match Executor::new(reactor.clone(), worker_threads, thread_name) {
            Ok(executor) => executor,
            Err(err) => {
                reactor.shutdown();
                let _ = reactor_thread.join();
                return Err(err);
            }
        };

        Ok(Self {
            executor,
            reactor,
            reactor_thread: Some(reactor_thread),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 7 });
    /// assert_eq!(runtime.block_on(handle), Ok(7));
    /// ```
    pub fn spawn<F, T>(&self, future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future is spawned onto the executor and its output is sent back
    /// through a channel. A panic inside the future is resumed on the
    /// calling thread.
    ///
    /// # Panics
    ///
    /// Panics if `future` panics.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();

        self.spawn(async move {
            let result = CatchUnwind::new(future).await;
            let _ = transmitter.send(result);
        });

        match receiver.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => panic!("runtime dropped the `block_on` future before it completed"),
        }
    }
}

impl Drop for Runtime {
    /// Stops the workers, then the reactor, and joins every thread.
    fn drop(&mut self) {
        self.executor.shutdown();
        self.reactor.shutdown();

        self.executor.join();

        if let Some(thread) = self.reactor_thread.take() {
            let _ = thread.join();
        }

        debug!("runtime shut down");
    }
}

/// Resolves to `Err(payload)` instead of unwinding when the inner future
/// panics.
#[pin_project]
struct CatchUnwind<F> {
    #[pin]
    future: F,
}

impl<F> CatchUnwind<F> {
    fn new(future: F) -> Self {
        Self { future }
    }
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = Result<F::Output, Box<dyn Any + Send>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let future = self.project().future;

        match panic::catch_unwind(AssertUnwindSafe(|| future.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => Poll::Ready(Ok(value)),
            Err(payload) => Poll::Ready(Err(payload)),
        }
    }
}
