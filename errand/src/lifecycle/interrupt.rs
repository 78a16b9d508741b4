use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Signal returned by a work function that honoured a cancellation request.
///
/// A work function that returns this error (usually through `?` on
/// [`Interrupt::check`] or [`Interrupt::sleep`]) is treated as cancelled,
/// not failed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("task interrupted")]
pub struct Interrupted;

/// Cooperative cancellation token handed to every work function.
///
/// The token is raised when the owning task is cancelled. Work functions
/// poll it between steps, or use [`sleep`](Self::sleep) which returns as
/// soon as the token is raised.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
}

impl Interrupt {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_interrupted(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Returns `Err(Interrupted)` once cancellation has been requested.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let task = TaskLifecycle::new(|interrupt| {
    ///     for chunk in chunks {
    ///         interrupt.check()?;
    ///         process(chunk);
    ///     }
    ///     Ok::<_, BoxError>(())
    /// });
    /// ```
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_interrupted() {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    /// Blocks the current thread for `duration`, returning early with
    /// `Err(Interrupted)` if cancellation is requested.
    ///
    /// The worker thread is unparked on cancellation, so the early return is
    /// immediate when called from the work function itself. From any other
    /// thread the token is only rechecked when the park times out.
    pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;

        loop {
            self.check()?;

            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }

            thread::park_timeout(deadline - now);
        }
    }
}
