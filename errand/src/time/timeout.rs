use crate::time::sleep::{Sleep, sleep};

use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Error returned by [`timeout`] when the deadline passes first.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline elapsed")]
pub struct Elapsed;

/// Requires `future` to complete within `duration`.
///
/// When the deadline passes first, the returned [`Timeout`] resolves to
/// `Err(Elapsed)`. The inner future is not dropped at that point but
/// together with the `Timeout`, which for a plain `.await` is right after
/// it returns. For an await bridge that drop cancels the underlying task.
///
/// # Examples
///
/// ```rust,ignore
/// let outcome = timeout(Duration::from_secs(1), task.start_and_await()).await;
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout::new(duration, future)
}

/// Future returned by [`timeout`].
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Timeout<F> {
    #[pin]
    future: F,

    #[pin]
    sleep: Sleep,
}

impl<F> Timeout<F> {
    pub(crate) fn new(duration: Duration, future: F) -> Self {
        Timeout {
            future,
            sleep: sleep(duration),
        }
    }
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(value) = this.future.poll(cx) {
            return Poll::Ready(Ok(value));
        }

        match this.sleep.poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(Elapsed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
