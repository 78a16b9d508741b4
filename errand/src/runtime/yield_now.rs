use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pending exactly once, waking itself so it is requeued behind every task
/// already in the run queue.
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Lets the other tasks of the runtime make progress before continuing.
///
/// # Examples
///
/// ```rust,ignore
/// async fn poll_until(flag: Arc<AtomicBool>) {
///     while !flag.load(Ordering::Acquire) {
///         yield_now().await;
///     }
/// }
/// ```
pub async fn yield_now() {
    YieldNow { yielded: false }.await
}
