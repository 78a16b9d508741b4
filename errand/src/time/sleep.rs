use crate::reactor::command::Command;
use crate::reactor::timer::{TimerEntry, TimerSlot};
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tracing::trace;

/// Creates a future that completes after `duration`.
///
/// # Panics
///
/// The returned future panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// Future returned by [`sleep`].
///
/// The timer is armed with the reactor on first poll. Later polls only
/// refresh the waker, so the sleep may move between tasks (for instance
/// inside a [`Timeout`](crate::time::Timeout) that is itself spawned).
/// Dropping it disarms the timer.
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Shared with the reactor's heap entry once armed.
    slot: Option<Arc<TimerSlot>>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            slot: None,
        }
    }

    /// Returns the instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn arm(&mut self, cx: &Context<'_>) {
        let Some(runtime) = context::current() else {
            panic!("`Sleep` polled outside of a runtime");
        };

        let slot = Arc::new(TimerSlot::new(cx.waker().clone()));
        let entry = TimerEntry {
            deadline: self.deadline,
            slot: Arc::clone(&slot),
        };

        if runtime.reactor.send(Command::Arm(entry)).is_err() {
            trace!("reactor stopped; sleep will not be woken");
        }

        self.slot = Some(slot);
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        match &this.slot {
            Some(slot) => slot.update(cx.waker()),
            None => this.arm(cx),
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(slot) = &self.slot {
            slot.disarm();
        }
    }
}
