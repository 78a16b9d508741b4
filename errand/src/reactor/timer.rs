use parking_lot::Mutex;
use std::cmp::Ordering;
use std::sync::Arc;
use std::task::Waker;
use std::time::Instant;

/// State shared between a [`Sleep`](crate::time::Sleep) and its heap entry.
///
/// The sleep refreshes the waker on every pending poll; the reactor takes
/// it when the deadline passes. Disarming clears it so a dropped sleep is
/// never woken.
pub(crate) struct TimerSlot {
    waker: Mutex<Option<Waker>>,
}

impl TimerSlot {
    pub(crate) fn new(waker: Waker) -> Self {
        Self {
            waker: Mutex::new(Some(waker)),
        }
    }

    /// Replaces the stored waker unless it already wakes the same task.
    pub(crate) fn update(&self, waker: &Waker) {
        let mut slot = self.waker.lock();

        if !slot.as_ref().is_some_and(|current| current.will_wake(waker)) {
            *slot = Some(waker.clone());
        }
    }

    pub(crate) fn disarm(&self) {
        self.waker.lock().take();
    }

    /// Wakes the stored waker, if the timer is still armed.
    pub(crate) fn fire(&self) {
        let waker = self.waker.lock().take();

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// A pending timer in the reactor's heap.
pub(crate) struct TimerEntry {
    pub(crate) deadline: Instant,
    pub(crate) slot: Arc<TimerSlot>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::task::{ArcWake, waker};
    use std::collections::BinaryHeap;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingWaker(AtomicUsize);

    impl ArcWake for CountingWaker {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    fn counting() -> (Arc<CountingWaker>, Waker) {
        let counter = Arc::new(CountingWaker::default());
        (counter.clone(), waker(counter))
    }

    #[test]
    fn heap_pops_earliest_deadline_first() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        for millis in [30, 10, 20] {
            heap.push(TimerEntry {
                deadline: now + Duration::from_millis(millis),
                slot: Arc::new(TimerSlot::new(Waker::noop().clone())),
            });
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|e| e.deadline.duration_since(now).as_millis())
            .collect();

        assert_eq!(order, vec![10, 20, 30]);
    }

    #[test]
    fn fire_wakes_latest_waker_once() {
        let (first, first_waker) = counting();
        let (second, second_waker) = counting();

        let slot = TimerSlot::new(first_waker);
        slot.update(&second_waker);

        slot.fire();
        slot.fire();

        assert_eq!(first.0.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(second.0.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn disarmed_slot_does_not_wake() {
        let (counter, waker) = counting();

        let slot = TimerSlot::new(waker);
        slot.disarm();
        slot.fire();

        assert_eq!(counter.0.load(AtomicOrdering::SeqCst), 0);
    }
}
