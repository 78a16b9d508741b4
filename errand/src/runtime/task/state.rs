/// Not queued and not running; waiting for a wake-up.
pub(crate) const IDLE: usize = 0;

/// In the run queue.
pub(crate) const QUEUED: usize = 1;

/// Being polled by a worker. At most one worker observes this state.
pub(crate) const RUNNING: usize = 2;

/// Produced its output (or panicked); never polled again.
pub(crate) const COMPLETED: usize = 3;

/// Woken while running; requeued once the current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// Aborted through its join handle; never polled again.
pub(crate) const CANCELLED: usize = 5;
