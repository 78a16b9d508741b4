use super::timer::TimerEntry;

/// A request sent to the reactor thread.
pub(crate) enum Command {
    /// Add a timer to the heap.
    Arm(TimerEntry),

    /// Stop the reactor thread.
    Shutdown,
}
