use super::interrupt::Interrupt;
use super::outcome::{BoxError, Outcome};
use super::slot::WorkerSlot;

use std::mem;

/// The boxed work function of a lifecycle.
pub(crate) type Work<V> = Box<dyn FnOnce(&Interrupt) -> Result<V, BoxError> + Send>;

/// Callback fired on successful cancellation.
pub(crate) type CancelHook = Box<dyn FnOnce() + Send>;

/// Callback fired on natural completion.
pub(crate) type ResultHook<V> = Box<dyn FnOnce(Outcome<V>) + Send>;

/// Resources owned by a running task.
///
/// Whoever moves the state out of `Running` takes these and is the only
/// party allowed to fire a callback.
pub(crate) struct Running<V> {
    pub(crate) slot: WorkerSlot,
    pub(crate) on_cancel: CancelHook,
    pub(crate) on_result: ResultHook<V>,
}

/// The lifecycle state machine.
///
/// `Idle -> Running -> Completed | Cancelled`. Both terminal states absorb
/// every later `start` or `cancel`.
pub(crate) enum TaskState<V> {
    Idle(Work<V>),
    Running(Running<V>),
    Completed(Completion),
    Cancelled,
}

impl<V> TaskState<V> {
    /// Takes the work function out of an `Idle` state.
    ///
    /// The state is left `Cancelled` until the caller installs the next one;
    /// callers hold the lifecycle lock for the whole exchange.
    pub(crate) fn take_work(&mut self) -> Option<Work<V>> {
        match mem::replace(self, TaskState::Cancelled) {
            TaskState::Idle(work) => Some(work),
            other => {
                *self = other;
                None
            }
        }
    }

    /// Moves a `Running` state to the terminal state `next`, returning the
    /// running resources. Any other state is left untouched.
    pub(crate) fn finish(&mut self, next: TaskState<V>) -> Option<Running<V>> {
        if !matches!(self, TaskState::Running(_)) {
            return None;
        }

        match mem::replace(self, next) {
            TaskState::Running(running) => Some(running),
            _ => None,
        }
    }

    pub(crate) fn status(&self) -> TaskStatus {
        match self {
            TaskState::Idle(_) => TaskStatus::Idle,
            TaskState::Running(_) => TaskStatus::Running,
            TaskState::Completed(completion) => TaskStatus::Completed(*completion),
            TaskState::Cancelled => TaskStatus::Cancelled,
        }
    }
}

/// Which branch of the outcome a completed task produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Succeeded,
    Failed,
}

impl Completion {
    pub(crate) fn of<V>(outcome: &Outcome<V>) -> Self {
        match outcome {
            Ok(_) => Completion::Succeeded,
            Err(_) => Completion::Failed,
        }
    }
}

/// A snapshot of a lifecycle's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Created, not yet started.
    Idle,

    /// Started; the work function owns a worker.
    Running,

    /// Finished naturally and delivered its outcome.
    Completed(Completion),

    /// Cancelled while running. No outcome was or will be delivered.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for `Completed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed(_) | TaskStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> TaskState<u32> {
        TaskState::Idle(Box::new(|_| Ok(1)))
    }

    #[test]
    fn take_work_only_from_idle() {
        let mut state = idle();
        assert!(state.take_work().is_some());

        let mut state: TaskState<u32> = TaskState::Completed(Completion::Succeeded);
        assert!(state.take_work().is_none());
        assert_eq!(state.status(), TaskStatus::Completed(Completion::Succeeded));
    }

    #[test]
    fn finish_leaves_non_running_states_alone() {
        let mut state = idle();
        assert!(state.finish(TaskState::Cancelled).is_none());
        assert_eq!(state.status(), TaskStatus::Idle);

        let mut state: TaskState<u32> = TaskState::Cancelled;
        assert!(state.finish(TaskState::Completed(Completion::Failed)).is_none());
        assert_eq!(state.status(), TaskStatus::Cancelled);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Idle.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed(Completion::Failed).is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }
}
