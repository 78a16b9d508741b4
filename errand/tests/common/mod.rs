#![allow(dead_code)]

use errand::{Outcome, TaskLifecycle};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// Generous upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A callback observed by [`start_recording`].
#[derive(Debug)]
pub enum Event<V> {
    Cancelled,
    Finished(Outcome<V>),
}

/// Starts `task` with callbacks that forward into the returned channel.
///
/// The channel disconnects once both callbacks have been dropped.
pub fn start_recording<V: Send + 'static>(task: &TaskLifecycle<V>) -> Receiver<Event<V>> {
    let (tx, rx) = mpsc::channel();
    let on_result = tx.clone();

    task.start(
        move || {
            let _ = tx.send(Event::Cancelled);
        },
        move |outcome| {
            let _ = on_result.send(Event::Finished(outcome));
        },
    );

    rx
}
