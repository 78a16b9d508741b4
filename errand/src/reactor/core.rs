use super::command::Command;
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::Instant;
use tracing::trace;

/// Sending half of the reactor's command channel.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    sender: Sender<Command>,
}

impl ReactorHandle {
    /// Sends a command; fails only once the reactor thread has exited.
    pub(crate) fn send(&self, command: Command) -> Result<(), Command> {
        self.sender.send(command).map_err(|err| err.0)
    }

    pub(crate) fn shutdown(&self) {
        let _ = self.send(Command::Shutdown);
    }
}

/// The reactor loop state, owned by the reactor thread.
pub(crate) struct Reactor {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    /// Spawns the reactor thread, named `<name>-reactor`.
    pub(crate) fn start(name: &str) -> io::Result<(ReactorHandle, thread::JoinHandle<()>)> {
        let (sender, receiver) = channel();

        let reactor = Self {
            receiver,
            timers: BinaryHeap::new(),
        };

        let thread = thread::Builder::new()
            .name(format!("{name}-reactor"))
            .spawn(move || reactor.run())?;

        Ok((ReactorHandle { sender }, thread))
    }

    /// Fires expired timers, then waits for the next command or deadline.
    ///
    /// Returns on [`Command::Shutdown`] or when every handle is dropped.
    fn run(mut self) {
        loop {
            self.fire_expired(Instant::now());

            let received = match self.timers.peek() {
                Some(next) => {
                    let wait = next.deadline.saturating_duration_since(Instant::now());
                    self.receiver.recv_timeout(wait)
                }
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::Arm(entry)) => self.timers.push(entry),
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        trace!(pending = self.timers.len(), "reactor stopped");
    }

    fn fire_expired(&mut self, now: Instant) {
        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }

            if let Some(timer) = self.timers.pop() {
                timer.slot.fire();
            }
        }
    }
}
