//! Timer reactor.
//!
//! A dedicated thread that keeps pending timers in a min-heap and wakes the
//! owning tasks when their deadlines pass. Runtime components talk to it
//! through [`Command`](command::Command)s sent over a channel.
//!
//! Most runtime users do not interact with the reactor directly; it backs
//! [`sleep`](crate::time::sleep) and [`timeout`](crate::time::timeout).

mod core;

pub(crate) mod command;
pub(crate) mod timer;

pub(crate) use core::{Reactor, ReactorHandle};
