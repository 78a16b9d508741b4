//! Timers backed by the runtime reactor.
//!
//! - [`sleep`] completes after a duration,
//! - [`timeout`] bounds another future; dropping the inner future on
//!   expiry is how an awaiting caller cancels a task it no longer waits for.

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
