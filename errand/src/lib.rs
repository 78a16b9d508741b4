//! # Errand
//!
//! **Errand** runs a unit of blocking work off the caller's thread and
//! reports back exactly once. It is built around a small state machine,
//! [`TaskLifecycle`], with two ways to consume it:
//!
//! - **callbacks**: [`TaskLifecycle::start`] takes an `on_cancel` and an
//!   `on_result` callback, and exactly one of them fires,
//! - **await**: [`TaskLifecycle::start_and_await`] suspends an `async`
//!   caller until the task completes, fails, or is cancelled.
//!
//! Cancellation is cooperative. [`TaskLifecycle::cancel`] raises the task's
//! [`Interrupt`] token, which the work function checks or sleeps on.
//! Cancellation also flows upward: dropping an await that is still pending
//! cancels the task, so timeouts and aborts never leak a worker thread.
//!
//! A compact cooperative runtime is included to drive `async` callers:
//!
//! - a multi-threaded executor with a shared run queue and
//!   abortable [`JoinHandle`](task::JoinHandle)s,
//! - **timers** ([`time::sleep`], [`time::timeout`]),
//! - **macros** `#[errand::main]` and `#[errand::test]`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use errand::{BoxError, TaskLifecycle};
//! use std::time::Duration;
//!
//! #[errand::main]
//! async fn main() {
//!     let task = TaskLifecycle::new(|interrupt| {
//!         interrupt.sleep(Duration::from_millis(500))?;
//!         Ok::<_, BoxError>("ok")
//!     });
//!
//!     match task.start_and_await().await {
//!         Ok(Ok(value)) => println!("done: {value}"),
//!         Ok(Err(failure)) => println!("failed: {failure}"),
//!         Err(cancelled) => println!("{cancelled}"),
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`lifecycle`]: the task state machine, its await bridge and errors
//! - [`task`]: spawning futures on the runtime
//! - [`time`]: sleep and timeout

mod reactor;
mod runtime;
mod utils;

pub mod lifecycle;
pub mod time;

pub use lifecycle::{
    BoxError, Cancelled, Completion, Interrupt, Interrupted, Outcome, StartAndAwait,
    TaskBuilder, TaskFailure, TaskId, TaskLifecycle, TaskStatus,
};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::task::spawn;
pub use runtime::yield_now::yield_now;

pub use errand_macros::*;
