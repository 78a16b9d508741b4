//! Cooperative runtime driving `async` callers.
//!
//! The await bridge needs something to poll it. This module provides a
//! deliberately small executor for that purpose:
//!
//! - a shared FIFO run queue drained by one or more worker threads,
//! - `spawn` with abortable [`JoinHandle`](task::JoinHandle)s,
//! - a synchronous entry point, [`Runtime::block_on`],
//! - cooperative yielding.
//!
//! Timers are served by the reactor thread owned by the runtime.

mod core;
mod executor;
mod injector;
mod registry;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use core::Runtime;
