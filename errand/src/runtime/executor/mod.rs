//! Task executor.
//!
//! - [`core`]: owns the run queue and the worker threads,
//! - [`worker`]: the loop each worker thread runs.

pub(crate) mod core;
pub(crate) mod worker;
