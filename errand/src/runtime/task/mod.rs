//! Tasks spawned on the runtime.
//!
//! A spawned future becomes a [`Task`] that workers poll whenever it is
//! woken. The spawner gets a [`JoinHandle`] to await its output or abort
//! it.

pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod state;

pub(crate) use core::{Runnable, Task};

pub use core::spawn;
pub use handle::{JoinError, JoinHandle};
