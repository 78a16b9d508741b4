//! Small helpers shared by the runtime and the lifecycle.

mod panic;

pub(crate) use panic::panic_message;
