use crate::reactor::ReactorHandle;
use crate::runtime::injector::InjectorHandle;
use crate::runtime::registry::OwnedTasksHandle;

use std::cell::RefCell;

/// Handles of the runtime a thread belongs to.
#[derive(Clone)]
pub(crate) struct RuntimeContext {
    /// Used by [`Sleep`](crate::time::Sleep) to arm timers.
    pub(crate) reactor: ReactorHandle,

    /// Used by [`spawn`](crate::spawn).
    pub(crate) injector: InjectorHandle,

    /// Registry every spawned task joins.
    pub(crate) tasks: OwnedTasksHandle,
}

thread_local! {
    static CURRENT: RefCell<Option<RuntimeContext>> = const { RefCell::new(None) };
}

/// Puts the previous context back when dropped, also on unwind.
struct Restore(Option<RuntimeContext>);

impl Drop for Restore {
    fn drop(&mut self) {
        let previous = self.0.take();
        let _ = CURRENT.try_with(|current| *current.borrow_mut() = previous);
    }
}

/// Runs `f` with `context` installed as the current thread's runtime.
pub(crate) fn enter<R>(context: RuntimeContext, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|current| current.replace(Some(context)));
    let _restore = Restore(previous);

    f()
}

/// Returns the runtime the current thread belongs to, if any.
pub(crate) fn current() -> Option<RuntimeContext> {
    CURRENT.with(|current| current.borrow().clone())
}
