//! Debug-only operation guard.
//!
//! A chained table runs user code (the bucketing strategy) in the middle of
//! its operations. The guard records which operation is in progress; in
//! debug builds a nested entry panics and names both operations. In release
//! builds it compiles away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub struct OpGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded like the rest of the crate.
    _nosend: PhantomData<*mut ()>,
}

impl OpGuard {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark `op` as running until the returned scope is dropped.
    #[inline]
    pub fn enter(&self, op: &'static str) -> OpScope<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(running) = self.active.get() {
                panic!("reentrant `{op}` while `{running}` is in progress");
            }
            self.active.set(Some(op));
            OpScope { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            OpScope { _z: PhantomData }
        }
    }

    /// Name of the operation currently running, if any. Always `None` in
    /// release builds.
    pub fn active(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.active.get()
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for OpGuard {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OpScope<'a> {
    #[cfg(debug_assertions)]
    owner: &'a OpGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for OpScope<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OpGuard;

    #[test]
    fn sequential_operations_are_ok() {
        let g = OpGuard::new();
        {
            let _s = g.enter("get");
        }
        let _s = g.enter("set");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_and_names_both_ops() {
        let g = OpGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter("set");
            assert_eq!(g.active(), Some("set"));
            let _inner = g.enter("get");
        }));
        let err = res.expect_err("nested entry must panic in debug builds");
        let msg = err
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(msg.contains("`get`") && msg.contains("`set`"), "{msg}");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let g = OpGuard::new();
        let _a = g.enter("set");
        let _b = g.enter("get");
        assert_eq!(g.active(), None);
    }
}
