use chained_dict::OpGuard;

#[test]
fn enter_and_exit_is_ok() {
    let g = OpGuard::new();
    {
        let _s = g.enter("insert");
    }
    // Released at end of scope.
    let _s = g.enter("remove");
}

#[cfg(debug_assertions)]
#[test]
fn nested_entry_panics_in_debug() {
    let g = OpGuard::new();
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _outer = g.enter("insert");
        let _inner = g.enter("get");
    }));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    // The outer scope was released during unwinding.
    assert_eq!(g.active(), None);
}

#[cfg(not(debug_assertions))]
#[test]
fn nested_entry_is_noop_in_release() {
    let g = OpGuard::new();
    let _outer = g.enter("insert");
    let _inner = g.enter("get");
    assert_eq!(g.active(), None);
}
