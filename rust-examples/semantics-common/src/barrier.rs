//! # Fault Barriers and Deferred Actions
//!
//! A fault barrier is a scope that intercepts any fault raised inside it and
//! hands the caller a [`RecoveredFault`] instead of letting the unwind take
//! the process down. The barrier only covers what runs inside its closure: a
//! fault raised before [`with_barrier`] is entered is not intercepted.
//!
//! [`Deferred`] runs an action when it goes out of scope, whether the scope
//! ends normally or by unwinding. Several guards in one scope drop in reverse
//! declaration order.
//!
//! ## Example
//!
//! ```
//! use semantics_common::barrier::with_barrier;
//! use semantics_common::fault::{Fault, raise};
//!
//! let recovered = with_barrier("lookup", || -> i64 {
//!     raise(Fault::Raised("Something went terribly wrong!".into()))
//! })
//! .unwrap_err();
//!
//! assert_eq!(recovered.scope, "lookup");
//! assert_eq!(recovered.message, "Something went terribly wrong!");
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::fault::{Fault, describe_panic};

/// What a barrier hands back after intercepting a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFault {
    /// Name of the barrier that caught it.
    pub scope: &'static str,
    /// Descriptor of the fault.
    pub message: String,
    /// The typed fault, when it was raised through [`raise`](crate::fault::raise).
    pub fault: Option<Fault>,
}

impl fmt::Display for RecoveredFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recovered in `{}`: {}", self.scope, self.message)
    }
}

impl std::error::Error for RecoveredFault {}

/// Runs `body` behind a fault barrier named `scope`.
///
/// Returns `Ok` with the body's value if it completed, or the intercepted
/// fault otherwise. Interception is logged at `warn`.
///
/// State the body touched through shared references may be left half-updated
/// when it faults; the barrier asserts unwind safety on the caller's behalf.
pub fn with_barrier<T>(scope: &'static str, body: impl FnOnce() -> T) -> Result<T, RecoveredFault> {
    panic::catch_unwind(AssertUnwindSafe(body)).map_err(|payload| {
        let message = describe_panic(&*payload);
        warn!(scope, fault = %message, "fault barrier intercepted a fault");
        RecoveredFault {
            scope,
            message,
            fault: payload.downcast_ref::<Fault>().cloned(),
        }
    })
}

/// Runs an action when dropped.
#[must_use = "a deferred action runs immediately if the guard is not bound"]
pub struct Deferred<F: FnOnce()> {
    action: Option<F>,
}

impl<F: FnOnce()> Deferred<F> {
    /// Schedules `action` for when the guard leaves scope.
    pub fn new(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }

    /// Drops the action without running it.
    pub fn cancel(mut self) {
        self.action = None;
    }
}

impl<F: FnOnce()> fmt::Debug for Deferred<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("armed", &self.action.is_some())
            .finish()
    }
}

impl<F: FnOnce()> Drop for Deferred<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::raise;
    use proptest::prelude::*;
    use std::cell::RefCell;

    #[test]
    fn test_barrier_passes_value_through() {
        assert_eq!(with_barrier("noop", || 41 + 1), Ok(42));
    }

    #[test]
    fn test_barrier_intercepts_typed_fault() {
        let recovered = with_barrier("deref", || -> i64 {
            raise(Fault::NullDereference { type_name: "i64" })
        })
        .unwrap_err();

        assert_eq!(recovered.scope, "deref");
        assert_eq!(
            recovered.fault,
            Some(Fault::NullDereference { type_name: "i64" })
        );
        assert_eq!(
            recovered.to_string(),
            "recovered in `deref`: null handle dereference (handle to i64)"
        );
    }

    #[test]
    fn test_barrier_intercepts_plain_panic() {
        let values: Vec<i32> = Vec::new();
        let recovered = with_barrier("index", || values[3]).unwrap_err();
        assert!(recovered.message.contains("out of bounds"));
        assert_eq!(recovered.fault, None);
    }

    #[test]
    fn test_code_after_barrier_still_runs() {
        let mut steps = vec!["before"];
        let _ = with_barrier::<()>("risky", || panic!("boom"));
        steps.push("after");
        assert_eq!(steps, ["before", "after"]);
    }

    #[test]
    fn test_deferred_runs_in_reverse_order() {
        let log = RefCell::new(Vec::new());
        {
            let _first = Deferred::new(|| log.borrow_mut().push(1));
            let _second = Deferred::new(|| log.borrow_mut().push(2));
            let _third = Deferred::new(|| log.borrow_mut().push(3));
            log.borrow_mut().push(0);
        }
        assert_eq!(*log.borrow(), vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_deferred_runs_during_unwind() {
        let log = RefCell::new(Vec::new());
        let result = with_barrier::<()>("cleanup", || {
            let _cleanup = Deferred::new(|| log.borrow_mut().push("cleanup"));
            log.borrow_mut().push("work");
            panic!("failed mid-way");
        });
        assert!(result.is_err());
        assert_eq!(*log.borrow(), vec!["work", "cleanup"]);
    }

    #[test]
    fn test_cancelled_deferred_does_not_run() {
        let ran = RefCell::new(false);
        let guard = Deferred::new(|| *ran.borrow_mut() = true);
        guard.cancel();
        assert!(!*ran.borrow());
    }

    /// Registers one guard per frame and faults in the innermost one.
    fn register_then_fail(log: &RefCell<Vec<usize>>, depth: usize, count: usize) -> ! {
        let _guard = Deferred::new(move || log.borrow_mut().push(depth));
        if depth + 1 >= count {
            raise(Fault::Raised("innermost frame failed".into()))
        }
        register_then_fail(log, depth + 1, count)
    }

    proptest! {
        #[test]
        fn prop_cancelled_guards_never_run(keep in proptest::collection::vec(any::<bool>(), 0..24)) {
            let log = RefCell::new(Vec::new());
            for (i, &run) in keep.iter().enumerate() {
                let guard = Deferred::new(|| log.borrow_mut().push(i));
                if !run {
                    guard.cancel();
                }
            }
            let expected: Vec<usize> = (0..keep.len()).filter(|&i| keep[i]).collect();
            prop_assert_eq!(log.into_inner(), expected);
        }

        #[test]
        fn prop_nested_guards_unwind_newest_first(count in 1usize..16) {
            let log = RefCell::new(Vec::new());
            let result = with_barrier::<()>("nested", || register_then_fail(&log, 0, count));
            prop_assert!(result.is_err());
            let expected: Vec<usize> = (0..count).rev().collect();
            prop_assert_eq!(log.into_inner(), expected);
        }
    }
}
