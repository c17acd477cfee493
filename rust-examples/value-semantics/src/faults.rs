//! Faults: Deferred Cleanup and Barriers
//!
//! A fatal fault unwinds the stack. Every [`Deferred`] guard on the way out
//! still runs, newest first, and a [`with_barrier`] scope around the code
//! turns the unwind back into an ordinary value. Without a barrier the fault
//! reaches the top of the thread and the process dies.
//!
//! | Situation | Deferred guards | Caller sees |
//! |-----------|-----------------|-------------|
//! | Body returns normally | Run in LIFO order | The body's value |
//! | Body faults, barrier installed | Run during unwinding | `RecoveredFault` |
//! | Body faults, no barrier | Run during unwinding | Nothing; the fault ends the thread |

use std::cell::RefCell;

use semantics_common::{Deferred, Fault, RecoveredFault, raise, with_barrier};
use tracing::info;

use crate::dynamic_type::Dynamic;
use crate::indirection::Handle;

/// Descriptor carried by the fault [`risky_operation`] raises.
pub const RISKY_FAULT: &str = "Something went terribly wrong!";

/// Whether [`risky_operation`] runs behind a fault barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierMode {
    Installed,
    Absent,
}

/// Three guards registered in order, released in reverse.
pub fn deferred_order() -> Vec<String> {
    let log = RefCell::new(Vec::new());
    {
        log.borrow_mut().push("start".to_string());
        let _first = Deferred::new(|| log.borrow_mut().push("deferred 1".to_string()));
        let _second = Deferred::new(|| log.borrow_mut().push("deferred 2".to_string()));
        let _third = Deferred::new(|| log.borrow_mut().push("deferred 3".to_string()));
        log.borrow_mut().push("end".to_string());
    }
    log.into_inner()
}

/// A `move` guard copies `counter` when it is registered, so later writes
/// to `counter` are invisible to it.
pub fn deferred_capture() -> Vec<String> {
    let log = RefCell::new(Vec::new());
    {
        let log = &log;
        let mut counter = 1;
        let _report =
            Deferred::new(move || log.borrow_mut().push(format!("deferred saw counter = {counter}")));
        counter = 2;
        log.borrow_mut().push(format!("counter at return = {counter}"));
    }
    log.into_inner()
}

/// What happened inside [`risky_operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskyOutcome {
    /// Steps in the order they ran, cleanup included.
    pub log: Vec<String>,
    pub recovered: Option<RecoveredFault>,
}

impl RiskyOutcome {
    pub fn recovery_message(&self) -> Option<String> {
        self.recovered
            .as_ref()
            .map(|recovered| format!("Recovered from fault: {}", recovered.message))
    }
}

fn risky_body(log: &RefCell<Vec<String>>) -> ! {
    let _cleanup = Deferred::new(|| log.borrow_mut().push("deferred cleanup ran".to_string()));
    log.borrow_mut().push("about to fail".to_string());
    raise(Fault::Raised(RISKY_FAULT.to_string()))
}

/// Raises a fatal fault after registering cleanup.
///
/// With [`BarrierMode::Absent`] the fault is not intercepted and this
/// function never returns.
pub fn risky_operation(mode: BarrierMode) -> RiskyOutcome {
    let log = RefCell::new(Vec::new());
    let recovered = match mode {
        BarrierMode::Installed => {
            with_barrier::<()>("risky_operation", || risky_body(&log)).err()
        }
        BarrierMode::Absent => {
            info!("running risky_operation without a fault barrier");
            risky_body(&log)
        }
    };
    RiskyOutcome {
        log: log.into_inner(),
        recovered,
    }
}

/// An unchecked read of a null handle, caught.
pub fn guarded_null_read() -> Result<i64, RecoveredFault> {
    let handle: Handle<i64> = Handle::null();
    with_barrier("null read", || handle.read_unchecked())
}

/// An unchecked extraction of the wrong type, caught.
pub fn guarded_bad_extraction() -> Result<i64, RecoveredFault> {
    let data = Dynamic::from("Hello, Go!");
    with_barrier("bad extraction", || data.extract_unchecked::<i64>())
}

fn outcome_line<T: std::fmt::Display>(label: &str, result: Result<T, RecoveredFault>) -> String {
    match result {
        Ok(value) => format!("{label} -> {value}"),
        Err(recovered) => format!("{label} -> {recovered}"),
    }
}

/// Lines of the fault-barrier lesson.
pub fn demonstrate(mode: BarrierMode) -> Vec<String> {
    let mut lines = vec![
        format!("defer order: {}", deferred_order().join(", ")),
        format!("defer capture: {}", deferred_capture().join(", ")),
    ];

    let outcome = risky_operation(mode);
    lines.push(format!("risky_operation: {}", outcome.log.join(", ")));
    if let Some(message) = outcome.recovery_message() {
        lines.push(message);
    }

    lines.push(outcome_line("guarded null read", guarded_null_read()));
    lines.push(outcome_line("guarded bad extraction", guarded_bad_extraction()));
    lines
}
