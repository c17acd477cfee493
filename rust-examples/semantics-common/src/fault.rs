//! # Faults
//!
//! Checked operations report a [`Fault`] through `Result`. The unchecked
//! variants call [`raise`], which starts an unwind carrying the fault as its
//! payload. Outside a [`with_barrier`](crate::barrier::with_barrier) that
//! unwind is fatal.

use std::any::Any;

use thiserror::Error;

/// Descriptor of something that went wrong in a lesson operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Read or write through a handle that points nowhere.
    #[error("null handle dereference (handle to {type_name})")]
    NullDereference { type_name: &'static str },

    /// A dynamic-type container did not hold the requested type.
    #[error("type extraction failed: container holds {found}, not {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Index past the end of a sequence or view.
    #[error("index {index} out of range for length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// Write into a map handle that was never initialised.
    #[error("assignment to entry in nil map")]
    NilMapAssignment,

    /// Raised on purpose with a free-form message.
    #[error("{0}")]
    Raised(String),
}

/// Triggers the fatal-fault path for `fault`.
///
/// The unwind payload is the `Fault` itself, so a barrier can hand it back
/// intact.
pub fn raise(fault: Fault) -> ! {
    std::panic::panic_any(fault)
}

/// Turns a panic payload into a one-line descriptor.
///
/// Understands [`Fault`] payloads from [`raise`] as well as the `&str` and
/// `String` payloads produced by `panic!`.
pub fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(fault) = payload.downcast_ref::<Fault>() {
        fault.to_string()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown fault".to_string()
    }
}
