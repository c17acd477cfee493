//! # Semantics Common Utilities
//!
//! Shared vocabulary for the value/reference semantics lessons.
//!
//! ## Modules
//!
//! - [`observation`]: The six kinds, and the construct -> copy -> mutate -> observe record
//! - [`fault`]: Fault descriptors and the fatal-fault trigger
//! - [`barrier`]: Scoped fault barriers and deferred actions
//!
//! ## Design Principles
//!
//! 1. **Observations are data**: every lesson returns its snapshots, printing is the caller's job
//! 2. **Checked first**: fallible operations return `Result<_, Fault>`; panics are
//!    reserved for the explicitly "unchecked" entry points
//! 3. **Barriers are scoped**: a fault is only intercepted inside [`barrier::with_barrier`]

pub mod barrier;
pub mod fault;
pub mod observation;

// Re-export main types for convenience
pub use barrier::{Deferred, RecoveredFault, with_barrier};
pub use fault::{Fault, describe_panic, raise};
pub use observation::{
    Expectation, Finding, Kind, KindParseError, Lesson, Observation, Semantics,
};
