//! Value and Reference Semantics
//!
//! Six kinds of data, each put through the same experiment: build a value,
//! copy it, change the copy, then look at the original again.
//!
//! | Kind | Copy gives you | Change to the copy |
//! |------|----------------|--------------------|
//! | Fixed sequence `[T; N]` | A new array | Stays in the copy |
//! | Record (struct) | New fields, nested records included | Stays in the copy |
//! | Dynamic view (slice) | A new descriptor over the same backing | Reaches the original |
//! | Mapping | A new handle to the same table | Reaches the original |
//! | Indirection (handle) | A new handle to the same target | Reaches the original |
//! | Dynamic type | Whatever the held value's copy gives you | Depends on the held value |
//!
//! The [`faults`] lesson covers deferred cleanup and fault barriers.

// Modules
pub mod dynamic_type; // Closed tagged union, Shape trait
pub mod dynamic_view; // Slice descriptors over shared backing
pub mod faults; // Deferred cleanup, fault barriers
pub mod fixed_sequence; // Arrays
pub mod indirection; // Borrows and nullable handles
pub mod mapping; // Shared hash tables, nil maps
pub mod record; // Structs, receivers, composition

use semantics_common::{Fault, Kind, Lesson};

/// Runs the lesson for one kind.
pub fn demonstrate(kind: Kind) -> Result<Lesson, Fault> {
    match kind {
        Kind::FixedSequence => Ok(fixed_sequence::demonstrate()),
        Kind::DynamicView => dynamic_view::demonstrate(),
        Kind::Mapping => mapping::demonstrate(),
        Kind::Record => record::demonstrate(),
        Kind::Indirection => indirection::demonstrate(),
        Kind::DynamicType => dynamic_type::demonstrate(),
    }
}

/// Runs every lesson in [`Kind::ALL`] order.
pub fn demonstrate_all() -> Result<Vec<Lesson>, Fault> {
    Kind::ALL.into_iter().map(demonstrate).collect()
}
