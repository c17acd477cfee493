//! Indirection: Borrows and Nullable Handles
//!
//! A `&mut` borrow is an address: writing through it changes the variable it
//! was taken from. Passing a plain value hands the callee its own copy.
//!
//! [`Handle`] is a handle that may point nowhere. Whether it is null is part
//! of the API: [`Handle::read`] and [`Handle::write`] return
//! [`Fault::NullDereference`] instead of crashing. Only
//! [`Handle::read_unchecked`] takes the fatal path.
//!
//! # Example
//!
//! ```
//! use value_semantics::indirection::Handle;
//!
//! let age = Handle::new(25);
//! let alias = age.clone();
//! alias.write(30).unwrap();
//! assert_eq!(age.read(), Ok(30));
//!
//! let nothing: Handle<i64> = Handle::null();
//! assert!(nothing.read().is_err());
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use semantics_common::{Expectation, Fault, Kind, Lesson, Observation, raise};
use tracing::debug;

/// `std::any::type_name` without the outer module path.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base_end = full.find('<').unwrap_or(full.len());
    let start = full[..base_end].rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

/// A shared, possibly null handle to a `T`.
pub struct Handle<T> {
    target: Option<Rc<RefCell<T>>>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Handle<T> {
    /// Stores `value` and returns a handle to it.
    pub fn new(value: T) -> Self {
        Self {
            target: Some(Rc::new(RefCell::new(value))),
        }
    }

    /// A handle that points nowhere.
    pub fn null() -> Self {
        Self { target: None }
    }

    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// True if both handles point at the same storage. Null handles point at nothing.
    pub fn same_target(&self, other: &Handle<T>) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn write(&self, value: T) -> Result<(), Fault> {
        self.update(|slot| *slot = value)
    }

    /// Runs `f` on the target in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), Fault> {
        let target = self.target.as_ref().ok_or_else(Self::null_fault)?;
        f(&mut target.borrow_mut());
        Ok(())
    }

    fn null_fault() -> Fault {
        Fault::NullDereference {
            type_name: short_type_name::<T>(),
        }
    }
}

impl<T: Clone> Handle<T> {
    pub fn read(&self) -> Result<T, Fault> {
        self.target
            .as_ref()
            .map(|target| target.borrow().clone())
            .ok_or_else(Self::null_fault)
    }

    /// Reads the target, raising a fatal fault if the handle is null.
    pub fn read_unchecked(&self) -> T {
        match self.read() {
            Ok(value) => value,
            Err(fault) => raise(fault),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "&{:?}", target.borrow()),
            None => f.write_str("null"),
        }
    }
}

// ============================================================================
// Lessons
// ============================================================================

/// Gets its own copy of `n`, doubles it and returns what it ended up with.
pub fn double_copy(mut n: i64) -> i64 {
    n *= 2;
    debug!(n, "doubled the callee's copy");
    n
}

/// Writes through the borrow into the caller's variable.
pub fn modify_through(n: &mut i64) {
    *n = 999;
}

/// `age = 25`, then `*(&mut age) = 30`.
pub fn borrow_write() -> Observation<i64> {
    let mut age: i64 = 25;
    let before = age;

    let ptr = &mut age;
    *ptr = 30;
    let through = *ptr;

    Observation {
        before,
        original: age,
        alias: through,
    }
}

/// `number = 100` passed by value: still 100 afterwards.
pub fn pass_by_value() -> Observation<i64> {
    let number: i64 = 100;
    Observation::capture(&number, |n| double_copy(*n), |_| {}, |n| *n)
}

/// `number = 100` passed by `&mut`: 999 afterwards.
pub fn pass_by_reference() -> Observation<i64> {
    let mut number: i64 = 100;
    let before = number;
    modify_through(&mut number);
    Observation {
        before,
        original: number,
        alias: number,
    }
}

/// Writing through a cloned handle is visible through the original.
pub fn handle_copy() -> Result<Observation<Option<i64>>, Fault> {
    let age = Handle::new(25_i64);
    let before = age.read().ok();

    let alias = age.clone();
    alias.write(30)?;

    Ok(Observation {
        before,
        original: age.read().ok(),
        alias: alias.read().ok(),
    })
}

/// The indirection lesson.
pub fn demonstrate() -> Result<Lesson, Fault> {
    let empty: Handle<i64> = Handle::null();
    let outcome = match empty.read() {
        Ok(value) => value.to_string(),
        Err(fault) => fault.to_string(),
    };
    Ok(Lesson::new(Kind::Indirection)
        .note(format!("null handle: is_null() = {}", empty.is_null()))
        .note(format!("checked read of null handle -> {outcome}"))
        .finding(
            "write through &mut reaches the variable",
            Expectation::Aliased,
            &borrow_write(),
        )
        .finding(
            "pass by value hands over a copy",
            Expectation::Isolated,
            &pass_by_value(),
        )
        .finding(
            "pass by &mut writes the caller's variable",
            Expectation::Aliased,
            &pass_by_reference(),
        )
        .finding(
            "cloned handle shares the target",
            Expectation::Aliased,
            &handle_copy()?,
        ))
}
