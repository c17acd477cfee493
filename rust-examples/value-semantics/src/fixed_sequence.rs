//! Fixed Sequences: Arrays Are Values
//!
//! An array's length is part of its type, and assigning or passing an array
//! copies every element. Nothing done to the copy can reach the original.
//!
//! # Key Rust Concepts
//!
//! - `[T; N]` is `Copy` whenever `T` is, so `let b = a;` duplicates the data
//! - Const generics (`const N: usize`) let one function accept every length
//! - `for x in array` yields copies; `for x in &mut array` yields the slots

use semantics_common::{Expectation, Kind, Lesson, Observation};

/// `copy[0] = 999` on a copy of `[10, 20, 30]`.
pub fn assignment_copies() -> Observation<[i64; 3]> {
    let numbers = [10, 20, 30];
    Observation::capture(&numbers, |a| *a, |copy| copy[0] = 999, |a| *a)
}

/// Receives its own copy of the array and zeroes the first element.
pub fn zero_first<const N: usize>(mut values: [i64; N]) -> [i64; N] {
    if let Some(first) = values.first_mut() {
        *first = 0;
    }
    values
}

/// Passing an array to a function hands over a copy.
pub fn pass_by_value() -> Observation<[i64; 4]> {
    let numbers = [1, 2, 3, 4];
    Observation::capture(&numbers, |a| zero_first(*a), |_| {}, |a| *a)
}

/// `for mut value in numbers { value *= 10 }`: every loop variable changes,
/// `numbers` does not.
pub fn loop_variable_copies() -> Observation<[i64; 3]> {
    let numbers: [i64; 3] = [1, 2, 3];
    let before = numbers;

    let mut loop_values = [0; 3];
    for (seen, mut value) in loop_values.iter_mut().zip(numbers) {
        value *= 10;
        tracing::trace!(value, "scaled a copy of the element");
        *seen = value;
    }

    Observation {
        before,
        original: numbers,
        alias: loop_values,
    }
}

/// `for value in &mut numbers { *value *= 10 }`: the loop writes the slots.
pub fn loop_through_slots() -> Observation<[i64; 3]> {
    let mut numbers: [i64; 3] = [1, 2, 3];
    let before = numbers;

    for value in &mut numbers {
        *value *= 10;
    }

    Observation {
        before,
        original: numbers,
        alias: numbers,
    }
}

/// The full type name, length included.
pub fn type_label<const N: usize>(_values: &[i64; N]) -> &'static str {
    std::any::type_name::<[i64; N]>()
}

/// The fixed-sequence lesson.
pub fn demonstrate() -> Lesson {
    Lesson::new(Kind::FixedSequence)
        .note(format!(
            "{} and {} are different types",
            type_label(&[0; 2]),
            type_label(&[0; 3])
        ))
        .finding(
            "assignment copies every element",
            Expectation::Isolated,
            &assignment_copies(),
        )
        .finding(
            "function parameter receives a copy",
            Expectation::Isolated,
            &pass_by_value(),
        )
        .finding(
            "by-value loop variable is a copy of the element",
            Expectation::Isolated,
            &loop_variable_copies(),
        )
        .finding(
            "&mut loop variable writes the element",
            Expectation::Aliased,
            &loop_through_slots(),
        )
}
