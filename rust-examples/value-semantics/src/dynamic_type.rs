//! Dynamic Types: A Closed Tagged Union
//!
//! [`Dynamic`] holds a value of any type from a fixed set, tagged with which
//! type it is. Getting the value back out is an explicit discriminant check:
//! [`Dynamic::extract`] reports a mismatch, [`Dynamic::extract_unchecked`]
//! raises a fatal fault.
//!
//! A container is empty only when it is [`Dynamic::Empty`]. A container
//! holding a null `Handle<Rectangle>` has a type, so it is not empty, even
//! though there is nothing behind the handle.
//!
//! Copying a container copies whatever it holds: a plain `Rectangle` is
//! duplicated, a `Handle<Rectangle>` is shared.
//!
//! # Example
//!
//! ```
//! use value_semantics::dynamic_type::{Dynamic, Rectangle};
//! use value_semantics::indirection::Handle;
//!
//! let data = Dynamic::from("Hello, Go!");
//! assert_eq!(data.extract::<String>().unwrap(), "Hello, Go!");
//! assert!(data.extract::<i64>().is_err());
//!
//! let nil_rect = Dynamic::from(Handle::<Rectangle>::null());
//! assert!(!nil_rect.is_empty());
//! ```

use std::f64::consts::PI;

use semantics_common::{Expectation, Fault, Kind, Lesson, Observation, raise};

use crate::indirection::Handle;

// ============================================================================
// Shapes
// ============================================================================

/// Anything with an area.
pub trait Shape {
    fn area(&self) -> f64;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
}

impl Shape for Rectangle {
    fn area(&self) -> f64 {
        self.width * self.height
    }

    fn name(&self) -> &'static str {
        "Rectangle"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    fn name(&self) -> &'static str {
        "Circle"
    }
}

/// Works for every [`Shape`], whatever its concrete type.
pub fn area_report(shape: &dyn Shape) -> String {
    format!("Area of {} is: {:.2}", shape.name(), shape.area())
}

// ============================================================================
// The container
// ============================================================================

/// A value whose type is one of a closed set, known at run time.
#[derive(Debug, Clone, Default)]
pub enum Dynamic {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Rectangle(Rectangle),
    Circle(Circle),
    RectangleHandle(Handle<Rectangle>),
}

impl Dynamic {
    /// True only for [`Dynamic::Empty`]; a null handle still has a type.
    pub fn is_empty(&self) -> bool {
        matches!(self, Dynamic::Empty)
    }

    /// Name of the type currently held.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Empty => "<empty>",
            Dynamic::Int(_) => i64::TYPE_NAME,
            Dynamic::Float(_) => f64::TYPE_NAME,
            Dynamic::Bool(_) => bool::TYPE_NAME,
            Dynamic::Str(_) => String::TYPE_NAME,
            Dynamic::Rectangle(_) => Rectangle::TYPE_NAME,
            Dynamic::Circle(_) => Circle::TYPE_NAME,
            Dynamic::RectangleHandle(_) => <Handle<Rectangle>>::TYPE_NAME,
        }
    }

    /// The held value as a `T`, or a [`Fault::TypeMismatch`].
    pub fn extract<T: Extract>(&self) -> Result<T, Fault> {
        T::extract(self).ok_or(Fault::TypeMismatch {
            expected: T::TYPE_NAME,
            found: self.type_name(),
        })
    }

    /// The held value as a `T`; a mismatch is a fatal fault.
    pub fn extract_unchecked<T: Extract>(&self) -> T {
        match self.extract() {
            Ok(value) => value,
            Err(fault) => raise(fault),
        }
    }

    /// Area of the held shape, reading through a handle if needed.
    pub fn area(&self) -> Result<f64, Fault> {
        match self {
            Dynamic::Rectangle(rect) => Ok(rect.area()),
            Dynamic::Circle(circle) => Ok(circle.area()),
            Dynamic::RectangleHandle(handle) => Ok(handle.read()?.area()),
            Dynamic::Empty
            | Dynamic::Int(_)
            | Dynamic::Float(_)
            | Dynamic::Bool(_)
            | Dynamic::Str(_) => Err(Fault::TypeMismatch {
                expected: "Shape",
                found: self.type_name(),
            }),
        }
    }

    /// One line per held type.
    pub fn describe(&self) -> String {
        match self {
            Dynamic::Int(v) => format!("It's an Integer: {v}"),
            Dynamic::Str(s) => format!("It's a String (len {}): {s:?}", s.len()),
            Dynamic::Float(v) => format!("It's a Float: {v:.2}"),
            Dynamic::Empty
            | Dynamic::Bool(_)
            | Dynamic::Rectangle(_)
            | Dynamic::Circle(_)
            | Dynamic::RectangleHandle(_) => format!("Unknown type: {}", self.type_name()),
        }
    }
}

/// Types that can be pulled back out of a [`Dynamic`].
pub trait Extract: Sized {
    const TYPE_NAME: &'static str;

    fn extract(value: &Dynamic) -> Option<Self>;
}

macro_rules! extract_variant {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl Extract for $ty {
            const TYPE_NAME: &'static str = $name;

            fn extract(value: &Dynamic) -> Option<Self> {
                match value {
                    Dynamic::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Dynamic {
            fn from(value: $ty) -> Self {
                Dynamic::$variant(value)
            }
        }
    };
}

extract_variant!(i64, Int, "i64");
extract_variant!(f64, Float, "f64");
extract_variant!(bool, Bool, "bool");
extract_variant!(String, Str, "String");
extract_variant!(Rectangle, Rectangle, "Rectangle");
extract_variant!(Circle, Circle, "Circle");
extract_variant!(Handle<Rectangle>, RectangleHandle, "Handle<Rectangle>");

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::Str(value.to_string())
    }
}

// ============================================================================
// Lessons
// ============================================================================

fn sample_rectangle() -> Rectangle {
    Rectangle {
        width: 10.0,
        height: 5.0,
    }
}

/// A copied container holding a handle still reaches the same rectangle.
pub fn handle_in_container() -> Result<Observation<Option<f64>>, Fault> {
    let original = Dynamic::from(Handle::new(sample_rectangle()));
    let before = original.area().ok();

    let copy = original.clone();
    copy.extract::<Handle<Rectangle>>()?
        .update(|rect| rect.width = 20.0)?;

    Ok(Observation {
        before,
        original: original.area().ok(),
        alias: copy.area().ok(),
    })
}

/// A copied container holding a rectangle value owns its own rectangle.
pub fn value_in_container() -> Observation<Option<f64>> {
    let original = Dynamic::from(sample_rectangle());
    Observation::capture(
        &original,
        Clone::clone,
        |copy| {
            if let Dynamic::Rectangle(rect) = copy {
                rect.width = 20.0;
            }
        },
        |d| d.area().ok(),
    )
}

/// The dynamic-type lesson.
pub fn demonstrate() -> Result<Lesson, Fault> {
    let mut lesson = Lesson::new(Kind::DynamicType)
        .note(area_report(&sample_rectangle()))
        .note(area_report(&Circle { radius: 5.0 }));

    let nil_rect = Dynamic::from(Handle::<Rectangle>::null());
    lesson = lesson
        .note(format!(
            "Empty: is_empty() = {}",
            Dynamic::Empty.is_empty()
        ))
        .note(format!(
            "{} holding null: is_empty() = {}",
            nil_rect.type_name(),
            nil_rect.is_empty()
        ));

    let data = Dynamic::from("Hello, Go!");
    let extracted = data.extract::<String>()?;
    let mismatch = match data.extract::<i64>() {
        Ok(value) => value.to_string(),
        Err(fault) => fault.to_string(),
    };
    lesson = lesson
        .note(format!("extract::<String>() -> {extracted}"))
        .note(format!("extract::<i64>() -> {mismatch}"));

    for value in [
        Dynamic::from(100_i64),
        Dynamic::from("Golang"),
        Dynamic::from(9.876_f64),
        Dynamic::from(true),
    ] {
        lesson = lesson.note(value.describe());
    }

    Ok(lesson
        .finding(
            "copied container shares the handle's target",
            Expectation::Aliased,
            &handle_in_container()?,
        )
        .finding(
            "copied container duplicates a held value",
            Expectation::Isolated,
            &value_in_container(),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indirection::short_type_name;
    use semantics_common::with_barrier;
    use test_case::test_case;

    #[test_case(Dynamic::from(100_i64), "It's an Integer: 100"; "integer")]
    #[test_case(Dynamic::from("Golang"), "It's a String (len 6): \"Golang\""; "string")]
    #[test_case(Dynamic::from(9.876_f64), "It's a Float: 9.88"; "float")]
    #[test_case(Dynamic::from(true), "Unknown type: bool"; "bool")]
    #[test_case(Dynamic::Empty, "Unknown type: <empty>"; "empty")]
    fn test_describe(value: Dynamic, expected: &str) {
        assert_eq!(value.describe(), expected);
    }

    #[test]
    fn test_area_report() {
        assert_eq!(area_report(&sample_rectangle()), "Area of Rectangle is: 50.00");
        assert_eq!(
            area_report(&Circle { radius: 5.0 }),
            "Area of Circle is: 78.54"
        );
    }

    #[test]
    fn test_only_empty_is_empty() {
        assert!(Dynamic::default().is_empty());
        assert!(!Dynamic::from(0_i64).is_empty());
        assert!(!Dynamic::from(String::new()).is_empty());
        assert!(!Dynamic::from(Handle::<Rectangle>::null()).is_empty());
    }

    #[test]
    fn test_null_handle_in_container_faults_on_use() {
        let nil_rect = Dynamic::from(Handle::<Rectangle>::null());
        assert_eq!(
            nil_rect.area(),
            Err(Fault::NullDereference {
                type_name: "Rectangle"
            })
        );
    }

    #[test]
    fn test_checked_extraction() {
        let data = Dynamic::from("Hello, Go!");
        assert_eq!(data.extract::<String>(), Ok("Hello, Go!".to_string()));
        assert_eq!(
            data.extract::<i64>(),
            Err(Fault::TypeMismatch {
                expected: "i64",
                found: "String"
            })
        );
        assert_eq!(
            Dynamic::Empty.extract::<bool>(),
            Err(Fault::TypeMismatch {
                expected: "bool",
                found: "<empty>"
            })
        );
    }

    #[test]
    fn test_unchecked_extraction_is_fatal() {
        let data = Dynamic::from("Hello, Go!");
        assert_eq!(data.extract_unchecked::<String>(), "Hello, Go!");

        let recovered = with_barrier("assert", || data.extract_unchecked::<i64>()).unwrap_err();
        assert_eq!(
            recovered.message,
            "type extraction failed: container holds String, not i64"
        );
    }

    #[test]
    fn test_area_of_non_shape() {
        assert_eq!(
            Dynamic::from(1_i64).area(),
            Err(Fault::TypeMismatch {
                expected: "Shape",
                found: "i64"
            })
        );
    }

    #[test]
    fn test_type_name_of_handle() {
        let nil_rect = Dynamic::from(Handle::<Rectangle>::null());
        assert_eq!(nil_rect.type_name(), "Handle<Rectangle>");
        assert_eq!(short_type_name::<Rectangle>(), Rectangle::TYPE_NAME);
    }

    #[test]
    fn test_handle_in_container() {
        let obs = handle_in_container().unwrap();
        assert_eq!(obs.before, Some(50.0));
        assert_eq!(obs.original, Some(100.0));
    }

    #[test]
    fn test_value_in_container() {
        let obs = value_in_container();
        assert_eq!(obs.original, Some(50.0));
        assert_eq!(obs.alias, Some(100.0));
    }

    #[test]
    fn test_demonstrate_holds() {
        let lesson = demonstrate().unwrap();
        assert!(lesson.holds());
        assert!(
            lesson
                .notes
                .contains(&"Handle<Rectangle> holding null: is_empty() = false".to_string())
        );
    }
}
