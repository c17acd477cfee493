//! # Observations
//!
//! Every lesson follows the same three steps: construct an instance, take a
//! copy or alias of it, mutate the copy, then look at both. [`Observation`]
//! records those snapshots; [`Finding`] is the printable, type-erased form the
//! driver collects.
//!
//! ## Example
//!
//! ```
//! use semantics_common::observation::Observation;
//!
//! let numbers = [10, 20, 30];
//! let obs = Observation::capture(&numbers, |a| *a, |copy| copy[0] = 999, |a| *a);
//!
//! assert_eq!(obs.original, [10, 20, 30]); // arrays are values
//! assert_eq!(obs.alias, [999, 20, 30]);
//! assert!(!obs.propagated());
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The six container/indirection kinds covered by the lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Fixed-size arrays.
    FixedSequence,
    /// Views over shared backing storage (slices).
    DynamicView,
    /// Hash maps behind a shared handle.
    Mapping,
    /// Structs, including composed ones.
    Record,
    /// Borrows and nullable handles.
    Indirection,
    /// The closed dynamic-type container.
    DynamicType,
}

impl Kind {
    /// All kinds, in lesson order.
    pub const ALL: [Kind; 6] = [
        Kind::FixedSequence,
        Kind::DynamicView,
        Kind::Mapping,
        Kind::Record,
        Kind::Indirection,
        Kind::DynamicType,
    ];

    /// Kebab-case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Kind::FixedSequence => "fixed-sequence",
            Kind::DynamicView => "dynamic-view",
            Kind::Mapping => "mapping",
            Kind::Record => "record",
            Kind::Indirection => "indirection",
            Kind::DynamicType => "dynamic-type",
        }
    }

    /// Whether copying this kind duplicates data or only a handle to it.
    pub fn semantics(self) -> Semantics {
        match self {
            Kind::FixedSequence | Kind::Record => Semantics::Value,
            Kind::DynamicView | Kind::Mapping | Kind::Indirection | Kind::DynamicType => {
                Semantics::Descriptor
            }
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a kind name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown kind `{given}` (expected one of: fixed-sequence, dynamic-view, mapping, record, indirection, dynamic-type)"
)]
pub struct KindParseError {
    pub given: String,
}

impl FromStr for Kind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Kind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| KindParseError {
                given: s.to_string(),
            })
    }
}

/// What a copy of a kind duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantics {
    /// The copy owns all data reachable by value.
    Value,
    /// The copy is another handle onto the same storage.
    Descriptor,
}

impl Semantics {
    /// The default expectation for a mutation made through a copy.
    pub fn expectation(self) -> Expectation {
        match self {
            Semantics::Value => Expectation::Isolated,
            Semantics::Descriptor => Expectation::Aliased,
        }
    }
}

/// Whether a mutation through the copy should show up in the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    /// The original must equal its pre-mutation state.
    Isolated,
    /// The original must reflect the mutation.
    Aliased,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Isolated => f.write_str("expected isolated"),
            Expectation::Aliased => f.write_str("expected aliased"),
        }
    }
}

/// Snapshots taken around one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation<T> {
    /// The original, before anything happened.
    pub before: T,
    /// The original, after the copy was mutated.
    pub original: T,
    /// The copy or alias, after mutation.
    pub alias: T,
}

impl<T: PartialEq> Observation<T> {
    /// Runs construct -> copy -> mutate -> observe on `original`.
    ///
    /// The original is only ever borrowed shared, so any change it shows
    /// afterwards came through storage it shares with the copy.
    pub fn capture<S>(
        original: &S,
        copy: impl FnOnce(&S) -> S,
        mutate: impl FnOnce(&mut S),
        snapshot: impl Fn(&S) -> T,
    ) -> Self {
        let before = snapshot(original);
        let mut alias = copy(original);
        mutate(&mut alias);
        Self {
            before,
            original: snapshot(original),
            alias: snapshot(&alias),
        }
    }

    /// True if the mutation made through the copy reached the original.
    pub fn propagated(&self) -> bool {
        self.original != self.before
    }
}

/// A printable record of one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: Kind,
    pub title: String,
    pub before: String,
    pub original: String,
    pub alias: String,
    pub propagated: bool,
    pub expected: Expectation,
}

impl Finding {
    /// Renders `observation` with `Debug` and records whether it propagated.
    pub fn new<T: fmt::Debug + PartialEq>(
        kind: Kind,
        title: impl Into<String>,
        expected: Expectation,
        observation: &Observation<T>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            before: format!("{:?}", observation.before),
            original: format!("{:?}", observation.original),
            alias: format!("{:?}", observation.alias),
            propagated: observation.propagated(),
            expected,
        }
    }

    /// Same as [`Finding::new`], expecting whatever the kind's semantics imply.
    pub fn for_kind<T: fmt::Debug + PartialEq>(
        kind: Kind,
        title: impl Into<String>,
        observation: &Observation<T>,
    ) -> Self {
        Self::new(kind, title, kind.semantics().expectation(), observation)
    }

    /// True if what happened matches what was expected.
    pub fn holds(&self) -> bool {
        match self.expected {
            Expectation::Isolated => !self.propagated,
            Expectation::Aliased => self.propagated,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.kind, self.title)?;
        writeln!(f, "  before:   {}", self.before)?;
        writeln!(f, "  original: {}", self.original)?;
        writeln!(f, "  alias:    {}", self.alias)?;
        let outcome = if self.propagated {
            "reached the original"
        } else {
            "stayed in the copy"
        };
        let verdict = if self.holds() { "ok" } else { "VIOLATED" };
        write!(f, "  -> mutation {outcome} ({}, {verdict})", self.expected)
    }
}

/// Everything one kind's lesson produced: console notes and findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub kind: Kind,
    /// Free-form lines, printed before the findings.
    pub notes: Vec<String>,
    pub findings: Vec<Finding>,
}

impl Lesson {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            notes: Vec::new(),
            findings: Vec::new(),
        }
    }

    /// Adds a console line.
    #[must_use]
    pub fn note(mut self, line: impl Into<String>) -> Self {
        self.notes.push(line.into());
        self
    }

    /// Adds a finding for this lesson's kind.
    #[must_use]
    pub fn finding<T: fmt::Debug + PartialEq>(
        mut self,
        title: impl Into<String>,
        expected: Expectation,
        observation: &Observation<T>,
    ) -> Self {
        self.findings
            .push(Finding::new(self.kind, title, expected, observation));
        self
    }

    /// True if every finding matched its expectation.
    pub fn holds(&self) -> bool {
        self.findings.iter().all(Finding::holds)
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ({:?} semantics) ---", self.kind, self.kind.semantics())?;
        for line in &self.notes {
            writeln!(f, "{line}")?;
        }
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        Ok(())
    }
}
