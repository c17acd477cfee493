//! Records: Structs, Receivers and Composition
//!
//! Structs are values. Cloning one duplicates every field, nested structs
//! included, so changing the clone leaves the original alone. The exception
//! is a field that is itself a handle: the clone gets a copy of the handle,
//! and the two records keep sharing what it points at.
//!
//! # Key Rust Concepts
//!
//! - `self` receivers consume a value (the caller clones to keep its own)
//! - `&mut self` receivers change the caller's record in place
//! - Composition with forwarding methods instead of field promotion: a name
//!   present in two parts is never forwarded and must be qualified

use semantics_common::{Expectation, Fault, Kind, Lesson, Observation};
use tracing::debug;

use crate::mapping::MapHandle;

// ============================================================================
// Receivers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub balance: i64,
}

impl Account {
    pub fn new(username: impl Into<String>, balance: i64) -> Self {
        Self {
            username: username.into(),
            balance,
        }
    }

    pub fn show_info(&self) -> String {
        format!("User: {} | Balance: ${}", self.username, self.balance)
    }

    /// Deposits into the account it was given, which is a copy unless the
    /// caller gives up its own.
    #[must_use = "the deposit only exists in the returned account"]
    pub fn try_deposit(mut self, amount: i64) -> Self {
        self.balance += amount;
        debug!(balance = self.balance, "deposited into a by-value receiver");
        self
    }

    pub fn deposit(&mut self, amount: i64) {
        self.balance += amount;
        debug!(balance = self.balance, "deposited through a &mut receiver");
    }

    pub fn rename(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }
}

/// Safe on an absent account: there is nothing to be rich with.
pub fn is_rich(account: Option<&Account>) -> bool {
    account.is_some_and(|account| account.balance > 1000)
}

/// `try_deposit(50)` on a clone: the caller still has $100.
pub fn value_receiver() -> Observation<String> {
    let account = Account::new("gopher123", 100);
    Observation::capture(
        &account,
        |a| a.clone().try_deposit(50),
        |_| {},
        Account::show_info,
    )
}

/// `deposit(50)` and `rename` through `&mut`: the caller's account changes.
pub fn mut_receiver() -> Observation<String> {
    let mut account = Account::new("gopher123", 100);
    let before = account.show_info();

    let alias = &mut account;
    alias.deposit(50);
    alias.rename("super_gopher");

    let after = account.show_info();
    Observation {
        before,
        original: after.clone(),
        alias: after,
    }
}

// ============================================================================
// Composition
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub city: String,
    pub label: String,
}

/// A person and an address composed into one record.
///
/// `name` and `city` are forwarded. Both parts have a `label`, so it is not
/// forwarded: write `employee.person.label` or `employee.address.label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub person: Person,
    pub address: Address,
    pub salary: i64,
}

impl Employee {
    pub fn name(&self) -> &str {
        &self.person.name
    }

    pub fn city(&self) -> &str {
        &self.address.city
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.address.city = city.into();
    }
}

fn sample_employee() -> Employee {
    Employee {
        person: Person {
            name: "Ada".into(),
            label: "engineer".into(),
        },
        address: Address {
            city: "Kyiv".into(),
            label: "office".into(),
        },
        salary: 5000,
    }
}

/// Cloning copies nested records; moving the clone leaves the original in Kyiv.
pub fn nested_copy() -> Observation<Employee> {
    Observation::capture(
        &sample_employee(),
        Clone::clone,
        |copy| {
            copy.set_city("Lviv");
            copy.person.label = "manager".into();
        },
        Clone::clone,
    )
}

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub members: MapHandle<String, String>,
}

/// Cloning a record copies its handle field, not the table behind it.
pub fn handle_field_copy() -> Result<Observation<Vec<(String, String)>>, Fault> {
    let team = Team {
        name: "core".into(),
        members: MapHandle::new(),
    };
    team.members.insert("ada".into(), "lead".into())?;
    let before = team.members.sorted_entries();

    let mut copy = team.clone();
    copy.name = "core-copy".into();
    copy.members.insert("linus".into(), "reviewer".into())?;

    Ok(Observation {
        before,
        original: team.members.sorted_entries(),
        alias: copy.members.sorted_entries(),
    })
}

/// The record lesson.
pub fn demonstrate() -> Result<Lesson, Fault> {
    let employee = sample_employee();
    Ok(Lesson::new(Kind::Record)
        .note(format!(
            "forwarded: name() = {}, city() = {}",
            employee.name(),
            employee.city()
        ))
        .note(format!(
            "qualified: person.label = {}, address.label = {}",
            employee.person.label, employee.address.label
        ))
        .note(format!("is_rich(None) = {}", is_rich(None)))
        .finding(
            "by-value receiver works on a copy",
            Expectation::Isolated,
            &value_receiver(),
        )
        .finding(
            "&mut receiver updates the caller's record",
            Expectation::Aliased,
            &mut_receiver(),
        )
        .finding(
            "clone copies nested records",
            Expectation::Isolated,
            &nested_copy(),
        )
        .finding(
            "clone copies a handle field, not its table",
            Expectation::Aliased,
            &handle_field_copy()?,
        ))
}
