//! Mappings: Hash Maps behind a Shared Handle
//!
//! A [`MapHandle`] behaves like a reference type: copying the handle shares
//! the table, so an insert through any copy is visible through all of them.
//! Looking up a missing key yields the value type's default, which is only
//! distinguishable from a stored default through the presence flag of
//! [`MapHandle::get_with_presence`].
//!
//! For contrast, `im::HashMap` is a persistent map: cloning it is cheap
//! thanks to structural sharing, yet updates to the clone never reach the
//! original. It has value semantics.
//!
//! # Comparison
//!
//! | Operation | `MapHandle` | `im::HashMap` |
//! |-----------|-------------|---------------|
//! | `clone()` | shares the table | shares structure, not identity |
//! | insert on clone | visible everywhere | local to the clone |
//! | missing key | `V::default()` + flag | `None` |

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use semantics_common::{Expectation, Fault, Kind, Lesson, Observation};

/// A shared handle onto a hash table.
///
/// The default handle is nil, like an uninitialised map variable: reads see
/// an empty table and writes fail with [`Fault::NilMapAssignment`].
pub struct MapHandle<K, V> {
    table: Option<Rc<RefCell<HashMap<K, V>>>>,
}

impl<K, V> Clone for MapHandle<K, V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K, V> Default for MapHandle<K, V> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<K, V> MapHandle<K, V> {
    /// An initialised, empty table.
    pub fn new() -> Self {
        Self {
            table: Some(Rc::new(RefCell::new(HashMap::new()))),
        }
    }

    /// A handle with no table behind it.
    pub fn nil() -> Self {
        Self { table: None }
    }

    pub fn is_nil(&self) -> bool {
        self.table.is_none()
    }

    pub fn len(&self) -> usize {
        self.table.as_ref().map_or(0, |table| table.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if both handles point at the same table. Two nil handles share nothing.
    pub fn shares_table_with(&self, other: &MapHandle<K, V>) -> bool {
        match (&self.table, &other.table) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<K: Eq + Hash, V> MapHandle<K, V> {
    /// Adds or overwrites `key`, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, Fault> {
        let table = self.table.as_ref().ok_or(Fault::NilMapAssignment)?;
        Ok(table.borrow_mut().insert(key, value))
    }

    /// Removes `key`. Removing an absent key, or from a nil map, does nothing.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .as_ref()
            .and_then(|table| table.borrow_mut().remove(key))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .as_ref()
            .is_some_and(|table| table.borrow().contains_key(key))
    }
}

impl<K: Eq + Hash, V: Clone + Default> MapHandle<K, V> {
    /// The stored value, or `V::default()` if `key` is absent.
    pub fn get<Q>(&self, key: &Q) -> V
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_with_presence(key).0
    }

    /// The value (or default) together with whether `key` is actually present.
    pub fn get_with_presence<Q>(&self, key: &Q) -> (V, bool)
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .as_ref()
            .and_then(|table| table.borrow().get(key).cloned())
            .map_or_else(|| (V::default(), false), |value| (value, true))
    }
}

impl<K: Ord + Clone, V: Clone> MapHandle<K, V> {
    /// Entries sorted by key. Hash iteration order is unspecified.
    pub fn sorted_entries(&self) -> Vec<(K, V)> {
        let mut entries: Vec<(K, V)> = self.table.as_ref().map_or_else(Vec::new, |table| {
            table
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        });
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for MapHandle<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            table: Some(Rc::new(RefCell::new(iter.into_iter().collect()))),
        }
    }
}

impl<K: Ord + Clone + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for MapHandle<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return f.write_str("nil");
        }
        f.debug_map().entries(self.sorted_entries()).finish()
    }
}

// ============================================================================
// Lessons
// ============================================================================

fn currencies() -> impl Iterator<Item = (String, String)> {
    [
        ("EUR", "Euro"),
        ("UAH", "Ukrainian Hryvnia"),
        ("USD", "US Dollar"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
}

/// Inserts through a copied handle; the original sees the new entry.
pub fn shared_handle() -> Result<Observation<Vec<(String, String)>>, Fault> {
    let roles: MapHandle<String, String> = MapHandle::new();
    roles.insert("admin".into(), "Super User".into())?;
    let before = roles.sorted_entries();

    let copy = roles.clone();
    copy.insert("editor".into(), "Content Manager".into())?;

    Ok(Observation {
        before,
        original: roles.sorted_entries(),
        alias: copy.sorted_entries(),
    })
}

/// Grants `role` to `user` in the table the handle points at.
pub fn grant(roles: MapHandle<String, String>, user: &str, role: &str) -> Result<(), Fault> {
    roles.insert(user.to_string(), role.to_string())?;
    Ok(())
}

/// A map passed to a function by value is still the caller's map.
pub fn mutated_in_function() -> Result<Observation<Vec<(String, String)>>, Fault> {
    let roles: MapHandle<String, String> = MapHandle::new();
    let before = roles.sorted_entries();

    let passed = roles.clone();
    grant(passed.clone(), "viewer", "Read Only")?;

    Ok(Observation {
        before,
        original: roles.sorted_entries(),
        alias: passed.sorted_entries(),
    })
}

/// Removing a key from a persistent map clone leaves the original intact.
pub fn persistent_copy() -> Observation<Vec<(String, String)>> {
    let original: im::HashMap<String, String> = currencies().collect();
    let sorted = |map: &im::HashMap<String, String>| {
        let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort();
        entries
    };
    Observation::capture(
        &original,
        Clone::clone,
        |copy| {
            copy.remove("USD");
        },
        sorted,
    )
}

/// One lookup made by [`role_lookups`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub key: &'static str,
    pub value: String,
    pub present: bool,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lookup {:?} -> ({:?}, {})", self.key, self.value, self.present)
    }
}

/// Absent key, then a present value, then a present empty value.
pub fn role_lookups() -> Result<Vec<Lookup>, Fault> {
    let roles: MapHandle<String, String> = MapHandle::new();
    let lookup = |key: &'static str| {
        let (value, present) = roles.get_with_presence(key);
        Lookup {
            key,
            value,
            present,
        }
    };

    let mut lookups = vec![lookup("viewer")];
    roles.insert("admin".into(), "Super User".into())?;
    roles.insert("guest".into(), String::new())?;
    lookups.push(lookup("admin"));
    lookups.push(lookup("guest"));
    Ok(lookups)
}

/// The mapping lesson.
pub fn demonstrate() -> Result<Lesson, Fault> {
    let mut lesson = Lesson::new(Kind::Mapping);
    for lookup in role_lookups()? {
        lesson = lesson.note(lookup.to_string());
    }

    let nil: MapHandle<String, i64> = MapHandle::nil();
    let write = match nil.insert("key".into(), 1) {
        Ok(_) => "accepted".to_string(),
        Err(fault) => fault.to_string(),
    };
    lesson = lesson
        .note(format!("read from nil map -> {}", nil.get("key")))
        .note(format!("write to nil map -> {write}"));

    let currencies: MapHandle<String, String> = currencies().collect();
    let removed = currencies.remove("NOT_EXISTING");
    lesson = lesson.note(format!(
        "remove absent key -> {removed:?}, {} entries left",
        currencies.len()
    ));

    Ok(lesson
        .finding(
            "copied handle shares the table",
            Expectation::Aliased,
            &shared_handle()?,
        )
        .finding(
            "function receiving the map mutates the caller's table",
            Expectation::Aliased,
            &mutated_in_function()?,
        )
        .finding(
            "persistent map clone has value semantics",
            Expectation::Isolated,
            &persistent_copy(),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::hash_map;
    use proptest::prelude::*;

    #[test]
    fn test_presence_scenario() {
        let lookups = role_lookups().unwrap();
        assert_eq!(
            lookups[0],
            Lookup {
                key: "viewer",
                value: String::new(),
                present: false
            }
        );
        assert_eq!(
            lookups[1],
            Lookup {
                key: "admin",
                value: "Super User".into(),
                present: true
            }
        );
    }

    #[test]
    fn test_zero_value_distinguished_only_by_flag() {
        let lookups = role_lookups().unwrap();
        let absent = &lookups[0];
        let stored_empty = &lookups[2];
        assert_eq!(absent.value, stored_empty.value);
        assert_ne!(absent.present, stored_empty.present);
    }

    #[test]
    fn test_get_returns_default_for_missing() {
        let scores: MapHandle<String, i64> = MapHandle::new();
        assert_eq!(scores.get("nobody"), 0);
        scores.insert("zero".into(), 0).unwrap();
        assert_eq!(scores.get("zero"), 0);
        assert!(scores.contains_key("zero"));
        assert!(!scores.contains_key("nobody"));
    }

    #[test]
    fn test_insert_returns_previous() {
        let roles: MapHandle<String, String> = MapHandle::new();
        assert_eq!(roles.insert("a".into(), "1".into()), Ok(None));
        assert_eq!(roles.insert("a".into(), "2".into()), Ok(Some("1".into())));
    }

    #[test]
    fn test_nil_map() {
        let nil: MapHandle<String, i64> = MapHandle::default();
        assert!(nil.is_nil());
        assert!(nil.is_empty());
        assert_eq!(nil.get_with_presence("x"), (0, false));
        assert_eq!(nil.insert("x".into(), 1), Err(Fault::NilMapAssignment));
        assert_eq!(nil.remove("x"), None);
        assert_eq!(format!("{nil:?}"), "nil");
        assert!(!nil.shares_table_with(&nil.clone()));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let map: MapHandle<String, String> = currencies().collect();
        assert_eq!(map.remove("NOT_EXISTING"), None);
        assert_eq!(map.len(), 3);
        assert_eq!(map.remove("USD"), Some("US Dollar".into()));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_shared_handle() {
        let obs = shared_handle().unwrap();
        assert_eq!(obs.original, obs.alias);
        assert_eq!(obs.original.len(), 2);
        assert!(obs.propagated());
    }

    #[test]
    fn test_grant_through_function() {
        let obs = mutated_in_function().unwrap();
        assert_eq!(
            obs.original,
            vec![("viewer".to_string(), "Read Only".to_string())]
        );
    }

    #[test]
    fn test_persistent_copy_isolated() {
        let obs = persistent_copy();
        assert_eq!(obs.original.len(), 3);
        assert_eq!(obs.alias.len(), 2);
        assert!(!obs.propagated());
    }

    #[test]
    fn test_debug_is_sorted() {
        let map: MapHandle<String, String> = currencies().collect();
        assert_eq!(
            format!("{map:?}"),
            r#"{"EUR": "Euro", "UAH": "Ukrainian Hryvnia", "USD": "US Dollar"}"#
        );
    }

    #[test]
    fn test_demonstrate_holds() {
        let lesson = demonstrate().unwrap();
        assert!(lesson.holds());
        assert_eq!(lesson.notes[0], r#"lookup "viewer" -> ("", false)"#);
        assert_eq!(lesson.notes[1], r#"lookup "admin" -> ("Super User", true)"#);
        assert!(
            lesson
                .notes
                .contains(&"write to nil map -> assignment to entry in nil map".to_string())
        );
    }

    #[test]
    fn test_borrowed_key_lookups() {
        let map: MapHandle<String, String> = currencies().collect();
        assert!(map.contains_key("EUR"));
        assert_eq!(map.get("UAH"), "Ukrainian Hryvnia");
        assert_eq!(map.get_with_presence("GBP"), (String::new(), false));
        assert_eq!(map.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_presence_flag_distinguishes_zero(
            stored in hash_map("[a-z]{1,6}", prop_oneof![Just(0i64), any::<i64>()], 0..16),
            missing in "[A-Z]{1,6}",
        ) {
            let map: MapHandle<String, i64> = stored.clone().into_iter().collect();

            for (key, value) in &stored {
                prop_assert_eq!(map.get_with_presence(key.as_str()), (*value, true));
            }
            // Upper-case keys never collide with the stored lower-case ones.
            prop_assert_eq!(map.get_with_presence(missing.as_str()), (0, false));
            prop_assert_eq!(map.get(missing.as_str()), 0);
        }

        #[test]
        fn prop_insert_through_copy_reaches_original(
            entries in hash_map("[a-z]{1,6}", any::<i64>(), 1..16),
        ) {
            let original: MapHandle<String, i64> = MapHandle::new();
            let copy = original.clone();
            for (key, value) in &entries {
                copy.insert(key.clone(), *value).unwrap();
            }
            prop_assert_eq!(original.len(), entries.len());
            prop_assert_eq!(original.sorted_entries(), copy.sorted_entries());
        }
    }
}
