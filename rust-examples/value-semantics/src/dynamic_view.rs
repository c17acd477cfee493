//! Dynamic Views: Slices over Shared Backing Storage
//!
//! A [`SliceView`] is a descriptor `(backing, offset, len, cap)`. Cloning it
//! copies the descriptor only, so two views can see, and write, the same
//! elements. Appending writes in place while there is headroom; once the
//! capacity is exhausted a fresh backing is allocated and the new view no
//! longer aliases the old one.
//!
//! # Key Rust Concepts
//!
//! - `Rc<RefCell<Vec<T>>>`: one backing store, many descriptors
//! - `&self` mutation: writes go through the shared storage, not the descriptor
//! - Rust's own `&mut [T]` forbids two live writable views; this type models
//!   the aliasing that the borrow checker normally rules out
//!
//! # Example
//!
//! ```
//! use value_semantics::dynamic_view::SliceView;
//!
//! let numbers = SliceView::from_vec(vec![0, 1, 2, 3, 4, 5]);
//! let sub = numbers.slice(1..4).unwrap();
//! assert_eq!(sub.to_vec(), vec![1, 2, 3]);
//!
//! sub.set(0, 999).unwrap();
//! assert_eq!(numbers.to_vec(), vec![0, 999, 2, 3, 4, 5]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use semantics_common::{Expectation, Fault, Kind, Lesson, Observation};
use tracing::debug;

/// A window onto a shared backing store.
pub struct SliceView<T> {
    backing: Rc<RefCell<Vec<T>>>,
    offset: usize,
    len: usize,
    cap: usize,
}

// Cloning copies the descriptor, never the elements.
impl<T> Clone for SliceView<T> {
    fn clone(&self) -> Self {
        Self {
            backing: Rc::clone(&self.backing),
            offset: self.offset,
            len: self.len,
            cap: self.cap,
        }
    }
}

impl<T> SliceView<T> {
    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Elements that fit before an append must reallocate.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// True if both views write into the same backing store.
    pub fn shares_storage_with(&self, other: &SliceView<T>) -> bool {
        Rc::ptr_eq(&self.backing, &other.backing)
    }

    /// Sub-view `range` of this view. The end may reach into the capacity.
    pub fn slice(&self, range: Range<usize>) -> Result<Self, Fault> {
        if range.start > range.end || range.end > self.cap {
            return Err(Fault::OutOfBounds {
                index: range.end.max(range.start),
                len: self.cap,
            });
        }
        Ok(Self {
            backing: Rc::clone(&self.backing),
            offset: self.offset + range.start,
            len: range.end - range.start,
            cap: self.cap - range.start,
        })
    }

    /// Overwrites element `index`, visible to every view sharing the store.
    pub fn set(&self, index: usize, value: T) -> Result<(), Fault> {
        self.check(index)?;
        self.backing.borrow_mut()[self.offset + index] = value;
        Ok(())
    }

    fn check(&self, index: usize) -> Result<(), Fault> {
        if index < self.len {
            Ok(())
        } else {
            Err(Fault::OutOfBounds {
                index,
                len: self.len,
            })
        }
    }
}

impl<T: Clone> SliceView<T> {
    /// Wraps `values` as a full view: length and capacity both `values.len()`.
    pub fn from_vec(values: Vec<T>) -> Self {
        let len = values.len();
        Self {
            backing: Rc::new(RefCell::new(values)),
            offset: 0,
            len,
            cap: len,
        }
    }

    pub fn get(&self, index: usize) -> Result<T, Fault> {
        self.check(index)?;
        Ok(self.backing.borrow()[self.offset + index].clone())
    }

    /// Snapshot of the visible elements.
    pub fn to_vec(&self) -> Vec<T> {
        self.backing.borrow()[self.offset..self.offset + self.len].to_vec()
    }

    /// Copies `min(self.len(), src.len())` elements from `src`, returning the count.
    ///
    /// Overlapping views are handled: the source is read in full before writing.
    pub fn copy_from(&self, src: &SliceView<T>) -> usize {
        let count = self.len.min(src.len);
        let values = src.to_vec();
        let mut backing = self.backing.borrow_mut();
        for (slot, value) in backing[self.offset..self.offset + count]
            .iter_mut()
            .zip(values)
        {
            *slot = value;
        }
        count
    }

    /// An independent copy with its own backing store.
    pub fn detach(&self) -> Self {
        Self::from_vec(self.to_vec())
    }
}

impl<T: Clone + Default> SliceView<T> {
    /// `len` default elements in a backing store of `cap`.
    pub fn with_capacity(len: usize, cap: usize) -> Result<Self, Fault> {
        if len > cap {
            return Err(Fault::OutOfBounds { index: len, len: cap });
        }
        Ok(Self {
            backing: Rc::new(RefCell::new(vec![T::default(); cap])),
            offset: 0,
            len,
            cap,
        })
    }

    /// Returns a view one element longer.
    ///
    /// With headroom the value is written into the shared store, overwriting
    /// whatever another view had at that position. Without headroom the
    /// elements move to a new store of twice the capacity (at least 1), and
    /// the result no longer aliases `self`.
    #[must_use = "append returns the grown view; the receiver keeps its old length"]
    pub fn append(&self, value: T) -> Self {
        if self.len < self.cap {
            self.backing.borrow_mut()[self.offset + self.len] = value;
            return Self {
                len: self.len + 1,
                ..self.clone()
            };
        }

        let new_cap = (self.cap * 2).max(1);
        debug!(
            old_capacity = self.cap,
            new_capacity = new_cap,
            "append exceeded capacity, reallocating backing storage"
        );
        let mut fresh = Vec::with_capacity(new_cap);
        fresh.extend_from_slice(&self.backing.borrow()[self.offset..self.offset + self.len]);
        fresh.push(value);
        fresh.resize(new_cap, T::default());
        Self {
            backing: Rc::new(RefCell::new(fresh)),
            offset: 0,
            len: self.len + 1,
            cap: new_cap,
        }
    }

    /// Appends every value in turn.
    #[must_use = "extend returns the grown view; the receiver keeps its old length"]
    pub fn extend(&self, values: impl IntoIterator<Item = T>) -> Self {
        values
            .into_iter()
            .fold(self.clone(), |view, value| view.append(value))
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for SliceView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (len {}, cap {})", self.to_vec(), self.len, self.cap)
    }
}

// ============================================================================
// Lessons
// ============================================================================

/// Sub-view `1..4` of `[0..=5]`, then `sub[0] = 999`: the backing store sees it.
pub fn subview_aliasing() -> Result<Observation<Vec<i64>>, Fault> {
    let numbers = SliceView::from_vec(vec![0, 1, 2, 3, 4, 5]);
    let before = numbers.to_vec();

    let sub = numbers.slice(1..4)?;
    sub.set(0, 999)?;

    Ok(Observation {
        before,
        original: numbers.to_vec(),
        alias: sub.to_vec(),
    })
}

/// Assigning a view to another variable copies only the descriptor.
pub fn descriptor_copy() -> Result<Observation<Vec<i64>>, Fault> {
    let original = SliceView::from_vec(vec![10, 20, 30]);
    let before = original.to_vec();

    let copy = original.clone();
    copy.set(2, 300)?;

    Ok(Observation {
        before,
        original: original.to_vec(),
        alias: copy.to_vec(),
    })
}

/// Appending with headroom keeps the new view on the same store.
pub fn append_within_capacity() -> Result<Observation<Vec<i64>>, Fault> {
    let original = SliceView::<i64>::with_capacity(3, 6)?;
    let before = original.to_vec();

    let grown = original.append(4);
    grown.set(0, 100)?;

    Ok(Observation {
        before,
        original: original.to_vec(),
        alias: grown.to_vec(),
    })
}

/// Appending past capacity reallocates; later writes no longer reach the original.
pub fn append_beyond_capacity() -> Result<Observation<Vec<i64>>, Fault> {
    let original = SliceView::from_vec(vec![1, 2, 3]);
    let before = original.to_vec();

    let grown = original.append(4);
    grown.set(0, 100)?;

    Ok(Observation {
        before,
        original: original.to_vec(),
        alias: grown.to_vec(),
    })
}

/// Appending to a short sub-view overwrites the parent's next element.
pub fn append_overwrites_parent() -> Result<Observation<Vec<i64>>, Fault> {
    let numbers = SliceView::from_vec(vec![0, 1, 2, 3, 4, 5]);
    let before = numbers.to_vec();

    let head = numbers.slice(0..2)?;
    let head = head.append(42);

    Ok(Observation {
        before,
        original: numbers.to_vec(),
        alias: head.to_vec(),
    })
}

/// `detach` gives the sub-view its own store, so writes stay local.
pub fn detached_copy() -> Result<Observation<Vec<i64>>, Fault> {
    let numbers = SliceView::from_vec(vec![0, 1, 2, 3, 4, 5]);
    let before = numbers.to_vec();

    let sub = numbers.slice(1..4)?.detach();
    sub.set(0, 999)?;

    Ok(Observation {
        before,
        original: numbers.to_vec(),
        alias: sub.to_vec(),
    })
}

/// Appends `40` and `50` to `[10, 20, 30]`, returning the final length and capacity.
pub fn growth() -> (usize, usize) {
    let view = SliceView::from_vec(vec![10, 20, 30]).extend([40, 50]);
    (view.len(), view.capacity())
}

/// The dynamic-view lesson.
pub fn demonstrate() -> Result<Lesson, Fault> {
    let (len, cap) = growth();
    Ok(Lesson::new(Kind::DynamicView)
        .note(format!(
            "append 40, 50 to [10, 20, 30]: len {len}, cap {cap}"
        ))
        .finding(
            "sub-view write reaches the backing store",
            Expectation::Aliased,
            &subview_aliasing()?,
        )
        .finding(
            "assignment copies the descriptor only",
            Expectation::Aliased,
            &descriptor_copy()?,
        )
        .finding(
            "append with headroom stays on the same store",
            Expectation::Aliased,
            &append_within_capacity()?,
        )
        .finding(
            "append past capacity reallocates and breaks aliasing",
            Expectation::Isolated,
            &append_beyond_capacity()?,
        )
        .finding(
            "append on a short sub-view overwrites the parent",
            Expectation::Aliased,
            &append_overwrites_parent()?,
        )
        .finding(
            "detached copy owns its elements",
            Expectation::Isolated,
            &detached_copy()?,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_subview_scenario() {
        let obs = subview_aliasing().unwrap();
        assert_eq!(obs.before, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(obs.alias, vec![999, 2, 3]);
        assert_eq!(obs.original, vec![0, 999, 2, 3, 4, 5]);
    }

    #[test]
    fn test_slice_bounds() {
        let numbers = SliceView::from_vec(vec![0, 1, 2, 3, 4, 5]);
        let sub = numbers.slice(1..4).unwrap();
        assert_eq!((sub.len(), sub.capacity()), (3, 5));
        assert_eq!(sub.to_vec(), vec![1, 2, 3]);

        // Re-slicing into the capacity is allowed
        assert_eq!(sub.slice(0..5).unwrap().to_vec(), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            sub.slice(0..6).unwrap_err(),
            Fault::OutOfBounds { index: 6, len: 5 }
        );
        assert!(numbers.slice(4..2).is_err());
    }

    #[test]
    fn test_get_set_bounds() {
        let view = SliceView::from_vec(vec![1, 2, 3]);
        assert_eq!(view.get(2), Ok(3));
        assert_eq!(view.get(3), Err(Fault::OutOfBounds { index: 3, len: 3 }));
        assert_eq!(
            view.set(7, 0),
            Err(Fault::OutOfBounds { index: 7, len: 3 })
        );
    }

    #[test]
    fn test_append_growth() {
        let view = SliceView::from_vec(vec![10, 20, 30]);
        let view = view.append(40);
        let view = view.append(50);
        assert_eq!(view.to_vec(), vec![10, 20, 30, 40, 50]);
        assert_eq!((view.len(), view.capacity()), (5, 6));
        assert_eq!(growth(), (5, 6));
    }

    #[test]
    fn test_extend_reallocates_once_headroom_is_gone() {
        let original = SliceView::<i64>::with_capacity(1, 2).unwrap();
        let grown = original.extend([5, 6, 7]);
        assert_eq!(grown.to_vec(), vec![0, 5, 6, 7]);
        assert_eq!(grown.capacity(), 4);
        assert!(!grown.shares_storage_with(&original));
        // The write that fit before reallocation landed in the original store
        assert_eq!(original.slice(0..2).unwrap().to_vec(), vec![0, 5]);
    }

    #[test]
    fn test_append_to_empty() {
        let view = SliceView::<i64>::from_vec(Vec::new());
        assert!(view.is_empty());
        let view = view.append(1);
        assert_eq!((view.len(), view.capacity()), (1, 1));
    }

    #[test]
    fn test_append_receiver_keeps_length() {
        let original = SliceView::<i64>::with_capacity(2, 4).unwrap();
        let grown = original.append(7);
        assert_eq!(original.len(), 2);
        assert_eq!(grown.len(), 3);
        assert!(grown.shares_storage_with(&original));
    }

    #[test]
    fn test_append_beyond_capacity_breaks_aliasing() {
        let obs = append_beyond_capacity().unwrap();
        assert_eq!(obs.original, vec![1, 2, 3]);
        assert_eq!(obs.alias, vec![100, 2, 3, 4]);
        assert!(!obs.propagated());
    }

    #[test]
    fn test_append_within_capacity_aliases() {
        let obs = append_within_capacity().unwrap();
        assert_eq!(obs.original, vec![100, 0, 0]);
        assert_eq!(obs.alias, vec![100, 0, 0, 4]);
    }

    #[test]
    fn test_append_overwrites_parent() {
        let obs = append_overwrites_parent().unwrap();
        assert_eq!(obs.alias, vec![0, 1, 42]);
        assert_eq!(obs.original, vec![0, 1, 42, 3, 4, 5]);
    }

    #[test]
    fn test_copy_from() {
        let dst = SliceView::from_vec(vec![0; 3]);
        let src = SliceView::from_vec(vec![7, 8, 9, 10]);
        assert_eq!(dst.copy_from(&src), 3);
        assert_eq!(dst.to_vec(), vec![7, 8, 9]);
        assert!(!dst.shares_storage_with(&src));
    }

    #[test]
    fn test_copy_from_overlapping() {
        let numbers = SliceView::from_vec(vec![1, 2, 3, 4, 5]);
        let tail = numbers.slice(1..5).unwrap();
        assert_eq!(numbers.copy_from(&tail), 4);
        assert_eq!(numbers.to_vec(), vec![2, 3, 4, 5, 5]);
    }

    #[test]
    fn test_with_capacity_rejects_len_over_cap() {
        assert!(SliceView::<i64>::with_capacity(4, 3).is_err());
    }

    #[test]
    fn test_debug_shows_len_and_cap() {
        let view = SliceView::from_vec(vec![1, 2]);
        assert_eq!(format!("{view:?}"), "[1, 2] (len 2, cap 2)");
    }

    #[test]
    fn test_demonstrate_holds() {
        let lesson = demonstrate().unwrap();
        assert_eq!(lesson.findings.len(), 6);
        assert!(lesson.holds());
        assert_eq!(lesson.notes, vec!["append 40, 50 to [10, 20, 30]: len 5, cap 6"]);
    }

    proptest! {
        #[test]
        fn prop_subview_write_reaches_backing(
            values in prop::collection::vec(any::<i64>(), 1..32),
            start_seed in any::<usize>(),
            len_seed in any::<usize>(),
            value in any::<i64>(),
        ) {
            let start = start_seed % values.len();
            let end = start + 1 + len_seed % (values.len() - start);
            let backing = SliceView::from_vec(values.clone());
            let sub = backing.slice(start..end).unwrap();

            sub.set(0, value).unwrap();

            let mut expected = values;
            expected[start] = value;
            prop_assert_eq!(backing.to_vec(), expected);
        }

        #[test]
        fn prop_full_view_append_breaks_aliasing(
            values in prop::collection::vec(any::<i64>(), 0..32),
            appended in any::<i64>(),
            value in any::<i64>(),
        ) {
            let original = SliceView::from_vec(values.clone());
            let grown = original.append(appended);
            grown.set(0, value).unwrap();

            prop_assert!(!grown.shares_storage_with(&original));
            prop_assert_eq!(original.to_vec(), values);
        }
    }
}
