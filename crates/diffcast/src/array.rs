#![forbid(unsafe_code)]

//! Vector-specialized mutation helpers producing [`ArrayDiff`] envelopes.
//!
//! Each helper is a thin wrapper over [`DiffSubject::try_mutate`]: one
//! structural edit, one matching diff variant, all under the same held lock,
//! so no observer ever sees a value whose structure disagrees with the diff
//! accompanying it. Bounds are checked before any edit, so a failed call
//! leaves the vector untouched and emits nothing.
//!
//! The helpers are an inherent impl on `DiffSubject<Vec<T>, ArrayDiff<T>>`
//! only; instantiating the subject with any other value/diff pairing simply
//! doesn't have them.

use crate::subject::DiffSubject;

/// One atomic structural change to a vector.
///
/// Index validity is relative to the moment the edit was applied: an insert
/// index is valid in the resulting vector, a remove index in the prior one.
/// Consumers are expected to match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayDiff<T> {
    /// `element` was inserted at `index`.
    Insert { index: usize, element: T },
    /// `element` was removed from `index`.
    Remove { index: usize, element: T },
    /// `element` was removed from `from` and re-inserted at `to`.
    Move { from: usize, to: usize, element: T },
    /// The element at `index` changed from `old` to `new`.
    Replace { index: usize, old: T, new: T },
}

/// Which helper rejected an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsOp {
    Insert,
    Remove,
    MoveFrom,
    MoveTo,
    Replace,
}

/// An index outside the valid range for the requested operation.
///
/// `len` is the vector length at the time of the check (for
/// [`BoundsOp::MoveTo`], the length *before* the removal half of the move).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsError {
    pub op: BoundsOp,
    pub index: usize,
    pub len: usize,
}

impl std::fmt::Display for BoundsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { op, index, len } = self;
        match op {
            BoundsOp::Insert => {
                write!(f, "insert index {index} out of bounds (len {len}, valid 0..={len})")
            }
            BoundsOp::Remove => write!(f, "remove index {index} out of bounds (len {len})"),
            BoundsOp::MoveFrom => write!(f, "move source index {index} out of bounds (len {len})"),
            BoundsOp::MoveTo => write!(
                f,
                "move destination index {index} out of bounds (len {len}, valid 0..={})",
                len.saturating_sub(1)
            ),
            BoundsOp::Replace => write!(f, "replace index {index} out of bounds (len {len})"),
        }
    }
}

impl std::error::Error for BoundsError {}

/// A subject over a vector, reporting [`ArrayDiff`] changes.
pub type ArraySubject<T> = DiffSubject<Vec<T>, ArrayDiff<T>>;

impl<T: Clone + Send + 'static> DiffSubject<Vec<T>, ArrayDiff<T>> {
    /// Insert `element` at `index` and broadcast
    /// [`ArrayDiff::Insert`].
    ///
    /// `index` may be anywhere from 0 to the current length inclusive.
    pub fn insert(&self, element: T, index: usize) -> Result<(), BoundsError> {
        self.try_mutate(|items| {
            if index > items.len() {
                return Err(BoundsError {
                    op: BoundsOp::Insert,
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, element.clone());
            Ok(ArrayDiff::Insert { index, element })
        })
    }

    /// Remove the element at `index` and broadcast [`ArrayDiff::Remove`]
    /// carrying the removed element.
    pub fn remove_at(&self, index: usize) -> Result<(), BoundsError> {
        self.try_mutate(|items| {
            if index >= items.len() {
                return Err(BoundsError {
                    op: BoundsOp::Remove,
                    index,
                    len: items.len(),
                });
            }
            let element = items.remove(index);
            Ok(ArrayDiff::Remove { index, element })
        })
    }

    /// Move the element at `from` to `to` and broadcast [`ArrayDiff::Move`].
    ///
    /// This is a literal remove-then-insert: `to` is an insertion point in
    /// the one-shorter intermediate vector, so for an n-element vector the
    /// valid destinations are `0..=n-1` and moving to the end means
    /// `to = n - 1`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<(), BoundsError> {
        self.try_mutate(|items| {
            if from >= items.len() {
                return Err(BoundsError {
                    op: BoundsOp::MoveFrom,
                    index: from,
                    len: items.len(),
                });
            }
            if to >= items.len() {
                return Err(BoundsError {
                    op: BoundsOp::MoveTo,
                    index: to,
                    len: items.len(),
                });
            }
            let element = items.remove(from);
            items.insert(to, element.clone());
            Ok(ArrayDiff::Move { from, to, element })
        })
    }

    /// Replace the element at `index` with `new` and broadcast
    /// [`ArrayDiff::Replace`] carrying both the old and the new element.
    pub fn replace_at(&self, index: usize, new: T) -> Result<(), BoundsError> {
        self.try_mutate(|items| {
            if index >= items.len() {
                return Err(BoundsError {
                    op: BoundsOp::Replace,
                    index,
                    len: items.len(),
                });
            }
            let old = std::mem::replace(&mut items[index], new.clone());
            Ok(ArrayDiff::Replace { index, old, new })
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
