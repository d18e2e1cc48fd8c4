//! Index selections for the rows (`I`) and columns (`J`) of an assignment
//!
//! A user describes a selection with an [`IndexList`]. The analyzer resolves
//! it against a dimension into an [`IndexSet`], which knows its canonical kind,
//! length, extent and ordering. Unsorted or duplicated lists are normalized
//! before any kernel sees them.

pub mod analyze;
pub mod normalize;

use std::borrow::Cow;

pub use analyze::{analyze, ListProperties};
pub use normalize::{normalize, Normalized};

/// A user-supplied index selection
///
/// Ranges use inclusive colon notation: `Range { begin: 2, end: 4 }` selects
/// 2, 3 and 4. A range with `end < begin` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexList<'a> {
    /// Every index `0..limit`
    All,
    /// `begin:end`
    Range { begin: usize, end: usize },
    /// `begin:inc:end`; `inc` may be negative but not zero
    Stride { begin: usize, inc: isize, end: usize },
    /// Explicit indices in any order, duplicates allowed
    List(&'a [usize]),
}

impl<'a> From<&'a [usize]> for IndexList<'a> {
    fn from(list: &'a [usize]) -> Self {
        IndexList::List(list)
    }
}

impl<'a> From<&'a Vec<usize>> for IndexList<'a> {
    fn from(list: &'a Vec<usize>) -> Self {
        IndexList::List(list.as_slice())
    }
}

/// Canonical kind of a resolved selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    All,
    Range,
    Stride,
    List,
}

/// A resolved, bounds-checked index selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet<'a> {
    pub(crate) kind: IndexKind,
    pub(crate) len: usize,
    pub(crate) limit: usize,
    pub(crate) begin: usize,
    pub(crate) inc: isize,
    pub(crate) list: Cow<'a, [usize]>,
    pub(crate) min: usize,
    pub(crate) max: usize,
    pub(crate) unsorted: bool,
    pub(crate) has_duplicates: bool,
}

impl<'a> IndexSet<'a> {
    pub(crate) fn all(limit: usize) -> Self {
        Self {
            kind: IndexKind::All,
            len: limit,
            limit,
            begin: 0,
            inc: 1,
            list: Cow::Borrowed(&[]),
            min: 0,
            max: limit.saturating_sub(1),
            unsorted: false,
            has_duplicates: false,
        }
    }

    pub(crate) fn range(begin: usize, len: usize, limit: usize) -> Self {
        if len > 0 && begin == 0 && len == limit {
            return Self::all(limit);
        }
        Self {
            kind: IndexKind::Range,
            len,
            limit,
            begin,
            inc: 1,
            list: Cow::Borrowed(&[]),
            min: begin,
            max: (begin + len).saturating_sub(1),
            unsorted: false,
            has_duplicates: false,
        }
    }

    pub(crate) fn empty(limit: usize) -> Self {
        Self::range(0, 0, limit)
    }

    /// The selection's canonical kind
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Number of selected indices (duplicates included)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The dimension the selection indexes into
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Smallest selected index, if any
    pub fn min(&self) -> Option<usize> {
        (self.len > 0).then_some(self.min)
    }

    /// Largest selected index, if any
    pub fn max(&self) -> Option<usize> {
        (self.len > 0).then_some(self.max)
    }

    /// True for a LIST that is not in ascending order
    pub fn is_unsorted(&self) -> bool {
        self.unsorted
    }

    /// True for a LIST with a repeated index
    pub fn has_duplicates(&self) -> bool {
        self.has_duplicates
    }

    /// Whether kernels can run on this selection without normalization
    pub fn is_canonical(&self) -> bool {
        !self.unsorted && !self.has_duplicates
    }

    /// Whether `get` is strictly increasing in `k`
    pub fn is_ascending(&self) -> bool {
        self.is_canonical() && !(self.kind == IndexKind::Stride && self.inc < 0)
    }

    /// Whether the selection is every index of its dimension, in order
    pub fn is_all(&self) -> bool {
        self.kind == IndexKind::All
    }

    /// The `k`-th selected index
    #[inline]
    pub fn get(&self, k: usize) -> usize {
        debug_assert!(k < self.len);
        match self.kind {
            IndexKind::All => k,
            IndexKind::Range => self.begin + k,
            IndexKind::Stride => (self.begin as isize + k as isize * self.inc) as usize,
            IndexKind::List => self.list[k],
        }
    }

    /// Position `k` with `get(k) == i`
    ///
    /// Only meaningful on a canonical selection, where the position is unique.
    pub fn position(&self, i: usize) -> Option<usize> {
        if self.len == 0 || i < self.min || i > self.max {
            return None;
        }
        match self.kind {
            IndexKind::All => Some(i),
            IndexKind::Range => Some(i - self.begin),
            IndexKind::Stride => {
                let step = self.inc.unsigned_abs();
                let offset = if self.inc > 0 { i - self.begin } else { self.begin - i };
                (offset % step == 0).then(|| offset / step)
            }
            IndexKind::List => self.list.binary_search(&i).ok(),
        }
    }

    /// Positions `k` whose index lies in `lo..=hi`, as a range of positions
    ///
    /// Requires an ascending or descending canonical selection.
    pub(crate) fn positions_between(&self, lo: usize, hi: usize) -> std::ops::Range<usize> {
        let below = |k: usize| self.get(k) < lo;
        let at_most = |k: usize| self.get(k) <= hi;
        if self.len == 0 || lo > hi {
            return 0..0;
        }
        if self.is_ascending() {
            let start = partition_point(self.len, below);
            let end = partition_point(self.len, at_most);
            start..end.max(start)
        } else {
            // descending: indices above hi come first
            let start = partition_point(self.len, |k| self.get(k) > hi);
            let end = partition_point(self.len, |k| self.get(k) >= lo);
            start..end.max(start)
        }
    }

    /// Materialize the selection as an explicit list
    pub fn to_vec(&self) -> Vec<usize> {
        (0..self.len).map(|k| self.get(k)).collect()
    }
}

/// First `k` in `0..len` for which `pred` is false, `pred` being monotone
fn partition_point(len: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}
