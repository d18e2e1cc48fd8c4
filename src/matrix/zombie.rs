//! Tombstoned row indices
//!
//! A deleted entry of a sparse or hypersparse matrix is not removed from
//! storage right away. Its row index is tagged as a zombie instead, which
//! keeps the vector sorted and lets a later kernel revive the slot in place.
//! [`Matrix::wait`](crate::Matrix::wait) compacts zombies away.

/// Row index of a stored entry, tagged with its liveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowIndex {
    /// A live entry in the given row
    Live(usize),
    /// A logically deleted entry that still occupies the slot for the given row
    Zombie(usize),
}

impl RowIndex {
    /// The row the slot belongs to, dead or alive
    #[inline]
    pub fn row(&self) -> usize {
        match *self {
            RowIndex::Live(i) | RowIndex::Zombie(i) => i,
        }
    }

    #[inline]
    pub fn is_zombie(&self) -> bool {
        matches!(self, RowIndex::Zombie(_))
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self, RowIndex::Live(_))
    }

    /// The same slot marked deleted
    #[inline]
    pub fn kill(self) -> Self {
        RowIndex::Zombie(self.row())
    }

    /// The same slot marked live
    #[inline]
    pub fn revive(self) -> Self {
        RowIndex::Live(self.row())
    }
}

impl From<usize> for RowIndex {
    fn from(i: usize) -> Self {
        RowIndex::Live(i)
    }
}

/// Binary search for `row` among `slots`, which must be sorted by row
///
/// Zombies are found as well; the caller decides what a zombie means.
#[inline]
pub fn find_row(slots: &[RowIndex], row: usize) -> Option<usize> {
    slots.binary_search_by_key(&row, RowIndex::row).ok()
}
