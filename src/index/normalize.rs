//! Sorting and de-duplication of explicit index lists
//!
//! `C(I,J) = A` with an unsorted or duplicated `I` is defined as the
//! assignment with `I` sorted and only the last occurrence of each index kept,
//! the matching rows of `A` moving along. This is the same result as applying
//! the assignments one after another from left to right, and it is what lets
//! every output position be claimed by exactly one task.

use std::borrow::Cow;

use rayon::prelude::*;

use super::analyze::{from_list, ListProperties};
use super::{IndexKind, IndexSet};

/// A canonical selection and, when it had to be rebuilt, the permutation
/// back to the caller's positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized<'a> {
    pub set: IndexSet<'a>,
    /// `inverse[k]` is the position in the original list that now sits at `k`
    pub inverse: Option<Vec<usize>>,
}

impl Normalized<'_> {
    /// Whether the selection was rewritten
    pub fn changed(&self) -> bool {
        self.inverse.is_some()
    }
}

/// Sort and de-duplicate a selection, keeping the last occurrence of each index
///
/// A selection that is already canonical is returned as is, without copying.
pub fn normalize<'a>(set: &IndexSet<'a>) -> Normalized<'a> {
    if set.is_canonical() {
        return Normalized {
            set: set.clone(),
            inverse: None,
        };
    }
    debug_assert_eq!(set.kind, IndexKind::List);

    let mut pairs: Vec<(usize, usize)> = set
        .list
        .iter()
        .enumerate()
        .map(|(pos, &i)| (i, pos))
        .collect();
    pairs.par_sort_unstable();

    let mut values = Vec::with_capacity(pairs.len());
    let mut inverse = Vec::with_capacity(pairs.len());
    for (i, pos) in pairs {
        match (values.last(), inverse.last_mut()) {
            // same index seen later in the caller's list: it wins
            (Some(&prev), Some(last)) if prev == i => *last = pos,
            _ => {
                values.push(i);
                inverse.push(pos);
            }
        }
    }

    let props = ListProperties {
        min: values[0],
        max: values[values.len() - 1],
        unsorted: false,
        has_duplicates: false,
    };
    Normalized {
        set: from_list(Cow::Owned(values), props, set.limit),
        inverse: Some(inverse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{analyze, IndexList};
    use crate::matrix::config::AssignConfig;

    fn set(list: &[usize], limit: usize) -> IndexSet<'_> {
        analyze(IndexList::List(list), limit, &AssignConfig::default()).unwrap()
    }

    #[test]
    fn test_canonical_list_is_unchanged() {
        let list = [1, 4, 6];
        let s = set(&list, 10);
        let n = normalize(&s);
        assert!(!n.changed());
        assert_eq!(n.set, s);
        assert!(matches!(n.set.list, Cow::Borrowed(_)));
    }

    #[test]
    fn test_unsorted_list() {
        let list = [1, 0];
        let n = normalize(&set(&list, 2));
        assert_eq!(n.set.to_vec(), vec![0, 1]);
        assert_eq!(n.set.kind(), IndexKind::All);
        assert_eq!(n.inverse, Some(vec![1, 0]));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let list = [5, 2, 5, 9, 2];
        let n = normalize(&set(&list, 10));
        assert_eq!(n.set.to_vec(), vec![2, 5, 9]);
        assert_eq!(n.inverse, Some(vec![4, 2, 3]));
        assert!(n.set.is_canonical());
    }

    #[test]
    fn test_sorted_with_duplicates() {
        let list = [3, 3, 3];
        let n = normalize(&set(&list, 4));
        assert_eq!(n.set.to_vec(), vec![3]);
        assert_eq!(n.inverse, Some(vec![2]));
    }
}
