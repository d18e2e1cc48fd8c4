//! Index-list analysis
//!
//! Resolves an [`IndexList`] against a dimension: computes the canonical kind,
//! the length, the extent and, for explicit lists, whether they are unsorted
//! or contain adjacent duplicates. Lists are scanned in parallel; the serial
//! scan is kept as the reference and debug builds check that both agree.

use std::borrow::Cow;

use rayon::prelude::*;
use tracing::trace;

use super::{IndexKind, IndexList, IndexSet};
use crate::error::{AssignError, Result};
use crate::matrix::config::AssignConfig;

/// Properties of an explicit index list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListProperties {
    pub min: usize,
    pub max: usize,
    /// Some element is smaller than its predecessor
    pub unsorted: bool,
    /// Some element equals its predecessor
    pub has_duplicates: bool,
}

/// Summary of one contiguous part of a list
#[derive(Debug, Clone, Copy)]
struct Part {
    first: usize,
    last: usize,
    props: ListProperties,
}

fn scan_part(part: &[usize]) -> Part {
    let mut props = ListProperties {
        min: part[0],
        max: part[0],
        unsorted: false,
        has_duplicates: false,
    };
    for w in part.windows(2) {
        let (prev, cur) = (w[0], w[1]);
        props.min = props.min.min(cur);
        props.max = props.max.max(cur);
        if cur < prev {
            props.unsorted = true;
        } else if cur == prev {
            props.has_duplicates = true;
        }
    }
    Part {
        first: part[0],
        last: part[part.len() - 1],
        props,
    }
}

fn merge_parts(parts: &[Part]) -> ListProperties {
    let mut acc = parts[0].props;
    for w in parts.windows(2) {
        let (left, right) = (&w[0], &w[1]);
        acc.min = acc.min.min(right.props.min);
        acc.max = acc.max.max(right.props.max);
        acc.unsorted |= right.props.unsorted || right.first < left.last;
        acc.has_duplicates |= right.props.has_duplicates || right.first == left.last;
    }
    acc
}

/// Scan a non-empty list on one thread
pub(crate) fn scan_serial(list: &[usize]) -> ListProperties {
    debug_assert!(!list.is_empty(), "cannot scan an empty list");
    scan_part(list).props
}

/// Scan a non-empty list in parts of `part_len` elements, in parallel
pub(crate) fn scan_parallel(list: &[usize], part_len: usize) -> ListProperties {
    debug_assert!(!list.is_empty(), "cannot scan an empty list");
    let parts: Vec<Part> = list
        .par_chunks(part_len.max(1))
        .map(scan_part)
        .collect();
    merge_parts(&parts)
}

fn scan(list: &[usize], config: &AssignConfig) -> ListProperties {
    let nthreads = config.nthreads_for_work(list.len());
    if nthreads <= 1 {
        return scan_serial(list);
    }
    let part_len = list.len().div_ceil(nthreads);
    let props = scan_parallel(list, part_len);
    debug_assert_eq!(props, scan_serial(list), "parallel and serial list scans disagree");
    props
}

/// Resolve `list` against a dimension of size `limit`
///
/// Degenerate selections are rewritten to a simpler kind without changing
/// the selected indices: a contiguous ascending LIST or a unit STRIDE becomes
/// a RANGE, and a RANGE covering the whole dimension becomes ALL.
///
/// # Errors
///
/// `IndexOutOfBounds` if a selected index is `>= limit`, `InvalidValue` for a
/// zero stride.
pub fn analyze<'a>(list: IndexList<'a>, limit: usize, config: &AssignConfig) -> Result<IndexSet<'a>> {
    let set = match list {
        IndexList::All => IndexSet::all(limit),
        IndexList::Range { begin, end } => {
            if end < begin {
                IndexSet::empty(limit)
            } else {
                check_bound(end, limit)?;
                IndexSet::range(begin, end - begin + 1, limit)
            }
        }
        IndexList::Stride { begin, inc, end } => analyze_stride(begin, inc, end, limit)?,
        IndexList::List(values) => analyze_list(values, limit, config)?,
    };
    trace!(kind = ?set.kind, len = set.len, limit, "index selection analyzed");
    Ok(set)
}

fn check_bound(index: usize, limit: usize) -> Result<()> {
    if index >= limit {
        return Err(AssignError::IndexOutOfBounds { index, limit });
    }
    Ok(())
}

fn analyze_stride(begin: usize, inc: isize, end: usize, limit: usize) -> Result<IndexSet<'static>> {
    if inc == 0 {
        return Err(AssignError::InvalidValue("stride increment must not be zero".into()));
    }
    let step = inc.unsigned_abs();
    // number of steps after `begin`; bounded by |end - begin| so nothing overflows
    let (span, last) = if inc > 0 {
        if end < begin {
            return Ok(IndexSet::empty(limit));
        }
        let span = (end - begin) / step;
        (span, begin + span * step)
    } else {
        if begin < end {
            return Ok(IndexSet::empty(limit));
        }
        let span = (begin - end) / step;
        (span, begin - span * step)
    };
    let (min, max) = (begin.min(last), begin.max(last));
    check_bound(max, limit)?;
    // max < limit, so span < limit
    let len = span + 1;
    if inc == 1 || len == 1 {
        return Ok(IndexSet::range(min, len, limit));
    }
    Ok(IndexSet {
        kind: IndexKind::Stride,
        len,
        limit,
        begin,
        inc,
        list: Cow::Borrowed(&[]),
        min,
        max,
        unsorted: false,
        has_duplicates: false,
    })
}

fn analyze_list<'a>(values: &'a [usize], limit: usize, config: &AssignConfig) -> Result<IndexSet<'a>> {
    if values.is_empty() {
        return Ok(IndexSet::empty(limit));
    }
    let props = scan(values, config);
    check_bound(props.max, limit)?;
    Ok(from_list(Cow::Borrowed(values), props, limit))
}

/// Build the set for a scanned list, collapsing contiguous runs to a RANGE
pub(crate) fn from_list(values: Cow<'_, [usize]>, props: ListProperties, limit: usize) -> IndexSet<'_> {
    let len = values.len();
    let contiguous = !props.unsorted && !props.has_duplicates && props.max - props.min + 1 == len;
    if contiguous {
        return IndexSet::range(props.min, len, limit);
    }
    IndexSet {
        kind: IndexKind::List,
        len,
        limit,
        begin: 0,
        inc: 1,
        list: values,
        min: props.min,
        max: props.max,
        unsorted: props.unsorted,
        has_duplicates: props.has_duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AssignConfig {
        AssignConfig::default()
    }

    #[test]
    fn test_list_properties() {
        let p = scan_serial(&[3, 1, 4, 1, 5]);
        assert_eq!(p.min, 1);
        assert_eq!(p.max, 5);
        assert!(p.unsorted);
        assert!(!p.has_duplicates);

        let p = scan_serial(&[1, 2, 2, 7]);
        assert!(!p.unsorted);
        assert!(p.has_duplicates);
    }

    #[test]
    fn test_parallel_scan_matches_serial() {
        let lists: Vec<Vec<usize>> = vec![
            (0..100).collect(),
            (0..100).rev().collect(),
            vec![5, 5, 6, 7, 8, 9, 9, 10],
            vec![1, 2, 3, 3, 4, 5],
            vec![1, 2, 3, 2, 4, 5],
        ];
        for list in &lists {
            for part_len in 1..=list.len() {
                assert_eq!(
                    scan_parallel(list, part_len),
                    scan_serial(list),
                    "list {:?} part_len {}",
                    list,
                    part_len
                );
            }
        }
    }

    #[test]
    fn test_duplicate_across_part_boundary() {
        // split into [1, 2] [2, 3]: the duplicate straddles the boundary
        let p = scan_parallel(&[1, 2, 2, 3], 2);
        assert!(p.has_duplicates);
        let p = scan_parallel(&[1, 3, 2, 4], 2);
        assert!(p.unsorted);
    }

    #[test]
    fn test_contiguous_list_becomes_range_or_all() {
        let list = [0, 1, 2];
        let set = analyze(IndexList::List(&list), 3, &cfg()).unwrap();
        assert_eq!(set.kind(), IndexKind::All);

        let list = [2, 3, 4];
        let set = analyze(IndexList::List(&list), 10, &cfg()).unwrap();
        assert_eq!(set.kind(), IndexKind::Range);
        assert_eq!(set.to_vec(), vec![2, 3, 4]);

        let list = [2, 4, 5];
        let set = analyze(IndexList::List(&list), 10, &cfg()).unwrap();
        assert_eq!(set.kind(), IndexKind::List);
    }

    #[test]
    fn test_stride_degenerates() {
        let set = analyze(IndexList::Stride { begin: 1, inc: 1, end: 3 }, 5, &cfg()).unwrap();
        assert_eq!(set.kind(), IndexKind::Range);
        assert_eq!(set.to_vec(), vec![1, 2, 3]);

        let set = analyze(IndexList::Stride { begin: 0, inc: 2, end: 7 }, 8, &cfg()).unwrap();
        assert_eq!(set.kind(), IndexKind::Stride);
        assert_eq!(set.to_vec(), vec![0, 2, 4, 6]);

        let set = analyze(IndexList::Stride { begin: 7, inc: -3, end: 0 }, 8, &cfg()).unwrap();
        assert_eq!(set.to_vec(), vec![7, 4, 1]);
        assert_eq!(set.min(), Some(1));
        assert_eq!(set.max(), Some(7));

        let set = analyze(IndexList::Stride { begin: 0, inc: 2, end: 7 }, 8, &cfg()).unwrap();
        assert!(set.is_ascending());
    }

    #[test]
    fn test_empty_selections() {
        assert!(analyze(IndexList::Range { begin: 3, end: 2 }, 2, &cfg()).unwrap().is_empty());
        assert!(analyze(IndexList::Stride { begin: 0, inc: -1, end: 2 }, 4, &cfg()).unwrap().is_empty());
        assert!(analyze(IndexList::List(&[]), 4, &cfg()).unwrap().is_empty());
    }

    #[test]
    fn test_bounds_and_zero_stride() {
        let err = analyze(IndexList::List(&[0, 9]), 5, &cfg()).unwrap_err();
        assert_eq!(err, AssignError::IndexOutOfBounds { index: 9, limit: 5 });

        let err = analyze(IndexList::Range { begin: 0, end: 5 }, 5, &cfg()).unwrap_err();
        assert_eq!(err, AssignError::IndexOutOfBounds { index: 5, limit: 5 });

        let err = analyze(IndexList::Stride { begin: 0, inc: 0, end: 3 }, 5, &cfg()).unwrap_err();
        assert!(matches!(err, AssignError::InvalidValue(_)));
    }

    #[test]
    fn test_stride_reaching_past_the_end() {
        let err = analyze(IndexList::Stride { begin: 0, inc: 1, end: usize::MAX }, 4, &cfg()).unwrap_err();
        assert_eq!(err, AssignError::IndexOutOfBounds { index: usize::MAX, limit: 4 });

        let err = analyze(IndexList::Stride { begin: 1, inc: 2, end: usize::MAX }, 4, &cfg()).unwrap_err();
        assert_eq!(err, AssignError::IndexOutOfBounds { index: usize::MAX, limit: 4 });

        let err = analyze(IndexList::Stride { begin: usize::MAX, inc: -1, end: 0 }, 4, &cfg()).unwrap_err();
        assert_eq!(err, AssignError::IndexOutOfBounds { index: usize::MAX, limit: 4 });

        let set = analyze(IndexList::Stride { begin: 3, inc: isize::MIN, end: 0 }, 4, &cfg()).unwrap();
        assert_eq!(set.to_vec(), vec![3]);

        // the last step lands inside even though `end` does not
        let set = analyze(IndexList::Stride { begin: 0, inc: 3, end: 5 }, 4, &cfg()).unwrap();
        assert_eq!(set.to_vec(), vec![0, 3]);
    }
}
