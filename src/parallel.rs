//! # Parallel task execution
//!
//! Every parallel step in the crate has the same shape: a statically
//! computed list of tasks, each owning a disjoint piece of the output, run
//! with Rayon and joined before the call returns. The helpers here hand out
//! those disjoint pieces as ordinary `&mut` slices, so no task ever needs a
//! lock, an atomic or a raw pointer.

use std::ops::Range;

use rayon::prelude::*;

use crate::error::{AssignError, Result};

/// Runs `f` on every item, in parallel when more than one thread is allowed
///
/// Results come back in item order. The first error aborts the whole run.
///
/// # Arguments
///
/// * `items` - One entry per task
/// * `nthreads` - Upper bound on the threads worth using
/// * `f` - The task body
pub fn run_tasks<I, R, F>(items: Vec<I>, nthreads: usize, f: F) -> Result<Vec<R>>
where
    I: Send,
    R: Send,
    F: Fn(I) -> Result<R> + Sync + Send,
{
    if nthreads <= 1 || items.len() <= 1 {
        items.into_iter().map(f).collect()
    } else {
        items.into_par_iter().map(f).collect()
    }
}

/// Splits `slice` into one sub-slice per range, in range order
///
/// Ranges may come in any order but must not overlap; empty ranges get an
/// empty slice.
///
/// # Errors
///
/// `Internal` if two non-empty ranges overlap or a range is out of bounds.
pub fn split_disjoint_mut<'a, T>(
    slice: &'a mut [T],
    ranges: &[Range<usize>],
) -> Result<Vec<&'a mut [T]>> {
    let total = slice.len();
    let mut order: Vec<usize> = (0..ranges.len()).filter(|&t| !ranges[t].is_empty()).collect();
    order.sort_unstable_by_key(|&t| ranges[t].start);

    let mut parts: Vec<Option<&'a mut [T]>> = (0..ranges.len()).map(|_| None).collect();
    let mut rest: &'a mut [T] = slice;
    let mut offset = 0;
    for t in order {
        let r = &ranges[t];
        if r.start < offset || r.end > total {
            return Err(AssignError::Internal(format!(
                "task range {:?} overlaps another task or exceeds {} slots",
                r, total
            )));
        }
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(r.start - offset);
        let (mine, tail) = tail.split_at_mut(r.len());
        parts[t] = Some(mine);
        rest = tail;
        offset = r.end;
    }
    Ok(parts.into_iter().map(Option::unwrap_or_default).collect())
}

/// Splits `slice` into consecutive pieces of the given lengths
///
/// # Errors
///
/// `Internal` if the lengths do not add up to `slice.len()`.
pub fn split_by_counts<'a, T>(slice: &'a mut [T], counts: &[usize]) -> Result<Vec<&'a mut [T]>> {
    let sum: usize = counts.iter().sum();
    if sum != slice.len() {
        return Err(AssignError::Internal(format!(
            "{} slots split into pieces totalling {}",
            slice.len(),
            sum
        )));
    }
    let mut parts = Vec::with_capacity(counts.len());
    let mut rest = slice;
    for &n in counts {
        let (mine, tail) = std::mem::take(&mut rest).split_at_mut(n);
        parts.push(mine);
        rest = tail;
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_tasks_keeps_order() {
        let out = run_tasks((0..100).collect(), 4, |i: usize| Ok(i * 2)).unwrap();
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());

        let serial = run_tasks(vec![3, 1], 1, |i: usize| Ok(i + 1)).unwrap();
        assert_eq!(serial, vec![4, 2]);
    }

    #[test]
    fn test_run_tasks_propagates_errors() {
        let res = run_tasks(vec![1, 2, 3], 2, |i: usize| {
            if i == 2 {
                Err(AssignError::Internal("boom".into()))
            } else {
                Ok(i)
            }
        });
        assert!(res.is_err());
    }

    #[test]
    fn test_split_disjoint_mut_any_order() {
        let mut data: Vec<usize> = (0..10).collect();
        let parts = split_disjoint_mut(&mut data, &[6..9, 0..2, 4..4, 2..5]).unwrap();
        assert_eq!(parts[0], &[6, 7, 8]);
        assert_eq!(parts[1], &[0, 1]);
        assert!(parts[2].is_empty());
        assert_eq!(parts[3], &[2, 3, 4]);
        for part in parts {
            for v in part.iter_mut() {
                *v += 100;
            }
        }
        assert_eq!(data[5], 5);
        assert_eq!(data[9], 9);
        assert_eq!(data[6], 106);
    }

    #[test]
    fn test_split_disjoint_mut_rejects_overlap() {
        let mut data = vec![0u8; 10];
        assert!(matches!(
            split_disjoint_mut(&mut data, &[0..5, 4..6]),
            Err(AssignError::Internal(_))
        ));
        assert!(split_disjoint_mut(&mut data, &[8..11]).is_err());
    }

    #[test]
    fn test_split_by_counts() {
        let mut data = vec![1, 2, 3, 4, 5];
        let parts = split_by_counts(&mut data, &[2, 0, 3]).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], &[3, 4, 5]);
        assert!(split_by_counts(&mut data, &[1]).is_err());
    }
}
