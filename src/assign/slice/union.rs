//! Slicing over the union of two patterns
//!
//! The driver is always the symbolic pattern `S`; the other list is `A` or
//! `M`. A vector has work if either of them has entries in it.

use std::ops::Range;

use tracing::trace;

use super::{group, with_outputs, Pattern, TaskPlan, VectorSpan};
use crate::assign::symbolic::SymbolicPattern;
use crate::index::IndexSet;
use crate::matrix::{AssignConfig, RowIndex};

/// Plan a merged traversal of `S` and `other`
pub fn slice<Q: Pattern>(
    s: &SymbolicPattern,
    other: &Q,
    rows: &IndexSet<'_>,
    c_cols: &[Range<usize>],
    c_rows: &[RowIndex],
    config: &AssignConfig,
) -> TaskPlan {
    let from_s = (0..s.nvectors()).filter(|&ja| !s.vector(ja).is_empty());
    let mut from_other = (0..other.nvectors())
        .filter(|&k| !other.entries(k).is_empty())
        .map(|k| other.vector_id(k))
        .peekable();

    let mut ids = Vec::new();
    for ja in from_s {
        while let Some(&o) = from_other.peek() {
            if o >= ja {
                break;
            }
            ids.push(o);
            from_other.next();
        }
        if from_other.peek() == Some(&ja) {
            from_other.next();
        }
        ids.push(ja);
    }
    ids.extend(from_other);

    let vectors: Vec<VectorSpan> = ids
        .into_iter()
        .map(|ja| VectorSpan {
            ja,
            driver: s.vector(ja),
            other: other.entries_of(ja),
        })
        .collect();

    let work: usize = vectors.iter().map(|v| v.driver.len() + v.other.len()).sum();
    let ntasks = config.ntasks_for_work(work);
    let kinds = group(&vectors, rows.len(), ntasks, s, other);
    let tasks = with_outputs(kinds, &vectors, c_cols, c_rows, rows);
    trace!(ntasks = tasks.len(), nvec = vectors.len(), work, "union tasks");
    TaskPlan { vectors, tasks }
}
