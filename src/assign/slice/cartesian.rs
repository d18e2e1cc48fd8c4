//! Slicing the full index space `I × J`
//!
//! Used by the methods that must visit every position of `C(I,J)`. The work
//! of a position is constant, so the split is by count: whole columns when
//! there are at least as many columns as tasks, row bands otherwise.

use std::ops::Range;

use tracing::trace;

use super::{fine_tasks, with_outputs, Pattern, TaskKind, TaskPlan, VectorSpan};
use crate::assign::symbolic::SymbolicPattern;
use crate::constants::MIN_FINE_TASKS_PER_VECTOR;
use crate::index::IndexSet;
use crate::matrix::{AssignConfig, RowIndex};

/// The positions `0..|I|` themselves, as a pattern
struct Positions;

impl Pattern for Positions {
    fn nvectors(&self) -> usize {
        0
    }

    fn vector_id(&self, k: usize) -> usize {
        k
    }

    fn entries(&self, _k: usize) -> Range<usize> {
        0..0
    }

    fn entries_of(&self, _ja: usize) -> Range<usize> {
        0..0
    }

    fn ia(&self, pos: usize) -> usize {
        pos
    }
}

/// Plan a traversal of every position of `I × J`
///
/// With a symbolic pattern, each task also gets the entries of `S` in its
/// band.
pub fn slice(
    rows: &IndexSet<'_>,
    cols: &IndexSet<'_>,
    s: Option<&SymbolicPattern>,
    c_cols: &[Range<usize>],
    c_rows: &[RowIndex],
    config: &AssignConfig,
) -> TaskPlan {
    let (ni, nj) = (rows.len(), cols.len());
    if ni == 0 || nj == 0 {
        return TaskPlan::default();
    }
    let vectors: Vec<VectorSpan> = (0..nj)
        .map(|ja| VectorSpan {
            ja,
            driver: 0..ni,
            other: s.map_or(0..0, |s| s.vector(ja)),
        })
        .collect();

    let ntasks = config.ntasks_for_work(ni.saturating_mul(nj));
    let kinds = if ntasks <= 1 {
        vec![TaskKind::Coarse { kfirst: 0, klast: nj - 1 }]
    } else if ntasks <= nj || ni < MIN_FINE_TASKS_PER_VECTOR {
        let ntasks = ntasks.min(nj);
        (0..ntasks)
            .map(|t| TaskKind::Coarse {
                kfirst: nj * t / ntasks,
                klast: nj * (t + 1) / ntasks - 1,
            })
            .collect()
    } else {
        let nparts = ntasks.div_ceil(nj).max(MIN_FINE_TASKS_PER_VECTOR).min(ni);
        let empty = SymbolicPattern { p: vec![0], ia: Vec::new(), slot: Vec::new() };
        let other: &SymbolicPattern = s.unwrap_or(&empty);
        vectors
            .iter()
            .enumerate()
            .flat_map(|(k, v)| fine_tasks(k, v, ni, nparts, &Positions, other))
            .collect()
    };

    let tasks = with_outputs(kinds, &vectors, c_cols, c_rows, rows);
    trace!(ntasks = tasks.len(), ni, nj, "cartesian tasks");
    TaskPlan { vectors, tasks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::slice::TaskKind;
    use crate::index::{analyze, IndexList};
    use proptest::prelude::*;

    fn set(list: IndexList<'_>, limit: usize) -> IndexSet<'_> {
        analyze(list, limit, &AssignConfig::default()).unwrap()
    }

    #[test]
    fn test_single_task() {
        let rows = set(IndexList::All, 4);
        let cols = set(IndexList::All, 3);
        let c_cols = vec![0..0; 3];
        let plan = slice(&rows, &cols, None, &c_cols, &[], &AssignConfig::serial());
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].kind, TaskKind::Coarse { kfirst: 0, klast: 2 });
    }

    #[test]
    fn test_coarse_split_over_columns() {
        let rows = set(IndexList::All, 4);
        let cols = set(IndexList::All, 6);
        let c_cols: Vec<_> = (0..6).map(|j| j..j).collect();
        let plan = slice(&rows, &cols, None, &c_cols, &[], &AssignConfig::with_tasks(3));
        let kinds: Vec<_> = plan.tasks.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TaskKind::Coarse { kfirst: 0, klast: 1 },
                TaskKind::Coarse { kfirst: 2, klast: 3 },
                TaskKind::Coarse { kfirst: 4, klast: 5 },
            ]
        );
    }

    #[test]
    fn test_fine_split_covers_every_row_once() {
        let rows = set(IndexList::All, 10);
        let cols = set(IndexList::All, 2);
        // one entry per row in both columns
        let c_rows: Vec<RowIndex> = (0..10).chain(0..10).map(RowIndex::Live).collect();
        let c_cols = vec![0..10, 10..20];
        let plan = slice(&rows, &cols, None, &c_cols, &c_rows, &AssignConfig::with_tasks(8));
        assert!(plan.tasks.len() >= 4);
        let mut seen = vec![0; 20];
        for task in &plan.tasks {
            for pos in task.output.clone() {
                seen[pos] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    proptest! {
        /// Every slot of `C(:,J)` and every position of `I × J` belongs to exactly one task
        #[test]
        fn prop_tasks_partition_slots_and_positions(
            pattern in proptest::collection::vec(proptest::collection::btree_set(0usize..12, 0..8), 1..6),
            ntasks in 1usize..32,
            descending in any::<bool>(),
        ) {
            let nrows = 12;
            let mut c_rows = Vec::new();
            let mut c_cols = Vec::new();
            for col in &pattern {
                let start = c_rows.len();
                c_rows.extend(col.iter().copied().map(RowIndex::Live));
                c_cols.push(start..c_rows.len());
            }
            let list = if descending {
                IndexList::Stride { begin: nrows - 1, inc: -1, end: 0 }
            } else {
                IndexList::All
            };
            let rows = set(list, nrows);
            let cols = set(IndexList::All, pattern.len());
            let plan = slice(&rows, &cols, None, &c_cols, &c_rows, &AssignConfig::with_tasks(ntasks));

            let mut slots = vec![0; c_rows.len()];
            let mut positions = vec![0; nrows * pattern.len()];
            for task in &plan.tasks {
                let spans = plan.spans(task, nrows);
                for s in task.output.clone() {
                    slots[s] += 1;
                    // the slot's row lies in a band the task visits
                    let ia = rows.position(c_rows[s].row()).unwrap();
                    prop_assert!(spans.iter().any(|(_, band)| band.contains(&ia)));
                }
                for (span, band) in spans {
                    for ia in band {
                        positions[span.ja * nrows + ia] += 1;
                    }
                }
            }
            prop_assert!(slots.iter().all(|&n| n == 1));
            prop_assert!(positions.iter().all(|&n| n == 1));
        }
    }
}
