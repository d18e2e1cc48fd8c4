//! Slicing driven by the entries of one matrix
//!
//! The methods that only need to visit the entries of `A` or of `M` walk that
//! matrix's stored vectors; empty vectors produce no work at all.

use std::ops::Range;

use tracing::trace;

use super::{group, with_outputs, Pattern, TaskPlan, VectorSpan};
use crate::index::IndexSet;
use crate::matrix::{AssignConfig, RowIndex};

/// Plan a traversal of the entries of `driver`
pub fn slice<P: Pattern>(
    driver: &P,
    rows: &IndexSet<'_>,
    c_cols: &[Range<usize>],
    c_rows: &[RowIndex],
    config: &AssignConfig,
) -> TaskPlan {
    let vectors: Vec<VectorSpan> = (0..driver.nvectors())
        .filter_map(|k| {
            let entries = driver.entries(k);
            (!entries.is_empty()).then(|| VectorSpan {
                ja: driver.vector_id(k),
                driver: entries,
                other: 0..0,
            })
        })
        .collect();

    let work: usize = vectors.iter().map(|v| v.driver.len()).sum();
    let ntasks = config.ntasks_for_work(work);
    let kinds = group(&vectors, rows.len(), ntasks, driver, driver);
    let tasks = with_outputs(kinds, &vectors, c_cols, c_rows, rows);
    trace!(ntasks = tasks.len(), nvec = vectors.len(), work, "single-driver tasks");
    TaskPlan { vectors, tasks }
}
