//! Submatrix extraction `A(I,J)`

use rayon::prelude::*;
use tracing::trace;

use crate::error::Result;
use crate::index::{analyze, IndexList, IndexSet};
use crate::matrix::config::AssignConfig;
use crate::matrix::element::Element;
use crate::matrix::storage::{Matrix, Sparsity};
use crate::matrix::zombie::RowIndex;
use crate::utils::{exclusive_scan, try_filled};

/// Extracts `A(I,J)` as a new `|I| × |J|` matrix
///
/// Index lists may be unsorted and may repeat indices; the result then
/// repeats the corresponding rows or columns. Pending work in `a` is finished
/// on a copy.
///
/// # Examples
///
/// ```
/// use subassign::{extract, AssignConfig, IndexList, Matrix};
///
/// let a = Matrix::from_triplets(3, 3, &[0, 2], &[1, 1], &[5, 6], None).unwrap();
/// let rows = [2, 0];
/// let s = extract(&a, IndexList::List(&rows), IndexList::Range { begin: 1, end: 1 }, &AssignConfig::default()).unwrap();
/// assert_eq!(s.get(0, 0), Some(6));
/// assert_eq!(s.get(1, 0), Some(5));
/// ```
pub fn extract<T: Element>(
    a: &Matrix<T>,
    rows: IndexList<'_>,
    cols: IndexList<'_>,
    config: &AssignConfig,
) -> Result<Matrix<T>> {
    config.validate()?;
    let rows = analyze(rows, a.nrows(), config)?;
    let cols = analyze(cols, a.ncols(), config)?;
    extract_sets(a, &rows, &cols)
}

/// Extraction on resolved selections
///
/// Dense inputs give a result in the same format; sparse and hypersparse
/// inputs give a sparse result.
pub(crate) fn extract_sets<T: Element>(
    a: &Matrix<T>,
    rows: &IndexSet<'_>,
    cols: &IndexSet<'_>,
) -> Result<Matrix<T>> {
    let a = a.finished()?;
    trace!(nrows = rows.len(), ncols = cols.len(), from = ?a.sparsity(), "extracting submatrix");
    match a.sparsity() {
        Sparsity::Full | Sparsity::Bitmap => extract_dense(&a, rows, cols),
        Sparsity::Sparse | Sparsity::Hypersparse => extract_sparse(&a, rows, cols),
    }
}

fn extract_dense<T: Element>(a: &Matrix<T>, rows: &IndexSet<'_>, cols: &IndexSet<'_>) -> Result<Matrix<T>> {
    let (m, n) = (rows.len(), cols.len());
    let bitmap = a.sparsity() == Sparsity::Bitmap;
    if let (false, Some(v)) = (bitmap, a.iso_value()) {
        return Ok(Matrix::iso_full(m, n, v));
    }
    let mut out = if bitmap {
        Matrix::bitmap(m, n)?
    } else {
        Matrix::full(m, n, try_filled(m * n, T::default())?)?
    };
    if let Some(v) = a.iso_value() {
        out.set_iso(v);
    }
    if m == 0 || n == 0 {
        return Ok(out);
    }

    let source = |io: usize, jo: usize| cols.get(jo) * a.nrows() + rows.get(io);
    if !out.is_iso() {
        out.x.par_chunks_mut(m).enumerate().for_each(|(jo, xcol)| {
            for (io, slot) in xcol.iter_mut().enumerate() {
                let pos = source(io, jo);
                if a.is_present(pos) {
                    *slot = a.value_at(pos);
                }
            }
        });
    }
    if bitmap {
        out.nvals_bitmap = out
            .b
            .par_chunks_mut(m)
            .enumerate()
            .map(|(jo, bcol)| {
                let mut count = 0;
                for (io, flag) in bcol.iter_mut().enumerate() {
                    *flag = a.is_present(source(io, jo));
                    count += usize::from(*flag);
                }
                count
            })
            .sum();
    }
    Ok(out)
}

fn extract_sparse<T: Element>(a: &Matrix<T>, rows: &IndexSet<'_>, cols: &IndexSet<'_>) -> Result<Matrix<T>> {
    let iso = a.is_iso();
    let scan_entries = rows.is_ascending();

    // one (rows, values) pair per output column, assembled afterwards
    let col_results: Vec<(Vec<RowIndex>, Vec<T>)> = (0..cols.len())
        .into_par_iter()
        .map(|jo| {
            let mut out_rows = Vec::new();
            let mut out_vals = Vec::new();
            let Some(k) = a.find_vector(cols.get(jo)) else {
                return (out_rows, out_vals);
            };
            let range = a.vector_range(k);
            let mut push = |io: usize, pos: usize| {
                out_rows.push(RowIndex::Live(io));
                if !iso {
                    out_vals.push(a.value_at(pos));
                }
            };
            match (scan_entries, rows.min(), rows.max()) {
                (true, Some(lo), Some(hi)) => {
                    let slots = &a.i[range.clone()];
                    let first = range.start + slots.partition_point(|r| r.row() < lo);
                    let last = range.start + slots.partition_point(|r| r.row() <= hi);
                    for pos in first..last {
                        if let Some(io) = rows.position(a.i[pos].row()) {
                            push(io, pos);
                        }
                    }
                }
                (true, _, _) => {}
                (false, _, _) => {
                    let slots = &a.i[range.clone()];
                    for io in 0..rows.len() {
                        if let Ok(offset) = slots.binary_search_by_key(&rows.get(io), RowIndex::row) {
                            push(io, range.start + offset);
                        }
                    }
                }
            }
            (out_rows, out_vals)
        })
        .collect();

    let lens: Vec<usize> = col_results.iter().map(|(r, _)| r.len()).collect();
    let p = exclusive_scan(&lens);
    let nnz = p[p.len() - 1];

    let mut out = Matrix::new(rows.len(), cols.len());
    out.i.try_reserve_exact(nnz)?;
    if !iso {
        out.x.try_reserve_exact(nnz)?;
    }
    for (r, v) in col_results {
        out.i.extend(r);
        out.x.extend(v);
    }
    out.p = p;
    if let Some(v) = a.iso_value() {
        out.set_iso(v);
    }
    Ok(out)
}
