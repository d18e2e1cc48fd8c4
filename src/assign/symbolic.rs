//! The symbolic pattern `S = C(I,J)`
//!
//! `S` has one vector per position `jA` of `J`. Its entries are the stored
//! slots of `C(:, J[jA])`, live or zombie, whose row is selected by `I`, each
//! tagged with its position `iA` in `I`. Kernels that must see every existing
//! entry of `C(I,J)` (to delete, revive or accumulate into it) walk `S`
//! instead of searching `C` position by position.

use rayon::prelude::*;
use tracing::trace;

use crate::error::Result;
use crate::index::{IndexKind, IndexSet};
use crate::matrix::{Element, Matrix};
use crate::utils::exclusive_scan;

/// A storage slot of `C`: an index into its row-index and value arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSlot(pub usize);

/// `S = C(I,J)` in compressed-column form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicPattern {
    /// Vector offsets, one vector per position of `J` (size: |J| + 1)
    pub p: Vec<usize>,
    /// Position in `I` of each entry; ascending within a vector
    pub ia: Vec<usize>,
    /// Slot of `C` each entry refers to
    pub slot: Vec<CSlot>,
}

impl SymbolicPattern {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.ia.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ia.is_empty()
    }

    /// Entry range of vector `ja`
    #[inline]
    pub fn vector(&self, ja: usize) -> std::ops::Range<usize> {
        self.p[ja]..self.p[ja + 1]
    }
}

/// Build `S = C(I,J)`
///
/// `C` must be sparse or hypersparse and not jumbled; zombies are included. `I` and `J` must be
/// canonical. Vectors come out sorted by `iA` whatever the direction of `I`.
pub fn symbolic<T: Element>(
    c: &Matrix<T>,
    rows: &IndexSet<'_>,
    cols: &IndexSet<'_>,
) -> Result<SymbolicPattern> {
    let vectors: Vec<Vec<(usize, CSlot)>> = (0..cols.len())
        .into_par_iter()
        .map(|ja| extract_vector(c, rows, cols.get(ja)))
        .collect();

    let counts: Vec<usize> = vectors.iter().map(Vec::len).collect();
    let p = exclusive_scan(&counts);
    let total = p[p.len() - 1];

    let mut ia = Vec::new();
    let mut slot = Vec::new();
    ia.try_reserve_exact(total)?;
    slot.try_reserve_exact(total)?;
    for v in vectors {
        for (i, s) in v {
            ia.push(i);
            slot.push(s);
        }
    }
    trace!(nvec = cols.len(), nentries = total, "symbolic pattern built");
    Ok(SymbolicPattern { p, ia, slot })
}

/// Entries of `C(I, col)` as `(iA, slot)`, sorted by `iA`
fn extract_vector<T: Element>(c: &Matrix<T>, rows: &IndexSet<'_>, col: usize) -> Vec<(usize, CSlot)> {
    let range = c.column_slots(col);
    let (Some(lo), Some(hi)) = (rows.min(), rows.max()) else {
        return Vec::new();
    };
    let slots = &c.i[range.clone()];
    let first = range.start + slots.partition_point(|r| r.row() < lo);
    let last = range.start + slots.partition_point(|r| r.row() <= hi);
    let window = first..last;

    let mut out = if rows.len() < window.len() {
        // few selected rows: search C for each of them
        (0..rows.len())
            .filter_map(|ia| {
                let i = rows.get(ia);
                let off = c.i[window.clone()].binary_search_by_key(&i, |r| r.row()).ok()?;
                Some((ia, CSlot(window.start + off)))
            })
            .collect()
    } else {
        let mut v: Vec<(usize, CSlot)> = window
            .filter_map(|pos| {
                let i = c.i[pos].row();
                let ia = match rows.kind() {
                    IndexKind::All => Some(i),
                    IndexKind::Range => Some(i - lo),
                    IndexKind::Stride | IndexKind::List => rows.position(i),
                };
                ia.map(|ia| (ia, CSlot(pos)))
            })
            .collect();
        if !rows.is_ascending() {
            v.reverse();
        }
        v
    };
    out.shrink_to_fit();
    out
}
