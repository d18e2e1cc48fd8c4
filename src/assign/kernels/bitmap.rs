//! The bitmap kernel
//!
//! Handles every method once `C` is a bitmap. A bitmap holds neither zombies
//! nor pending tuples: deleting clears a presence flag and inserting sets
//! one, so the whole assignment is a single pass over the dense positions of
//! `C(I,J)`, one task per column of `C`.

use rayon::prelude::*;
use tracing::debug;

use super::Call;
use crate::assign::decision::{decide, Action, CEntry};
use crate::error::{AssignError, Result};
use crate::matrix::{Element, Matrix, Sparsity};

/// Run the assignment on a bitmap `C`
pub fn run<T: Element, M: Element>(c: &mut Matrix<T>, call: &Call<'_, T, M>) -> Result<()> {
    if c.sparsity() != Sparsity::Bitmap {
        return Err(AssignError::Internal(format!(
            "bitmap kernel on a {:?} matrix",
            c.sparsity()
        )));
    }
    let nrows = c.nrows();
    if nrows == 0 {
        return Ok(());
    }
    debug!(ni = call.rows.len(), nj = call.cols.len(), iso = c.is_iso(), "running bitmap kernel");

    let deltas: Vec<isize> = if c.iso {
        c.b.par_chunks_mut(nrows)
            .enumerate()
            .map(|(j, b)| column(call, j, b, None))
            .collect()
    } else {
        c.b.par_chunks_mut(nrows)
            .zip(c.x.par_chunks_mut(nrows))
            .enumerate()
            .map(|(j, (b, x))| column(call, j, b, Some(x)))
            .collect()
    };
    let delta: isize = deltas.into_iter().sum();
    c.nvals_bitmap = c
        .nvals_bitmap
        .checked_add_signed(delta)
        .ok_or_else(|| AssignError::Internal("bitmap entry count went negative".into()))?;
    Ok(())
}

/// Assign into column `j` of `C`; returns the change in its entry count
fn column<T: Element, M: Element>(call: &Call<'_, T, M>, j: usize, b: &mut [bool], mut x: Option<&mut [T]>) -> isize {
    let Some(ja) = call.cols.position(j) else {
        return 0;
    };
    let mut delta = 0;
    for ia in 0..call.rows.len() {
        let i = call.rows.get(ia);
        let state = if b[i] { CEntry::Live } else { CEntry::Absent };
        let operand = call.operand.at(ia, ja);
        let mask = call.mask_at(ia, ja);
        match (decide(state, operand.is_some(), mask, call.accum.is_some(), call.replace), operand) {
            (Action::Overwrite, Some(a)) => {
                if let Some(x) = x.as_deref_mut() {
                    x[i] = a;
                }
            }
            (Action::Accumulate, Some(a)) => {
                if let (Some(x), Some(op)) = (x.as_deref_mut(), call.accum) {
                    x[i] = op.apply(x[i], a);
                }
            }
            (Action::Insert, Some(a)) => {
                b[i] = true;
                delta += 1;
                if let Some(x) = x.as_deref_mut() {
                    x[i] = a;
                }
            }
            (Action::Delete, _) => {
                b[i] = false;
                delta -= 1;
            }
            _ => {}
        }
    }
    delta
}
