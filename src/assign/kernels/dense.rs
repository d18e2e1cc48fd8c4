//! Whole-matrix kernels
//!
//! These run when `I` and `J` select all of `C` and the call has a shape that
//! needs no per-position search: `C` is as-if-full (every entry present, so
//! entry `(i,j)` lives in slot `j*nrows + i` whatever the format), or `C` is
//! rebuilt from scratch.

use std::borrow::Cow;

use rayon::prelude::*;
use tracing::debug;

use super::{Call, Operand};
use crate::assign::method::SubassignMethod;
use crate::error::{AssignError, Result};
use crate::matrix::{Element, Matrix, RowIndex, Sparsity};

/// Run one of the whole-matrix methods
pub fn run<T: Element, M: Element>(c: &mut Matrix<T>, method: SubassignMethod, call: &Call<'_, T, M>) -> Result<()> {
    debug!(%method, nrows = c.nrows(), ncols = c.ncols(), "running whole-matrix kernel");
    match method {
        SubassignMethod::M21 => {
            let x = scalar(call)?;
            *c = Matrix::iso_full(c.nrows(), c.ncols(), x);
            Ok(())
        }
        SubassignMethod::M24 => {
            let a = matrix(call)?;
            *c = a.clone();
            Ok(())
        }
        SubassignMethod::M22 => add_scalar(c, call),
        SubassignMethod::M23 => add_matrix(c, call),
        SubassignMethod::M05d | SubassignMethod::M06d => masked_write(c, call),
        SubassignMethod::M05e | SubassignMethod::M25 => from_mask_pattern(c, call),
        SubassignMethod::M05f => match call.operand {
            Operand::Scalar(x) => self_masked_scalar(c, x),
            Operand::Matrix(_) => Err(AssignError::Internal("self-masked assignment of a matrix".into())),
        },
        other => Err(AssignError::Internal(format!("{} is not a whole-matrix method", other))),
    }
}

fn scalar<T: Element, M: Element>(call: &Call<'_, T, M>) -> Result<T> {
    match call.operand {
        Operand::Scalar(x) => Ok(x),
        Operand::Matrix(_) => Err(AssignError::Internal("expected a scalar operand".into())),
    }
}

fn matrix<'a, T: Element, M: Element>(call: &Call<'a, T, M>) -> Result<&'a Matrix<T>> {
    match call.operand {
        Operand::Matrix(a) => Ok(a),
        Operand::Scalar(_) => Err(AssignError::Internal("expected a matrix operand".into())),
    }
}

/// `C<C,struct> = x`: every entry of `C` takes the value `x`
pub fn self_masked_scalar<T: Element>(c: &mut Matrix<T>, x: T) -> Result<()> {
    c.wait()?;
    c.set_iso(x);
    Ok(())
}

/// `C += x`
fn add_scalar<T: Element, M: Element>(c: &mut Matrix<T>, call: &Call<'_, T, M>) -> Result<()> {
    let x = scalar(call)?;
    let op = call
        .accum
        .ok_or_else(|| AssignError::Internal("C += x without an accumulator".into()))?;
    // an iso C was given its new value when the method was chosen
    if !c.is_iso() {
        c.x.par_iter_mut().for_each(|v| *v = op.apply(*v, x));
    }
    Ok(())
}

/// `C += A`
fn add_matrix<T: Element, M: Element>(c: &mut Matrix<T>, call: &Call<'_, T, M>) -> Result<()> {
    let a = matrix(call)?;
    let op = call
        .accum
        .ok_or_else(|| AssignError::Internal("C += A without an accumulator".into()))?;
    let nrows = c.nrows();
    if c.is_iso() || nrows == 0 {
        return Ok(());
    }
    c.x.par_chunks_mut(nrows).enumerate().for_each(|(j, col)| {
        for pos in a.column_slots(j) {
            if a.is_present(pos) {
                let i = a.row_at(pos);
                col[i] = op.apply(col[i], a.value_at(pos));
            }
        }
    });
    Ok(())
}

/// `C<M> = x` or `C<A> = A` on an as-if-full `C`
fn masked_write<T: Element, M: Element>(c: &mut Matrix<T>, call: &Call<'_, T, M>) -> Result<()> {
    let m = call
        .mask
        .ok_or_else(|| AssignError::Internal("masked write without a mask".into()))?;
    let nrows = c.nrows();
    if c.is_iso() || nrows == 0 {
        return Ok(());
    }
    let operand = call.operand;
    c.x.par_chunks_mut(nrows).enumerate().for_each(|(j, col)| {
        for pos in m.matrix.column_slots(j) {
            if !m.value_at(pos) {
                continue;
            }
            let i = m.matrix.row_at(pos);
            if let Some(v) = operand.at(i, j) {
                col[i] = v;
            }
        }
    });
    Ok(())
}

/// `C<M,struct> = x` or `C<M,struct> = A` on an empty `C`: `C` takes the
/// pattern of `M`
fn from_mask_pattern<T: Element, M: Element>(c: &mut Matrix<T>, call: &Call<'_, T, M>) -> Result<()> {
    let m = call
        .mask
        .ok_or_else(|| AssignError::Internal("structure from a missing mask".into()))?;
    let pattern: Cow<'_, Matrix<M>> = if m.matrix.sparsity().is_compressed() {
        Cow::Borrowed(m.matrix)
    } else {
        let mut copy = m.matrix.clone();
        copy.convert_to(Sparsity::Sparse)?;
        Cow::Owned(copy)
    };

    let mut out = match pattern.sparsity() {
        Sparsity::Hypersparse => Matrix::hypersparse(c.nrows(), c.ncols()),
        _ => Matrix::new(c.nrows(), c.ncols()),
    };
    out.h.clone_from(&pattern.h);
    out.p.clone_from(&pattern.p);
    out.i.clone_from(&pattern.i);

    let iso_value = match call.operand {
        Operand::Scalar(x) => Some(x),
        Operand::Matrix(a) => a.iso_value(),
    };
    if let Some(v) = iso_value {
        out.x = vec![v];
        out.iso = true;
    } else {
        let a = matrix(call)?;
        let columns: Vec<Vec<T>> = (0..pattern.nvec())
            .into_par_iter()
            .map(|k| {
                let j = pattern.vector_col(k);
                pattern
                    .vector_range(k)
                    .map(|pos| {
                        let i = pattern.row_at(pos);
                        a.entry(i, j)
                            .ok_or_else(|| AssignError::Internal(format!("A has no entry at ({}, {})", i, j)))
                    })
                    .collect::<Result<Vec<T>>>()
            })
            .collect::<Result<_>>()?;
        let mut x = Vec::new();
        x.try_reserve_exact(out.i.len())?;
        for col in columns {
            x.extend(col);
        }
        out.x = x;
    }
    debug_assert!(out.i.iter().all(RowIndex::is_live));
    *c = out;
    Ok(())
}
