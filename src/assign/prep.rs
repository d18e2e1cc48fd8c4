//! Preparing and dispatching one assignment
//!
//! Everything between the public entry points and the kernels: validation,
//! early exits, index normalization, finishing inputs, deciding when `C` must
//! be waited on, picking the method and the formats it runs in.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::assign::descriptor::Descriptor;
use crate::assign::kernels::{self, bitmap, dense, Call, MaskView, Operand};
use crate::assign::method::{select_method, IsoInputs, MethodChoice, MethodInputs, SubassignMethod};
use crate::error::{AssignError, Result};
use crate::index::{analyze, normalize, IndexList, IndexSet};
use crate::matrix::extract::extract_sets;
use crate::matrix::{castable, AssignConfig, Element, Materialize, Matrix, Sparsity, TypeCode};
use crate::ops::BinaryOp;

/// Operator of the pending tuples an assignment produces
///
/// Accumulating with "second" gives the same result as no accumulator.
pub(crate) fn pending_op<T: Element>(accum: Option<&BinaryOp<T>>) -> Option<BinaryOp<T>> {
    accum.filter(|op| !op.is_second()).cloned()
}

/// Run `C(I,J)<M> = accum(C(I,J), operand)` with `M` and the operand
/// distinct from `C`
#[allow(clippy::too_many_arguments)]
pub(crate) fn run<T: Element, M: Element>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<M>>,
    accum: Option<&BinaryOp<T>>,
    operand: Operand<'_, T>,
    m_is_a: bool,
    rows: IndexList<'_>,
    cols: IndexList<'_>,
    desc: &Descriptor,
    config: &AssignConfig,
) -> Result<()> {
    config.validate()?;
    let rows = analyze(rows, c.nrows(), config)?;
    let cols = analyze(cols, c.ncols(), config)?;
    let shape = (rows.len(), cols.len());
    if let Operand::Matrix(a) = operand {
        if a.shape() != shape {
            return Err(AssignError::dims("operand", shape, a.shape()));
        }
    }
    if let Some(m) = mask {
        if m.shape() != shape {
            return Err(AssignError::dims("mask", shape, m.shape()));
        }
        if !desc.is_mask_structural() && !castable(M::TYPE, TypeCode::Bool) {
            return Err(AssignError::DomainMismatch(format!(
                "a {:?} mask cannot be read as boolean",
                M::TYPE
            )));
        }
    }

    let complement = desc.is_mask_complemented();
    let replace = desc.should_replace_output();
    let structural = desc.is_mask_structural();

    if rows.is_empty() || cols.is_empty() {
        trace!("empty selection, nothing to assign");
        return Ok(());
    }

    // finish the mask on a copy, then look for shortcuts through it
    let mut mask: Option<Cow<'_, Matrix<M>>> = mask.map(Matrix::finished).transpose()?;
    if let Some(m) = mask.as_deref() {
        if !complement && !replace && m.nvals() == 0 {
            trace!("empty mask, nothing to assign");
            return Ok(());
        }
        if structural && m.is_as_if_full() {
            trace!(complement, "structural mask is full, dropped");
            if complement {
                return absent_complemented(c, replace);
            }
            mask = None;
        }
    }
    if mask.is_none() && complement {
        return absent_complemented(c, replace);
    }

    let a: Option<Cow<'_, Matrix<T>>> = operand.matrix().map(Matrix::finished).transpose()?;

    // sort and de-duplicate I and J, moving the rows and columns of A and M along
    let row_norm = normalize(&rows);
    let col_norm = normalize(&cols);
    let (a, mask) = if row_norm.changed() || col_norm.changed() {
        debug!(
            rows_changed = row_norm.changed(),
            cols_changed = col_norm.changed(),
            "index lists normalized"
        );
        let row_sel = reslice_set(row_norm.inverse.as_deref(), shape.0, config)?;
        let col_sel = reslice_set(col_norm.inverse.as_deref(), shape.1, config)?;
        let a = a
            .map(|a| extract_sets(&a, &row_sel, &col_sel).map(Cow::Owned))
            .transpose()?;
        let mask = mask
            .map(|m| extract_sets(&m, &row_sel, &col_sel).map(Cow::Owned))
            .transpose()?;
        (a, mask)
    } else {
        (a, mask)
    };
    let rows = row_norm.set;
    let cols = col_norm.set;

    let operand = match (&a, operand) {
        (Some(a), _) => Operand::Matrix(&**a),
        (None, Operand::Scalar(x)) => Operand::Scalar(x),
        (None, Operand::Matrix(_)) => {
            return Err(AssignError::Internal("matrix operand lost during prep".into()))
        }
    };
    let call = Call {
        rows: &rows,
        cols: &cols,
        operand,
        mask: mask.as_deref().map(|m| MaskView { matrix: m, structural }),
        complement,
        replace,
        accum,
    };
    dispatch(c, &call, m_is_a, config)?;

    if config.materialize == Materialize::Eager {
        c.wait()?;
    }
    Ok(())
}

/// The mask is absent (or all false) and complemented: nothing can be
/// assigned, and with replace all of `C` is cleared
fn absent_complemented<T: Element>(c: &mut Matrix<T>, replace: bool) -> Result<()> {
    if replace {
        debug!("complemented empty mask with replace, clearing C");
        c.clear();
    }
    Ok(())
}

/// The selection picking the caller's positions kept by normalization
fn reslice_set<'a>(inverse: Option<&'a [usize]>, len: usize, config: &AssignConfig) -> Result<IndexSet<'a>> {
    match inverse {
        Some(list) => analyze(IndexList::List(list), len, config),
        None => analyze(IndexList::All, len, config),
    }
}

/// Decide waits, pick the method, convert formats and run the kernel
fn dispatch<T: Element, M: Element>(
    c: &mut Matrix<T>,
    call: &Call<'_, T, M>,
    m_is_a: bool,
    config: &AssignConfig,
) -> Result<()> {
    let pending_op = pending_op(call.accum);
    let op_differs = c
        .pending()
        .is_some_and(|q| !q.is_empty() && !q.accepts(pending_op.as_ref()));
    if c.is_jumbled() || op_differs {
        debug!(jumbled = c.is_jumbled(), op_differs, "finishing C before assignment");
        c.wait()?;
    }

    let mut choice = choose(c, call, m_is_a);
    let method = choice.method;
    if !c.is_finished() && (method.may_delete() || method == SubassignMethod::Bitmap) {
        // a deletion cannot reach an entry still in the queue
        debug!(%method, npending = c.npending(), nzombies = c.nzombies(), "finishing C before assignment");
        c.wait()?;
        choice = choose(c, call, m_is_a);
    }
    debug!(
        method = %choice.method,
        iso = choice.iso.is_some(),
        c_sparsity = ?c.sparsity(),
        "method selected"
    );

    let method = choice.method;
    let original = c.sparsity();
    if method == SubassignMethod::Bitmap {
        c.convert_to(Sparsity::Bitmap)?;
        apply_iso(c, method, choice.iso)?;
        bitmap::run(c, call)?;
        return conform(c, original);
    }
    if method.traversal().is_none() {
        apply_iso(c, method, choice.iso)?;
        return dense::run(c, method, call);
    }

    if original == Sparsity::Full {
        c.convert_to(Sparsity::Sparse)?;
    }
    apply_iso(c, method, choice.iso)?;
    kernels::run_sparse(c, method, call, pending_op, config)?;
    conform(c, original)
}

fn choose<T: Element, M: Element>(c: &Matrix<T>, call: &Call<'_, T, M>, m_is_a: bool) -> MethodChoice<T> {
    let a = call.operand.matrix();
    let m = call.mask.map(|m| m.matrix);
    let c_empty = c.is_empty();
    let inputs = MethodInputs {
        whole: call.rows.is_all() && call.cols.is_all(),
        mask_present: m.is_some(),
        complement: call.complement,
        structural: call.mask.is_some_and(|m| m.structural),
        replace: call.replace,
        accum: call.accum.is_some(),
        scalar: a.is_none(),
        c_sparsity: c.sparsity(),
        c_empty,
        c_as_if_full: c.is_as_if_full(),
        c_is_mask: false,
        m_sparsity: m.map(Matrix::sparsity),
        a_sparsity: a.map(Matrix::sparsity),
        a_as_if_full: a.is_some_and(Matrix::is_as_if_full),
        m_is_a,
        nnz_m: m.map_or(0, Matrix::nvals),
        nnz_a: a.map_or(0, Matrix::nvals),
    };
    let iso = IsoInputs {
        c_iso: c.iso_value(),
        c_empty,
        a_iso: match call.operand {
            Operand::Scalar(x) => Some(x),
            Operand::Matrix(a) => a.iso_value(),
        },
        accum: call.accum,
    };
    select_method(&inputs, &iso)
}

/// Make `C` iso with the chosen value, or give it per-entry values
fn apply_iso<T: Element>(c: &mut Matrix<T>, method: SubassignMethod, iso: Option<T>) -> Result<()> {
    match iso {
        Some(v) => c.set_iso(v),
        // rebuilt wholesale: the old values are never read
        None if method.rebuilds_output() => {}
        None => c.expand_iso()?,
    }
    Ok(())
}

/// Bring a result back to the format `C` had
///
/// A full `C` that lost entries stays in the format the kernel left it in.
fn conform<T: Element>(c: &mut Matrix<T>, original: Sparsity) -> Result<()> {
    let target = match original {
        Sparsity::Full if !c.is_as_if_full() => c.sparsity(),
        other => other,
    };
    if target != c.sparsity() {
        trace!(from = ?c.sparsity(), to = ?target, "conforming result");
        c.convert_to(target)?;
    }
    Ok(())
}
