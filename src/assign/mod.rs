//! Masked submatrix assignment
//!
//! `C(I,J)<M> = accum(C(I,J), A)` and `C(I,J)<M> = accum(C(I,J), x)`: the
//! mask and the operand are `|I|×|J|`, indexed in the coordinates of the
//! selection, and the mask only governs `C(I,J)`. Entries of `C` outside the
//! selection are never touched, even with replace.
//!
//! The work is split in stages: [`prep`] validates and normalizes the call,
//! [`method`] picks one of the specialized methods, [`slice`] partitions the
//! positions into tasks, and [`kernels`] runs them.

pub mod decision;
pub mod descriptor;
pub mod kernels;
pub mod method;
pub mod prep;
pub mod slice;
pub mod symbolic;

use std::fmt;

use tracing::debug;

pub use decision::{decide, Action, CEntry};
pub use descriptor::Descriptor;
pub use method::{select_method, IsoInputs, MethodChoice, MethodInputs, SubassignMethod, Traversal};

use crate::error::Result;
use crate::index::{analyze, IndexList};
use crate::matrix::{AssignConfig, Element, Matrix};
use crate::ops::BinaryOp;
use kernels::{dense, Operand};

/// The mask of an assignment
///
/// `Output` masks `C` with its own pattern and values as they were before the
/// call.
#[derive(Clone, Copy)]
pub enum Mask<'a, M> {
    None,
    Matrix(&'a Matrix<M>),
    Output,
}

impl Mask<'static, bool> {
    /// No mask: every position of `C(I,J)` is assigned
    pub fn none() -> Self {
        Mask::None
    }

    /// `C` is its own mask
    pub fn output() -> Self {
        Mask::Output
    }
}

/// The matrix operand of an assignment
///
/// `Output` reads `C` itself as it was before the call.
#[derive(Clone, Copy)]
pub enum Source<'a, T> {
    Matrix(&'a Matrix<T>),
    Output,
}

impl<M: Element> fmt::Debug for Mask<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mask::None => f.write_str("None"),
            Mask::Matrix(m) => write!(f, "Matrix({}x{}, {:?})", m.nrows(), m.ncols(), m.sparsity()),
            Mask::Output => f.write_str("Output"),
        }
    }
}

impl<T: Element> fmt::Debug for Source<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Matrix(a) => write!(f, "Matrix({}x{}, {:?})", a.nrows(), a.ncols(), a.sparsity()),
            Source::Output => f.write_str("Output"),
        }
    }
}

/// How the mask and the operand relate to `C`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operands {
    Distinct,
    /// `C` is the mask
    SharesMask,
    /// `C` is the operand
    SharesOperand,
    /// `C` is both the mask and the operand
    SharesBoth,
}

impl Operands {
    fn resolve<T, M>(mask: &Mask<'_, M>, source: Option<&Source<'_, T>>) -> Self {
        match (matches!(mask, Mask::Output), matches!(source, Some(Source::Output))) {
            (false, false) => Operands::Distinct,
            (true, false) => Operands::SharesMask,
            (false, true) => Operands::SharesOperand,
            (true, true) => Operands::SharesBoth,
        }
    }
}

/// `C(I,J)<M> = accum(C(I,J), A)`
///
/// `A` must be `|I|×|J|`, and so must the mask when there is one. `I` and `J`
/// may be unsorted and hold duplicates: the result is as if `I` and `J` were
/// sorted with only the last occurrence of each index kept, the rows and
/// columns of `A` and `M` moving along.
///
/// Depending on [`AssignConfig::materialize`] the result may hold zombies
/// and pending tuples; [`Matrix::wait`] folds them in.
///
/// # Errors
///
/// - `IndexOutOfBounds` when `I` or `J` reach past the dimensions of `C`
/// - `DimensionMismatch` when `A` or the mask is not `|I|×|J|`
/// - `DomainMismatch` when a valued mask cannot be read as boolean
/// - `OutOfMemory` when the symbolic pattern, the tasks or the pending queue
///   cannot be allocated
///
/// A failed call may leave `C` partially updated.
///
/// # Example
///
/// ```
/// use subassign::{subassign, AssignConfig, Descriptor, IndexList, Mask, Matrix, Source};
///
/// let mut c = Matrix::<f64>::new(4, 4);
/// let a = Matrix::full(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let rows = [3, 1];
/// subassign(
///     &mut c,
///     Mask::none(),
///     None,
///     Source::Matrix(&a),
///     IndexList::List(&rows),
///     IndexList::Range { begin: 0, end: 1 },
///     &Descriptor::new(),
///     &AssignConfig::default(),
/// )
/// .unwrap();
/// c.wait().unwrap();
/// assert_eq!(c.get(3, 0), Some(1.0));
/// assert_eq!(c.get(1, 1), Some(4.0));
/// ```
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(level = "debug", skip_all, fields(nrows = c.nrows(), ncols = c.ncols()))]
pub fn subassign<T: Element, M: Element>(
    c: &mut Matrix<T>,
    mask: Mask<'_, M>,
    accum: Option<&BinaryOp<T>>,
    source: Source<'_, T>,
    rows: IndexList<'_>,
    cols: IndexList<'_>,
    desc: &Descriptor,
    config: &AssignConfig,
) -> Result<()> {
    let operands = Operands::resolve(&mask, Some(&source));
    debug!(?operands, accum = accum.map(BinaryOp::name), "matrix assignment");

    // C read as an input is a snapshot taken before any change
    let snapshot: Option<Matrix<T>> = match operands {
        Operands::Distinct => None,
        _ => Some(c.finished()?.into_owned()),
    };
    match (mask, source, &snapshot) {
        (Mask::Output, Source::Output, Some(dup)) => {
            prep::run(c, Some(dup), accum, Operand::Matrix(dup), true, rows, cols, desc, config)
        }
        (Mask::Output, Source::Matrix(a), Some(dup)) => {
            prep::run(c, Some(dup), accum, Operand::Matrix(a), false, rows, cols, desc, config)
        }
        (Mask::None, Source::Output, Some(dup)) => {
            prep::run::<T, bool>(c, None, accum, Operand::Matrix(dup), false, rows, cols, desc, config)
        }
        (Mask::Matrix(m), Source::Output, Some(dup)) => {
            prep::run(c, Some(m), accum, Operand::Matrix(dup), false, rows, cols, desc, config)
        }
        (Mask::None, Source::Matrix(a), _) => {
            prep::run::<T, bool>(c, None, accum, Operand::Matrix(a), false, rows, cols, desc, config)
        }
        (Mask::Matrix(m), Source::Matrix(a), _) => {
            let m_is_a = std::ptr::addr_eq(m as *const Matrix<M>, a as *const Matrix<T>);
            prep::run(c, Some(m), accum, Operand::Matrix(a), m_is_a, rows, cols, desc, config)
        }
        (_, _, None) => Err(crate::error::AssignError::Internal(
            "aliased assignment without a snapshot of C".into(),
        )),
    }
}

/// `C(I,J)<M> = accum(C(I,J), x)`
///
/// Every position of `C(I,J)` the mask allows receives `x`, or
/// `accum(C(i,j), x)` where an entry is already present.
///
/// # Example
///
/// ```
/// use subassign::{subassign_scalar, AssignConfig, BinaryOp, Descriptor, IndexList, Mask, Matrix};
///
/// let mut c = Matrix::from_triplets(3, 3, &[0], &[0], &[1], None).unwrap();
/// subassign_scalar(
///     &mut c,
///     Mask::none(),
///     Some(&BinaryOp::plus()),
///     10,
///     IndexList::Range { begin: 0, end: 1 },
///     IndexList::List(&[0]),
///     &Descriptor::new(),
///     &AssignConfig::default(),
/// )
/// .unwrap();
/// c.wait().unwrap();
/// assert_eq!(c.get(0, 0), Some(11));
/// assert_eq!(c.get(1, 0), Some(10));
/// assert_eq!(c.nvals(), 2);
/// ```
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(level = "debug", skip_all, fields(nrows = c.nrows(), ncols = c.ncols()))]
pub fn subassign_scalar<T: Element, M: Element>(
    c: &mut Matrix<T>,
    mask: Mask<'_, M>,
    accum: Option<&BinaryOp<T>>,
    x: T,
    rows: IndexList<'_>,
    cols: IndexList<'_>,
    desc: &Descriptor,
    config: &AssignConfig,
) -> Result<()> {
    let operands = Operands::resolve::<T, M>(&mask, None);
    debug!(?operands, accum = accum.map(BinaryOp::name), "scalar assignment");
    match mask {
        Mask::None => prep::run::<T, bool>(c, None, accum, Operand::Scalar(x), false, rows, cols, desc, config),
        Mask::Matrix(m) => prep::run(c, Some(m), accum, Operand::Scalar(x), false, rows, cols, desc, config),
        Mask::Output => {
            if self_mask_fast_path(c, accum, x, rows, cols, desc, config)? {
                return Ok(());
            }
            let dup = c.finished()?.into_owned();
            prep::run(c, Some(&dup), accum, Operand::Scalar(x), false, rows, cols, desc, config)
        }
    }
}

/// `C<C,struct> = x` over all of `C`: every entry takes the value `x` and the
/// pattern is left alone, so `C` is never copied
///
/// Returns false when the call does not have that shape.
fn self_mask_fast_path<T: Element>(
    c: &mut Matrix<T>,
    accum: Option<&BinaryOp<T>>,
    x: T,
    rows: IndexList<'_>,
    cols: IndexList<'_>,
    desc: &Descriptor,
    config: &AssignConfig,
) -> Result<bool> {
    config.validate()?;
    let rows = analyze(rows, c.nrows(), config)?;
    let cols = analyze(cols, c.ncols(), config)?;
    let c_empty = c.is_empty();
    let inputs = MethodInputs {
        whole: rows.is_all() && cols.is_all(),
        mask_present: true,
        complement: desc.is_mask_complemented(),
        structural: desc.is_mask_structural(),
        replace: desc.should_replace_output(),
        accum: accum.is_some(),
        scalar: true,
        c_sparsity: c.sparsity(),
        c_empty,
        c_as_if_full: c.is_as_if_full(),
        c_is_mask: true,
        m_sparsity: Some(c.sparsity()),
        a_sparsity: None,
        a_as_if_full: false,
        m_is_a: false,
        nnz_m: c.nvals(),
        nnz_a: 0,
    };
    let iso = IsoInputs {
        c_iso: c.iso_value(),
        c_empty,
        a_iso: Some(x),
        accum,
    };
    if select_method(&inputs, &iso).method != SubassignMethod::M05f {
        return Ok(false);
    }
    debug!(method = %SubassignMethod::M05f, "C is its own structural mask, assigning in place");
    dense::self_masked_scalar(c, x)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Sparsity;

    fn config() -> AssignConfig {
        AssignConfig::serial()
    }

    #[test]
    fn test_operands_resolve() {
        let a = Matrix::<i32>::new(1, 1);
        assert_eq!(
            Operands::resolve(&Mask::<bool>::None, Some(&Source::Matrix(&a))),
            Operands::Distinct
        );
        assert_eq!(Operands::resolve::<i32, bool>(&Mask::Output, None), Operands::SharesMask);
        assert_eq!(
            Operands::resolve(&Mask::<bool>::None, Some(&Source::<i32>::Output)),
            Operands::SharesOperand
        );
        assert_eq!(
            Operands::resolve(&Mask::<bool>::Output, Some(&Source::<i32>::Output)),
            Operands::SharesBoth
        );
    }

    #[test]
    fn test_debug_output() {
        let a = Matrix::<f64>::new(2, 3);
        let m = Matrix::<i32>::hypersparse(2, 3);
        assert_eq!(format!("{:?}", Mask::Matrix(&m)), "Matrix(2x3, Hypersparse)");
        assert_eq!(format!("{:?}", Mask::none()), "None");
        assert_eq!(format!("{:?}", Source::Matrix(&a)), "Matrix(2x3, Sparse)");
        assert_eq!(format!("{:?}", Source::<f64>::Output), "Output");
        assert_eq!(format!("{:?}", Operand::Scalar(1.5)), "Scalar(1.5)");
        assert_eq!(format!("{:?}", Operand::Matrix(&a)), "Matrix(2x3, Sparse)");
        let view = kernels::MaskView { matrix: &m, structural: true };
        assert!(format!("{:?}", view).contains("structural: true"));
    }

    #[test]
    fn test_self_masked_scalar_keeps_pattern() {
        let mut c = Matrix::from_triplets(3, 3, &[0, 2], &[0, 1], &[1, 2], None).unwrap();
        let desc = Descriptor::new().structural_mask();
        subassign_scalar(&mut c, Mask::output(), None, 7, IndexList::All, IndexList::All, &desc, &config()).unwrap();
        assert!(c.is_iso());
        assert_eq!(c.nvals(), 2);
        assert_eq!(c.get(2, 1), Some(7));
        assert_eq!(c.get(1, 1), None);
    }

    #[test]
    fn test_self_masked_valued_scalar() {
        // valued: the zero entry is a false mask entry and keeps its value
        let mut c = Matrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[0, 5], None).unwrap();
        subassign_scalar(
            &mut c,
            Mask::output(),
            None,
            9,
            IndexList::All,
            IndexList::All,
            &Descriptor::new(),
            &config(),
        )
        .unwrap();
        c.wait().unwrap();
        assert_eq!(c.get(0, 0), Some(0));
        assert_eq!(c.get(1, 1), Some(9));
        assert_eq!(c.nvals(), 2);
    }

    #[test]
    fn test_output_as_operand() {
        let mut c = Matrix::full(3, 1, vec![1, 2, 3]).unwrap();
        let mut small = Matrix::full(2, 1, vec![1, 2]).unwrap();
        small.convert_to(Sparsity::Sparse).unwrap();
        subassign(
            &mut c,
            Mask::none(),
            None,
            Source::Matrix(&small),
            IndexList::Range { begin: 1, end: 2 },
            IndexList::All,
            &Descriptor::new(),
            &config(),
        )
        .unwrap();
        c.wait().unwrap();
        assert_eq!(c.get(0, 0), Some(1));
        assert_eq!(c.get(1, 0), Some(1));
        assert_eq!(c.get(2, 0), Some(2));

        // C += C reads C as it was before the call
        let plus = BinaryOp::plus();
        subassign(
            &mut c,
            Mask::none(),
            Some(&plus),
            Source::Output,
            IndexList::All,
            IndexList::All,
            &Descriptor::new(),
            &config(),
        )
        .unwrap();
        c.wait().unwrap();
        assert_eq!(c.to_triplets().unwrap().2, vec![2, 2, 4]);
    }

    #[test]
    fn test_same_matrix_as_mask_and_operand() {
        let a = Matrix::from_triplets(2, 2, &[0, 1], &[1, 0], &[3, 4], None).unwrap();
        let mut c = Matrix::from_triplets(2, 2, &[0], &[0], &[1], None).unwrap();
        subassign(
            &mut c,
            Mask::Matrix(&a),
            None,
            Source::Matrix(&a),
            IndexList::All,
            IndexList::All,
            &Descriptor::new(),
            &config(),
        )
        .unwrap();
        c.wait().unwrap();
        assert_eq!(c.get(0, 0), Some(1));
        assert_eq!(c.get(0, 1), Some(3));
        assert_eq!(c.get(1, 0), Some(4));
    }
}
