//! Choosing the assignment method
//!
//! [`select_method`] is a pure function of the shape of the call: which of
//! mask, complement, replace and accumulator are in play, whether the operand
//! is a scalar, and the formats and fill of `C`, `M` and `A`. It returns one
//! of the [`SubassignMethod`] tags plus the iso decision for the result.

use std::fmt;

use crate::matrix::{Element, Sparsity};
use crate::ops::BinaryOp;

/// The assignment algorithms
///
/// `x` is a scalar operand, `A` a matrix operand, `<M>` a mask, `<!M>` a
/// complemented mask and `+=` assignment through an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubassignMethod {
    /// `C(I,J) = x`
    M01,
    /// `C(I,J) = A`
    M02,
    /// `C(I,J) += x`
    M03,
    /// `C(I,J) += A`
    M04,
    /// `C(I,J)<M> = x`
    M05,
    /// `C<M> = x`, `C` as-if-full
    M05d,
    /// `C<M,struct> = x`, `C` empty
    M05e,
    /// `C<C,struct> = x`
    M05f,
    /// `C<A> = A`, `C` as-if-full
    M06d,
    /// `C(I,J)<M> = A`, driven by `M`
    M06n,
    /// `C(I,J)<M> = A`, `nnz(A) < nnz(M)`
    M06s,
    /// `C(I,J)<M> += x`
    M07,
    /// `C(I,J)<M> += A`
    M08n,
    /// `C(I,J)<M,replace> = x`
    M09,
    /// `C(I,J)<M,replace> = A`
    M10,
    /// `C(I,J)<M,replace> += x`
    M11,
    /// `C(I,J)<M,replace> += A`
    M12,
    /// `C(I,J)<!M> = x`
    M13,
    /// `C(I,J)<!M> = A`
    M14,
    /// `C(I,J)<!M> += x`
    M15,
    /// `C(I,J)<!M> += A`
    M16,
    /// `C(I,J)<!M,replace> = x`
    M17,
    /// `C(I,J)<!M,replace> = A`
    M18,
    /// `C(I,J)<!M,replace> += x`
    M19,
    /// `C(I,J)<!M,replace> += A`
    M20,
    /// `C = x`
    M21,
    /// `C += x`, `C` as-if-full
    M22,
    /// `C += A`, `C` as-if-full
    M23,
    /// `C = A`
    M24,
    /// `C<M,struct> = A`, `C` empty, `A` as-if-full
    M25,
    /// Any combination, in the dense index space of a bitmap `C`
    Bitmap,
}

/// How a sparse kernel walks the positions of `C(I,J)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Every position of `I×J`, finding `C` by search or through `S`
    Cartesian { symbolic: bool },
    /// The entries of `A`
    Operand,
    /// The entries of `M`
    Mask,
    /// The union of the patterns of `S` and `A`
    SymbolicOperand,
    /// The union of the patterns of `S` and `M`
    SymbolicMask,
}

impl SubassignMethod {
    /// Traversal of the sparse two-phase kernels; `None` for the whole-matrix
    /// and bitmap methods
    pub fn traversal(self) -> Option<Traversal> {
        use SubassignMethod::*;
        match self {
            M01 => Some(Traversal::Cartesian { symbolic: false }),
            M03 | M13 | M15 | M17 | M19 => Some(Traversal::Cartesian { symbolic: true }),
            M04 | M08n => Some(Traversal::Operand),
            M05 | M06n | M07 => Some(Traversal::Mask),
            M02 | M06s | M10 | M12 | M14 | M16 | M18 | M20 => Some(Traversal::SymbolicOperand),
            M09 | M11 => Some(Traversal::SymbolicMask),
            M05d | M05e | M05f | M06d | M21 | M22 | M23 | M24 | M25 | Bitmap => None,
        }
    }

    /// Whether the method needs the symbolic pattern `S = C(I,J)`
    pub fn uses_symbolic(self) -> bool {
        matches!(
            self.traversal(),
            Some(Traversal::Cartesian { symbolic: true } | Traversal::SymbolicOperand | Traversal::SymbolicMask)
        )
    }

    /// Whether the method can turn a live entry into a zombie
    pub fn may_delete(self) -> bool {
        use SubassignMethod::*;
        matches!(
            self,
            M02 | M06n | M06s | M09 | M10 | M11 | M12 | M14 | M17 | M18 | M19 | M20
        )
    }

    /// Whether the method replaces the whole of `C` rather than updating it
    pub fn rebuilds_output(self) -> bool {
        use SubassignMethod::*;
        matches!(self, M21 | M24 | M05e | M25)
    }
}

impl fmt::Display for SubassignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything about a call that the method depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInputs {
    /// `I` and `J` both select every index
    pub whole: bool,
    pub mask_present: bool,
    pub complement: bool,
    pub structural: bool,
    pub replace: bool,
    pub accum: bool,
    /// The operand is a scalar
    pub scalar: bool,
    pub c_sparsity: Sparsity,
    pub c_empty: bool,
    pub c_as_if_full: bool,
    /// `C` is its own mask
    pub c_is_mask: bool,
    pub m_sparsity: Option<Sparsity>,
    pub a_sparsity: Option<Sparsity>,
    pub a_as_if_full: bool,
    /// The mask and the operand are the same matrix
    pub m_is_a: bool,
    pub nnz_m: usize,
    pub nnz_a: usize,
}

/// Values the iso decision depends on
#[derive(Debug, Clone, Copy)]
pub struct IsoInputs<'a, T> {
    /// The shared value of an iso `C`
    pub c_iso: Option<T>,
    pub c_empty: bool,
    /// The scalar, or the shared value of an iso `A`
    pub a_iso: Option<T>,
    pub accum: Option<&'a BinaryOp<T>>,
}

/// The selected method and, if the result will be iso, its value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodChoice<T> {
    pub method: SubassignMethod,
    pub iso: Option<T>,
}

/// Pick the method for an assignment and decide whether its result is iso
pub fn select_method<T: Element>(inputs: &MethodInputs, iso: &IsoInputs<'_, T>) -> MethodChoice<T> {
    let method = select_tag(inputs);
    MethodChoice {
        method,
        iso: iso_result(method, iso),
    }
}

fn select_tag(s: &MethodInputs) -> SubassignMethod {
    use SubassignMethod::*;

    let simple_mask = s.mask_present && !s.complement && !s.replace;
    let mut method = None;

    if s.whole {
        if !s.mask_present && !s.complement && !s.accum {
            method = Some(if s.scalar { M21 } else { M24 });
        } else if !s.mask_present && !s.complement && s.accum && s.c_as_if_full {
            method = Some(if s.scalar { M22 } else { M23 });
        } else if simple_mask && s.scalar && !s.accum {
            if s.c_empty && s.structural {
                method = Some(M05e);
            } else if s.c_as_if_full {
                method = Some(M05d);
            } else if s.c_is_mask && s.structural {
                method = Some(M05f);
            }
        } else if simple_mask && !s.scalar && !s.accum {
            if s.c_empty && s.structural && s.a_as_if_full {
                method = Some(M25);
            } else if s.c_as_if_full && s.m_is_a {
                method = Some(M06d);
            }
        }
    }

    let method = method.unwrap_or_else(|| general_family(s));

    let any_bitmap = s.c_sparsity == Sparsity::Bitmap
        || s.m_sparsity == Some(Sparsity::Bitmap)
        || s.a_sparsity == Some(Sparsity::Bitmap);
    let full_would_delete = s.c_sparsity == Sparsity::Full && method.may_delete();
    if any_bitmap || full_would_delete {
        Bitmap
    } else {
        method
    }
}

fn general_family(s: &MethodInputs) -> SubassignMethod {
    use SubassignMethod::*;
    match (s.mask_present, s.complement, s.replace, s.scalar, s.accum) {
        (false, _, _, true, false) => M01,
        (false, _, _, false, false) => M02,
        (false, _, _, true, true) => M03,
        (false, _, _, false, true) => M04,

        (true, false, false, true, false) => M05,
        (true, false, false, false, false) => {
            if s.nnz_a < s.nnz_m && !s.m_is_a {
                M06s
            } else {
                M06n
            }
        }
        (true, false, false, true, true) => M07,
        (true, false, false, false, true) => M08n,

        (true, false, true, true, false) => M09,
        (true, false, true, false, false) => M10,
        (true, false, true, true, true) => M11,
        (true, false, true, false, true) => M12,

        (true, true, false, true, false) => M13,
        (true, true, false, false, false) => M14,
        (true, true, false, true, true) => M15,
        (true, true, false, false, true) => M16,

        (true, true, true, true, false) => M17,
        (true, true, true, false, false) => M18,
        (true, true, true, true, true) => M19,
        (true, true, true, false, true) => M20,
    }
}

fn iso_result<T: Element>(method: SubassignMethod, s: &IsoInputs<'_, T>) -> Option<T> {
    use SubassignMethod::*;
    let a = s.a_iso?;
    match method {
        M05f | M21 | M24 | M05e | M25 => Some(a),
        M22 => {
            let c = s.c_iso?;
            Some(s.accum.map_or(a, |op| op.apply(c, a)))
        }
        _ if s.c_empty => Some(a),
        _ => {
            let c = s.c_iso?;
            let same = match s.accum {
                None => c == a,
                Some(op) => c == a && op.apply(c, a) == a,
            };
            same.then_some(a)
        }
    }
}
