//! # subassign: masked submatrix assignment
//!
//! `C(I,J)<M> = accum(C(I,J), A)` over hypersparse, sparse, bitmap and full
//! matrices, with a matrix or scalar operand.
//!
//! ## Overview
//!
//! An assignment writes the `|I|×|J|` operand into the rows `I` and columns
//! `J` of `C`, under an optional mask that is also `|I|×|J|`:
//!
//! - **Index selections**: all indices, inclusive ranges, strides (negative
//!   strides included) and explicit lists in any order. Duplicated indices
//!   resolve to the last occurrence.
//! - **Masks**: valued or structural, optionally complemented, optionally
//!   with replace (entries of `C(I,J)` outside the mask are deleted).
//! - **Accumulator**: with one, present entries combine as
//!   `accum(C(i,j), A(iA,jA))`; without one, `A` overwrites and entries of `C`
//!   with no counterpart in `A` are deleted.
//!
//! ## Deferred work
//!
//! Sparse results are not rebuilt on every call. Deletions leave *zombies*
//! (entries marked dead in place) and insertions go to a queue of *pending
//! tuples*; [`Matrix::wait`] folds both into the structure. Many small
//! assignments in a row therefore cost one rebuild.
//!
//! ## Methods
//!
//! Every call is routed to one of a fixed set of methods
//! ([`SubassignMethod`]) according to the mask, the accumulator, the operand
//! kind and the formats involved. Whole-matrix calls on full or empty
//! outputs have direct kernels; the rest walk the positions of `C(I,J)` in
//! parallel tasks in two phases and give the same result for any number of
//! threads.
//!
//! ## Usage
//!
//! ```
//! use subassign::{subassign_scalar, AssignConfig, Descriptor, IndexList, Mask, Matrix};
//!
//! let mut c = Matrix::<f64>::new(5, 5);
//! let m = Matrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[true, true], None).unwrap();
//!
//! // C(1:2, 3:4)<M> = 1.5
//! subassign_scalar(
//!     &mut c,
//!     Mask::Matrix(&m),
//!     None,
//!     1.5,
//!     IndexList::Range { begin: 1, end: 2 },
//!     IndexList::Range { begin: 3, end: 4 },
//!     &Descriptor::new(),
//!     &AssignConfig::default(),
//! )
//! .unwrap();
//!
//! c.wait().unwrap();
//! assert_eq!(c.nvals(), 2);
//! assert_eq!(c.get(1, 3), Some(1.5));
//! assert_eq!(c.get(2, 4), Some(1.5));
//! ```

pub mod assign;
pub mod constants;
pub mod error;
pub mod index;
pub mod matrix;
pub mod ops;
pub mod parallel;
pub mod utils;

// Re-export primary components
pub use assign::{subassign, subassign_scalar, Descriptor, Mask, Source, SubassignMethod};
pub use error::{AssignError, Result};
pub use index::{IndexKind, IndexList, IndexSet};
pub use matrix::config::{AssignConfig, Materialize, SystemParameters};
pub use matrix::{castable, extract, Element, Matrix, RowIndex, Sparsity, TypeCode};
pub use ops::BinaryOp;
pub use utils::{from_sprs, to_dense, to_sprs_csc};

/// Version information for the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
