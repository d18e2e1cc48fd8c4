//! Error type shared by every fallible operation in the crate

use std::collections::TryReserveError;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AssignError>;

/// Errors raised by matrix construction, index analysis and assignment
///
/// Every failure is reported synchronously and aborts the whole call. An
/// assignment that fails part-way is not rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// Selection size and operand or mask shape disagree
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A value cannot be cast into the domain that needs it
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// An index selection refers past the end of a dimension
    #[error("index {index} out of bounds (must be < {limit})")]
    IndexOutOfBounds { index: usize, limit: usize },

    /// An allocation for the symbolic pattern, task list or pending queue failed
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Malformed input to a constructor or configuration
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An engine invariant was violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TryReserveError> for AssignError {
    fn from(e: TryReserveError) -> Self {
        Self::OutOfMemory(e.to_string())
    }
}

impl AssignError {
    pub(crate) fn dims(what: &str, expected: (usize, usize), got: (usize, usize)) -> Self {
        Self::DimensionMismatch(format!(
            "{} is {}x{}, expected {}x{}",
            what, got.0, got.1, expected.0, expected.1
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = AssignError::IndexOutOfBounds { index: 7, limit: 3 };
        assert_eq!(e.to_string(), "index 7 out of bounds (must be < 3)");

        let e = AssignError::dims("mask", (2, 3), (3, 2));
        assert_eq!(e.to_string(), "dimension mismatch: mask is 3x2, expected 2x3");
    }

    #[test]
    fn test_try_reserve_maps_to_oom() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        assert!(matches!(AssignError::from(err), AssignError::OutOfMemory(_)));
    }
}
