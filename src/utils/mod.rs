//! Utility functions and helpers

pub mod formats;

pub use formats::{from_sprs, to_dense, to_sprs_csc};

use crate::error::Result;

/// Computes an exclusive prefix sum (scan) for a vector
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0); // First element is always 0

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// A vector of `n` copies of `value`, reporting allocation failure as an error
pub(crate) fn try_filled<T: Clone>(n: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    v.resize(n, value);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_scan() {
        let input = vec![1, 2, 3, 4];
        let expected = vec![0, 1, 3, 6, 10];
        assert_eq!(exclusive_scan(&input), expected);

        let input = vec![0, 0, 5, 0];
        let expected = vec![0, 0, 0, 5, 5];
        assert_eq!(exclusive_scan(&input), expected);

        assert_eq!(exclusive_scan(&[]), vec![0]);
    }

    #[test]
    fn test_try_filled() {
        assert_eq!(try_filled(3, 7u8).unwrap(), vec![7, 7, 7]);
        assert!(try_filled(usize::MAX / 2, 0u64).is_err());
    }
}
