//! Utilities for converting between our matrix and external libraries

use ndarray::Array2;
use sprs::CsMat;

use crate::error::Result;
use crate::matrix::{Element, Matrix, Sparsity};

/// Converts a matrix to sprs CsMat format (as CSC)
///
/// Pending work is finished on a copy; iso values are expanded.
pub fn to_sprs_csc<T: Element>(matrix: &Matrix<T>) -> Result<CsMat<T>> {
    let mut m = matrix.finished()?.into_owned();
    m.convert_to(Sparsity::Sparse)?;
    m.expand_iso()?;
    Ok(CsMat::new_csc(
        m.shape(),
        m.p,
        m.i.iter().map(|r| r.row()).collect(),
        m.x,
    ))
}

/// Converts a sprs CsMat (either storage order) into a sparse matrix
pub fn from_sprs<T: Element>(matrix: CsMat<T>) -> Result<Matrix<T>> {
    // Ensure matrix is in CSC format
    let matrix = if matrix.is_csc() { matrix } else { matrix.to_csc() };

    let shape = matrix.shape();
    let (indptr, indices, data) = matrix.into_raw_storage();

    Matrix::from_csc(shape.0, shape.1, indptr, indices, data)
}

/// Converts a matrix to a dense ndarray, writing `fill` where entries are absent
pub fn to_dense<T: Element>(matrix: &Matrix<T>, fill: T) -> Result<Array2<T>> {
    let mut dense = Array2::from_elem(matrix.shape(), fill);
    let (rows, cols, vals) = matrix.to_triplets()?;
    for ((r, c), v) in rows.into_iter().zip(cols).zip(vals) {
        dense[[r, c]] = v;
    }
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<f64> {
        Matrix::from_csc(3, 3, vec![0, 2, 4, 5], vec![0, 2, 0, 1, 2], vec![1.0, 4.0, 2.0, 3.0, 5.0]).unwrap()
    }

    #[test]
    fn test_csc_roundtrip() {
        let original = sample();
        let sprs_mat = to_sprs_csc(&original).unwrap();
        assert_eq!(sprs_mat.nnz(), 5);
        let roundtrip = from_sprs(sprs_mat).unwrap();
        assert_eq!(roundtrip, original);
    }

    #[test]
    fn test_from_csr_via_sprs() {
        let csr = CsMat::new((2, 2), vec![0, 1, 2], vec![1, 0], vec![7.0f64, 8.0]);
        let m = from_sprs(csr).unwrap();
        assert_eq!(m.get(0, 1), Some(7.0));
        assert_eq!(m.get(1, 0), Some(8.0));
    }

    #[test]
    fn test_iso_and_pending_are_materialized() {
        let mut m = Matrix::iso_full(2, 2, 3i32);
        m.convert_to(Sparsity::Sparse).unwrap();
        m.remove_element(0, 0).unwrap();
        let s = to_sprs_csc(&m).unwrap();
        assert_eq!(s.nnz(), 3);
        assert_eq!(s.data(), &[3, 3, 3]);
    }

    #[test]
    fn test_to_dense() {
        let dense = to_dense(&sample(), 0.0).unwrap();
        assert_eq!(dense.shape(), &[3, 3]);
        assert_eq!(dense[[2, 0]], 4.0);
        assert_eq!(dense[[1, 0]], 0.0);
        assert_eq!(dense[[0, 1]], 2.0);
    }
}
