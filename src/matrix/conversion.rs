//! Conversion functions between sparsity formats

use rayon::prelude::*;
use tracing::debug;

use crate::error::{AssignError, Result};
use crate::matrix::element::Element;
use crate::matrix::storage::{Matrix, Sparsity};
use crate::matrix::zombie::RowIndex;
use crate::utils::{exclusive_scan, try_filled};

impl<T: Element> Matrix<T> {
    /// Switches the matrix to the `target` format
    ///
    /// Deferred work is finished first. Values and iso-ness are preserved.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when converting to [`Sparsity::Full`] while some entry
    /// is absent.
    pub fn convert_to(&mut self, target: Sparsity) -> Result<()> {
        if self.sparsity == target {
            return Ok(());
        }
        self.wait()?;
        if target == Sparsity::Full && !self.is_as_if_full() {
            return Err(AssignError::InvalidValue(format!(
                "cannot convert to full: {} of {} entries present",
                self.nvals(),
                self.nrows * self.ncols
            )));
        }
        debug!(from = ?self.sparsity, to = ?target, nvals = self.nvals(), "converting matrix");

        match (self.sparsity, target) {
            (Sparsity::Hypersparse, Sparsity::Sparse) => self.hyper_to_sparse(),
            (Sparsity::Sparse, Sparsity::Hypersparse) => self.sparse_to_hyper(),
            (Sparsity::Hypersparse | Sparsity::Sparse, Sparsity::Bitmap) => self.compressed_to_bitmap()?,
            (Sparsity::Hypersparse | Sparsity::Sparse, Sparsity::Full) => {
                // as-if-full and sorted: x is already in column-major order
                self.h.clear();
                self.p.clear();
                self.i.clear();
            }
            (Sparsity::Bitmap, Sparsity::Full) => {
                self.b.clear();
                self.nvals_bitmap = 0;
            }
            (Sparsity::Full, Sparsity::Bitmap) => {
                self.b = try_filled(self.nrows * self.ncols, true)?;
                self.nvals_bitmap = self.nrows * self.ncols;
            }
            (Sparsity::Bitmap | Sparsity::Full, Sparsity::Sparse | Sparsity::Hypersparse) => {
                self.dense_to_sparse()?;
                if target == Sparsity::Hypersparse {
                    self.sparse_to_hyper();
                }
                return Ok(());
            }
            _ => {}
        }
        self.sparsity = target;
        Ok(())
    }

    fn hyper_to_sparse(&mut self) {
        let mut p = vec![0; self.ncols + 1];
        for (k, &col) in self.h.iter().enumerate() {
            p[col + 1] = self.p[k + 1] - self.p[k];
        }
        for j in 0..self.ncols {
            p[j + 1] += p[j];
        }
        self.p = p;
        self.h.clear();
    }

    fn sparse_to_hyper(&mut self) {
        let mut h = Vec::new();
        let mut p = vec![0];
        for j in 0..self.ncols {
            if self.p[j + 1] > self.p[j] {
                h.push(j);
                p.push(self.p[j + 1]);
            }
        }
        self.h = h;
        self.p = p;
        self.sparsity = Sparsity::Hypersparse;
    }

    fn compressed_to_bitmap(&mut self) -> Result<()> {
        let n = self.nrows * self.ncols;
        let mut b = try_filled(n, false)?;
        let mut x = if self.iso { Vec::new() } else { try_filled(n, T::default())? };
        for k in 0..self.nvec() {
            let col = self.vector_col(k);
            for pos in self.vector_range(k) {
                let dense = col * self.nrows + self.i[pos].row();
                b[dense] = true;
                if !self.iso {
                    x[dense] = self.x[pos];
                }
            }
        }
        self.nvals_bitmap = self.i.len();
        self.b = b;
        if !self.iso {
            self.x = x;
        }
        self.h.clear();
        self.p.clear();
        self.i.clear();
        Ok(())
    }

    fn dense_to_sparse(&mut self) -> Result<()> {
        let nrows = self.nrows;
        let bitmap = self.sparsity == Sparsity::Bitmap;
        let iso = self.iso;
        let this = &*self;
        let columns: Vec<(Vec<RowIndex>, Vec<T>)> = (0..self.ncols)
            .into_par_iter()
            .map(|j| {
                let range = j * nrows..(j + 1) * nrows;
                let mut rows = Vec::new();
                let mut values = Vec::new();
                for pos in range.clone() {
                    if !bitmap || this.b[pos] {
                        rows.push(RowIndex::Live(pos - range.start));
                        if !iso {
                            values.push(this.x[pos]);
                        }
                    }
                }
                (rows, values)
            })
            .collect();

        let lens: Vec<usize> = columns.iter().map(|(r, _)| r.len()).collect();
        let p = exclusive_scan(&lens);
        let nnz = p[p.len() - 1];
        let mut i = Vec::new();
        i.try_reserve_exact(nnz)?;
        let mut x = Vec::new();
        if !iso {
            x.try_reserve_exact(nnz)?;
        }
        for (rows, values) in columns {
            i.extend(rows);
            x.extend(values);
        }

        self.p = p;
        self.i = i;
        if !iso {
            self.x = x;
        }
        self.b.clear();
        self.nvals_bitmap = 0;
        self.sparsity = Sparsity::Sparse;
        Ok(())
    }
}
