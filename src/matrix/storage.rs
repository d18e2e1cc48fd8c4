//! The matrix container
//!
//! A [`Matrix`] is stored by column: a "vector" is one column. It is held in
//! exactly one of four formats at a time (see [`Sparsity`]); switching between
//! them is always an explicit [`Matrix::convert_to`] call. Sparse and
//! hypersparse matrices may additionally carry deferred work: zombies (entries
//! deleted in place) and pending tuples (insertions not yet placed).

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use crate::constants::{MAX_DISPLAY_ENTRIES_PER_VECTOR, MAX_DISPLAY_VECTORS};
use crate::error::{AssignError, Result};
use crate::matrix::element::Element;
use crate::matrix::pending::PendingTuples;
use crate::matrix::zombie::{find_row, RowIndex};
use crate::ops::{combine, BinaryOp};
use crate::utils::try_filled;

/// Physical representation of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sparsity {
    /// Only non-empty columns are listed, in the hyperlist `h`
    Hypersparse,
    /// Every column has an offset in `p`
    Sparse,
    /// Dense presence flags plus a dense value array
    Bitmap,
    /// Dense values; every entry exists
    Full,
}

impl Sparsity {
    /// Whether the format keeps an explicit row index per entry
    #[inline]
    pub fn is_compressed(self) -> bool {
        matches!(self, Sparsity::Hypersparse | Sparsity::Sparse)
    }
}

/// A sparse matrix with values of type `T`
///
/// Which arrays are in use depends on the format:
///
/// | format      | `h` | `p` | `i` | `b` | `x` |
/// |-------------|-----|-----|-----|-----|-----|
/// | Hypersparse | yes | yes | yes |     | yes |
/// | Sparse      |     | yes | yes |     | yes |
/// | Bitmap      |     |     |     | yes | yes |
/// | Full        |     |     |     |     | yes |
///
/// When the matrix is iso, `x` holds the single value shared by every entry.
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
    pub(crate) sparsity: Sparsity,

    /// Column ids of the stored vectors (hypersparse only), ascending
    pub(crate) h: Vec<usize>,

    /// Vector offsets into `i` and `x` (size: nvec + 1)
    pub(crate) p: Vec<usize>,

    /// Row index of each stored entry, live or zombie
    pub(crate) i: Vec<RowIndex>,

    /// Presence flags, column-major (bitmap only)
    pub(crate) b: Vec<bool>,

    /// Values; a single value when `iso`
    pub(crate) x: Vec<T>,

    pub(crate) iso: bool,

    /// Number of set flags in `b`
    pub(crate) nvals_bitmap: usize,

    pub(crate) nzombies: usize,
    pub(crate) pending: Option<PendingTuples<T>>,

    /// Some vector's rows are out of order
    pub(crate) jumbled: bool,
}

impl<T: Element> Matrix<T> {
    /// Creates an empty sparse matrix
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            sparsity: Sparsity::Sparse,
            h: Vec::new(),
            p: vec![0; ncols + 1],
            i: Vec::new(),
            b: Vec::new(),
            x: Vec::new(),
            iso: false,
            nvals_bitmap: 0,
            nzombies: 0,
            pending: None,
            jumbled: false,
        }
    }

    /// Creates an empty hypersparse matrix
    pub fn hypersparse(nrows: usize, ncols: usize) -> Self {
        Self {
            sparsity: Sparsity::Hypersparse,
            p: vec![0],
            ..Self::new(nrows, 0)
        }
        .with_ncols(ncols)
    }

    fn with_ncols(mut self, ncols: usize) -> Self {
        self.ncols = ncols;
        self
    }

    /// Creates a full matrix from values in column-major order
    ///
    /// # Errors
    ///
    /// `InvalidValue` if `values.len() != nrows * ncols`.
    pub fn full(nrows: usize, ncols: usize, values: Vec<T>) -> Result<Self> {
        let n = dense_len(nrows, ncols)?;
        if values.len() != n {
            return Err(AssignError::InvalidValue(format!(
                "full {}x{} matrix needs {} values, got {}",
                nrows,
                ncols,
                n,
                values.len()
            )));
        }
        Ok(Self {
            sparsity: Sparsity::Full,
            p: Vec::new(),
            x: values,
            ..Self::new(nrows, 0)
        }
        .with_ncols(ncols))
    }

    /// Creates a full matrix whose entries all equal `value`
    pub fn iso_full(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            sparsity: Sparsity::Full,
            p: Vec::new(),
            x: vec![value],
            iso: true,
            ..Self::new(nrows, 0)
        }
        .with_ncols(ncols)
    }

    /// Creates an empty bitmap matrix
    pub fn bitmap(nrows: usize, ncols: usize) -> Result<Self> {
        let n = dense_len(nrows, ncols)?;
        Ok(Self {
            sparsity: Sparsity::Bitmap,
            p: Vec::new(),
            b: try_filled(n, false)?,
            x: try_filled(n, T::default())?,
            ..Self::new(nrows, 0)
        }
        .with_ncols(ncols))
    }

    /// Creates a sparse matrix from compressed-column arrays
    ///
    /// # Arguments
    ///
    /// * `col_ptr` - Column offsets (size: ncols + 1)
    /// * `row_idx` - Row index of each entry
    /// * `values` - Value of each entry
    ///
    /// Rows within a column may be given in any order; the matrix is then
    /// marked jumbled and sorted by the next [`wait`](Matrix::wait).
    ///
    /// # Errors
    ///
    /// `InvalidValue` for inconsistent arrays or a repeated row within a
    /// column, `IndexOutOfBounds` for a row index `>= nrows`.
    pub fn from_csc(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self> {
        if col_ptr.len() != ncols + 1 {
            return Err(AssignError::InvalidValue("col_ptr.len() must be ncols + 1".into()));
        }
        if row_idx.len() != values.len() {
            return Err(AssignError::InvalidValue(
                "row_idx.len() must equal values.len()".into(),
            ));
        }
        if col_ptr[0] != 0
            || col_ptr[ncols] != row_idx.len()
            || col_ptr.windows(2).any(|w| w[0] > w[1])
        {
            return Err(AssignError::InvalidValue(
                "col_ptr must be non-decreasing from 0 to row_idx.len()".into(),
            ));
        }

        let mut jumbled = false;
        for w in col_ptr.windows(2) {
            let rows = &row_idx[w[0]..w[1]];
            if let Some(&bad) = rows.iter().find(|&&r| r >= nrows) {
                return Err(AssignError::IndexOutOfBounds { index: bad, limit: nrows });
            }
            if rows.windows(2).all(|r| r[0] < r[1]) {
                continue;
            }
            let mut sorted = rows.to_vec();
            sorted.sort_unstable();
            if sorted.windows(2).any(|r| r[0] == r[1]) {
                return Err(AssignError::InvalidValue("repeated row within a column".into()));
            }
            jumbled = true;
        }

        Ok(Self {
            p: col_ptr,
            i: row_idx.into_iter().map(RowIndex::Live).collect(),
            x: values,
            jumbled,
            ..Self::new(nrows, 0)
        }
        .with_ncols(ncols))
    }

    /// Creates a sparse matrix from `(row, col, value)` triplets
    ///
    /// Repeated positions are combined with `dup`, in input order; with no
    /// operator the last value wins.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[T],
        dup: Option<&BinaryOp<T>>,
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(AssignError::InvalidValue(
                "rows, cols and values must have the same length".into(),
            ));
        }
        let mut m = Self::new(nrows, ncols);
        let mut queue = PendingTuples::new(dup.cloned(), false);
        for ((&r, &c), &v) in rows.iter().zip(cols).zip(values) {
            m.check_bounds(r, c)?;
            queue.push(r, c, v)?;
        }
        m.pending = Some(queue);
        m.wait()?;
        Ok(m)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    pub fn sparsity(&self) -> Sparsity {
        self.sparsity
    }

    /// Whether all entries share one stored value
    pub fn is_iso(&self) -> bool {
        self.iso
    }

    /// The shared value of an iso matrix
    pub fn iso_value(&self) -> Option<T> {
        if self.iso {
            self.x.first().copied()
        } else {
            None
        }
    }

    /// Number of live entries in the structure
    ///
    /// Zombies are not counted and neither are pending tuples; call
    /// [`wait`](Matrix::wait) first for the logical count.
    pub fn nvals(&self) -> usize {
        match self.sparsity {
            Sparsity::Hypersparse | Sparsity::Sparse => self.i.len() - self.nzombies,
            Sparsity::Bitmap => self.nvals_bitmap,
            Sparsity::Full => self.nrows * self.ncols,
        }
    }

    pub fn nzombies(&self) -> usize {
        self.nzombies
    }

    /// Number of queued insertions
    pub fn npending(&self) -> usize {
        self.pending.as_ref().map_or(0, PendingTuples::len)
    }

    /// The pending-tuple queue, if any
    pub fn pending(&self) -> Option<&PendingTuples<T>> {
        self.pending.as_ref()
    }

    pub fn is_jumbled(&self) -> bool {
        self.jumbled
    }

    /// No zombies, no pending tuples, every vector sorted
    pub fn is_finished(&self) -> bool {
        self.nzombies == 0 && self.npending() == 0 && !self.jumbled
    }

    /// No entries at all, counting pending tuples
    pub fn is_empty(&self) -> bool {
        self.nvals() == 0 && self.npending() == 0
    }

    /// Whether every entry is present, whatever the format
    pub fn is_as_if_full(&self) -> bool {
        match self.sparsity {
            Sparsity::Full => true,
            _ => self.is_finished() && Some(self.nvals()) == self.nrows.checked_mul(self.ncols),
        }
    }

    /// Value at `(row, col)`, including pending tuples
    ///
    /// Returns `None` for an absent entry or a position outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.nrows || col >= self.ncols {
            return None;
        }
        let stored = if self.jumbled {
            self.find_vector(col).and_then(|k| {
                self.vector_range(k)
                    .find(|&pos| self.i[pos] == RowIndex::Live(row))
                    .map(|pos| self.value_at(pos))
            })
        } else {
            self.entry(row, col)
        };
        if stored.is_some() {
            return stored;
        }

        let queue = self.pending.as_ref()?;
        let iso_value = self.iso_value();
        let mut found = None;
        for (k, (r, c)) in queue.positions().enumerate() {
            if r == row && c == col {
                let v = queue.value(k, iso_value)?;
                found = Some(match found {
                    Some(prev) => combine(queue.op(), prev, v),
                    None => v,
                });
            }
        }
        found
    }

    /// Live entries in column-major order, including pending tuples
    pub fn to_triplets(&self) -> Result<(Vec<usize>, Vec<usize>, Vec<T>)> {
        let m = self.finished()?;
        let n = m.nvals();
        let (mut rows, mut cols, mut vals) = (Vec::new(), Vec::new(), Vec::new());
        rows.try_reserve_exact(n)?;
        cols.try_reserve_exact(n)?;
        vals.try_reserve_exact(n)?;
        for k in 0..m.nvec() {
            let col = m.vector_col(k);
            for pos in m.vector_range(k) {
                if m.is_present(pos) {
                    rows.push(m.row_at(pos));
                    cols.push(col);
                    vals.push(m.value_at(pos));
                }
            }
        }
        Ok((rows, cols, vals))
    }

    /// Remove every entry
    ///
    /// A hypersparse matrix stays hypersparse; every other format becomes an
    /// empty sparse matrix.
    pub fn clear(&mut self) {
        let (nrows, ncols) = (self.nrows, self.ncols);
        *self = match self.sparsity {
            Sparsity::Hypersparse => Self::hypersparse(nrows, ncols),
            _ => Self::new(nrows, ncols),
        };
    }

    /// Set `C(row, col) = value`
    ///
    /// On a sparse or hypersparse matrix, a new entry is queued as a pending
    /// tuple; an existing or deleted entry is updated in place.
    pub fn set_element(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        match self.sparsity {
            Sparsity::Full => self.write_value(col * self.nrows + row, value),
            Sparsity::Bitmap => {
                let pos = col * self.nrows + row;
                if !self.b[pos] {
                    self.b[pos] = true;
                    self.nvals_bitmap += 1;
                }
                self.write_value(pos, value)
            }
            Sparsity::Hypersparse | Sparsity::Sparse => {
                if self.jumbled || self.pending.as_ref().is_some_and(|q| !q.accepts(None)) {
                    self.wait()?;
                }
                match self.find_slot(row, col) {
                    Some(pos) => {
                        if self.i[pos].is_zombie() {
                            self.i[pos] = self.i[pos].revive();
                            self.nzombies -= 1;
                        }
                        self.write_value(pos, value)
                    }
                    None => {
                        if self.iso_value().is_some_and(|v| v != value) {
                            self.expand_iso()?;
                        }
                        let iso = self.iso;
                        self.pending
                            .get_or_insert_with(|| PendingTuples::new(None, iso))
                            .push(row, col, value)
                    }
                }
            }
        }
    }

    /// Delete the entry at `(row, col)`, if any
    ///
    /// A full matrix becomes a bitmap.
    pub fn remove_element(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_bounds(row, col)?;
        if self.sparsity == Sparsity::Full {
            self.convert_to(Sparsity::Bitmap)?;
        }
        match self.sparsity {
            Sparsity::Bitmap => {
                let pos = col * self.nrows + row;
                if self.b[pos] {
                    self.b[pos] = false;
                    self.nvals_bitmap -= 1;
                }
            }
            _ => {
                if !self.is_finished() {
                    self.wait()?;
                }
                if let Some(pos) = self.find_slot(row, col) {
                    if self.i[pos].is_live() {
                        self.i[pos] = self.i[pos].kill();
                        self.nzombies += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// This matrix if finished, else a finished copy
    pub(crate) fn finished(&self) -> Result<Cow<'_, Self>> {
        if self.is_finished() {
            return Ok(Cow::Borrowed(self));
        }
        let mut copy = self.clone();
        copy.wait()?;
        Ok(Cow::Owned(copy))
    }

    pub(crate) fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.nrows {
            return Err(AssignError::IndexOutOfBounds { index: row, limit: self.nrows });
        }
        if col >= self.ncols {
            return Err(AssignError::IndexOutOfBounds { index: col, limit: self.ncols });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Storage-level access
    // ------------------------------------------------------------------

    /// Number of storage slots: stored entries, or `nrows * ncols` if dense
    pub(crate) fn nstored(&self) -> usize {
        if self.sparsity.is_compressed() {
            self.i.len()
        } else {
            self.nrows * self.ncols
        }
    }

    /// Number of vectors
    #[inline]
    pub(crate) fn nvec(&self) -> usize {
        match self.sparsity {
            Sparsity::Hypersparse => self.h.len(),
            _ => self.ncols,
        }
    }

    /// Column id of vector `k`
    #[inline]
    pub(crate) fn vector_col(&self, k: usize) -> usize {
        match self.sparsity {
            Sparsity::Hypersparse => self.h[k],
            _ => k,
        }
    }

    /// Storage slots of vector `k`
    #[inline]
    pub(crate) fn vector_range(&self, k: usize) -> Range<usize> {
        if self.sparsity.is_compressed() {
            self.p[k]..self.p[k + 1]
        } else {
            k * self.nrows..(k + 1) * self.nrows
        }
    }

    /// Vector holding column `col`, if stored
    #[inline]
    pub(crate) fn find_vector(&self, col: usize) -> Option<usize> {
        match self.sparsity {
            Sparsity::Hypersparse => self.h.binary_search(&col).ok(),
            _ => (col < self.ncols).then_some(col),
        }
    }

    #[inline]
    pub(crate) fn row_at(&self, pos: usize) -> usize {
        if self.sparsity.is_compressed() {
            self.i[pos].row()
        } else {
            pos % self.nrows
        }
    }

    #[inline]
    pub(crate) fn value_at(&self, pos: usize) -> T {
        if self.iso {
            self.x[0]
        } else {
            self.x[pos]
        }
    }

    /// Whether slot `pos` holds a live entry
    #[inline]
    pub(crate) fn is_present(&self, pos: usize) -> bool {
        match self.sparsity {
            Sparsity::Hypersparse | Sparsity::Sparse => self.i[pos].is_live(),
            Sparsity::Bitmap => self.b[pos],
            Sparsity::Full => true,
        }
    }

    /// Slot for `(row, col)`: the live or zombie entry, or the dense position
    ///
    /// Requires sorted vectors.
    pub(crate) fn find_slot(&self, row: usize, col: usize) -> Option<usize> {
        if !self.sparsity.is_compressed() {
            return (row < self.nrows && col < self.ncols).then(|| col * self.nrows + row);
        }
        let k = self.find_vector(col)?;
        let range = self.vector_range(k);
        find_row(&self.i[range.clone()], row).map(|offset| range.start + offset)
    }

    /// Value of the live entry at `(row, col)`, ignoring pending tuples
    #[inline]
    pub(crate) fn entry(&self, row: usize, col: usize) -> Option<T> {
        let pos = self.find_slot(row, col)?;
        self.is_present(pos).then(|| self.value_at(pos))
    }

    /// Storage slots of column `col`, or the empty range where it would be
    pub(crate) fn column_slots(&self, col: usize) -> Range<usize> {
        match self.sparsity {
            Sparsity::Hypersparse => {
                let k = self.h.partition_point(|&c| c < col);
                if self.h.get(k) == Some(&col) {
                    self.p[k]..self.p[k + 1]
                } else {
                    self.p[k]..self.p[k]
                }
            }
            Sparsity::Sparse => self.p[col]..self.p[col + 1],
            Sparsity::Bitmap | Sparsity::Full => col * self.nrows..(col + 1) * self.nrows,
        }
    }

    /// Make every entry share `value`
    pub(crate) fn set_iso(&mut self, value: T) {
        self.x.clear();
        self.x.push(value);
        self.iso = true;
        if let Some(queue) = self.pending.as_mut() {
            queue.values.clear();
            queue.iso = true;
        }
    }

    /// Give every slot its own copy of the iso value
    pub(crate) fn expand_iso(&mut self) -> Result<()> {
        if let Some(value) = self.iso_value() {
            self.x = try_filled(self.nstored(), value)?;
            self.iso = false;
            if let Some(queue) = self.pending.as_mut() {
                queue.expand_iso(value);
            }
        }
        Ok(())
    }

    fn write_value(&mut self, pos: usize, value: T) -> Result<()> {
        if self.iso {
            if self.x[0] == value {
                return Ok(());
            }
            self.expand_iso()?;
        }
        self.x[pos] = value;
        Ok(())
    }
}

fn dense_len(nrows: usize, ncols: usize) -> Result<usize> {
    nrows
        .checked_mul(ncols)
        .ok_or_else(|| AssignError::InvalidValue(format!("{}x{} is too large to be dense", nrows, ncols)))
}

impl<T: Element> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {{")?;
        writeln!(f, "  dimensions: {} × {}", self.nrows, self.ncols)?;
        writeln!(f, "  sparsity: {:?}{}", self.sparsity, if self.iso { " (iso)" } else { "" })?;
        writeln!(
            f,
            "  nvals: {} (zombies: {}, pending: {})",
            self.nvals(),
            self.nzombies,
            self.npending()
        )?;

        let nvec = self.nvec();
        let max_vectors_to_print = MAX_DISPLAY_VECTORS.min(nvec);
        if max_vectors_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for k in 0..max_vectors_to_print {
                write!(f, "    col {}: ", self.vector_col(k))?;
                let slots: Vec<usize> = self
                    .vector_range(k)
                    .filter(|&pos| self.sparsity.is_compressed() || self.is_present(pos))
                    .collect();

                if slots.is_empty() {
                    writeln!(f, "(empty)")?;
                    continue;
                }
                for &pos in slots.iter().take(MAX_DISPLAY_ENTRIES_PER_VECTOR) {
                    let marker = if self.is_present(pos) { "" } else { "z" };
                    write!(f, "({}{}, {:?}) ", marker, self.row_at(pos), self.value_at(pos))?;
                }
                if slots.len() > MAX_DISPLAY_ENTRIES_PER_VECTOR {
                    write!(f, "... ({} more)", slots.len() - MAX_DISPLAY_ENTRIES_PER_VECTOR)?;
                }
                writeln!(f)?;
            }

            if nvec > max_vectors_to_print {
                writeln!(f, "    ... ({} more columns)", nvec - max_vectors_to_print)?;
            }
        }

        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<i32> {
        // [1 . 2]
        // [. 3 .]
        // [4 . 5]
        Matrix::from_csc(3, 3, vec![0, 2, 3, 5], vec![0, 2, 1, 0, 2], vec![1, 4, 3, 2, 5]).unwrap()
    }

    #[test]
    fn test_from_csc() {
        let m = sample();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.nvals(), 5);
        assert_eq!(m.get(2, 0), Some(4));
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.get(5, 0), None);
        assert!(m.is_finished());
        assert!(!m.is_as_if_full());
    }

    #[test]
    fn test_from_csc_rejects_bad_input() {
        assert!(matches!(
            Matrix::<i32>::from_csc(2, 1, vec![0, 1], vec![2], vec![1]),
            Err(AssignError::IndexOutOfBounds { index: 2, limit: 2 })
        ));
        assert!(Matrix::<i32>::from_csc(2, 1, vec![0, 2], vec![1, 1], vec![1, 2]).is_err());
        assert!(Matrix::<i32>::from_csc(2, 2, vec![0, 1], vec![1], vec![1]).is_err());
    }

    #[test]
    fn test_unsorted_csc_is_jumbled() {
        let m = Matrix::from_csc(3, 1, vec![0, 2], vec![2, 0], vec![7, 8]).unwrap();
        assert!(m.is_jumbled());
        assert_eq!(m.get(0, 0), Some(8));
    }

    #[test]
    fn test_from_triplets_combines_duplicates() {
        let plus = BinaryOp::plus();
        let m = Matrix::from_triplets(2, 2, &[0, 1, 0], &[0, 1, 0], &[1, 2, 3], Some(&plus)).unwrap();
        assert_eq!(m.get(0, 0), Some(4));
        assert_eq!(m.nvals(), 2);

        let m = Matrix::from_triplets(2, 2, &[0, 0], &[0, 0], &[1, 3], None).unwrap();
        assert_eq!(m.get(0, 0), Some(3));
    }

    #[test]
    fn test_set_and_remove() {
        let mut m = sample();
        m.set_element(1, 0, 9).unwrap();
        assert_eq!(m.npending(), 1);
        assert_eq!(m.get(1, 0), Some(9));

        m.set_element(0, 0, 10).unwrap();
        assert_eq!(m.npending(), 1);
        assert_eq!(m.get(0, 0), Some(10));

        m.remove_element(2, 2).unwrap();
        // the pending tuple forced a wait before the delete
        assert_eq!(m.npending(), 0);
        assert_eq!(m.nzombies(), 1);
        assert_eq!(m.get(2, 2), None);

        m.set_element(2, 2, 6).unwrap();
        assert_eq!(m.nzombies(), 0);
        assert_eq!(m.get(2, 2), Some(6));
    }

    #[test]
    fn test_iso_full() {
        let mut m = Matrix::iso_full(2, 2, 1.5f64);
        assert!(m.is_iso());
        assert_eq!(m.nvals(), 4);
        assert!(m.is_as_if_full());
        m.set_element(1, 1, 1.5).unwrap();
        assert!(m.is_iso());
        m.set_element(1, 1, 2.5).unwrap();
        assert!(!m.is_iso());
        assert_eq!(m.get(1, 1), Some(2.5));
        assert_eq!(m.get(0, 1), Some(1.5));
    }

    #[test]
    fn test_remove_from_full_makes_bitmap() {
        let mut m = Matrix::full(2, 1, vec![1u8, 2]).unwrap();
        m.remove_element(0, 0).unwrap();
        assert_eq!(m.sparsity(), Sparsity::Bitmap);
        assert_eq!(m.nvals(), 1);
        assert_eq!(m.get(1, 0), Some(2));
    }

    #[test]
    fn test_column_slots_hypersparse() {
        let mut m = Matrix::<i32>::hypersparse(4, 10);
        m.set_element(1, 3, 5).unwrap();
        m.set_element(2, 7, 6).unwrap();
        m.wait().unwrap();
        assert_eq!(m.h, vec![3, 7]);
        assert_eq!(m.column_slots(3), 0..1);
        assert_eq!(m.column_slots(5), 1..1);
        assert_eq!(m.column_slots(7), 1..2);
        assert_eq!(m.column_slots(9), 2..2);
    }

    #[test]
    fn test_to_triplets_includes_pending() {
        let mut m = Matrix::<i32>::new(2, 2);
        m.set_element(1, 1, 4).unwrap();
        m.set_element(0, 1, 3).unwrap();
        let (rows, cols, vals) = m.to_triplets().unwrap();
        assert_eq!(rows, vec![0, 1]);
        assert_eq!(cols, vec![1, 1]);
        assert_eq!(vals, vec![3, 4]);
    }

    #[test]
    fn test_debug_output() {
        let s = format!("{:?}", sample());
        assert!(s.contains("dimensions: 3 × 3"));
        assert!(s.contains("col 0: (0, 1) (2, 4)"));
    }
}
