//! Pending tuples: insertions not yet placed into the sparse structure
//!
//! Kernels never shift existing entries to make room for a new one. They
//! append `(row, col, value)` to the matrix's pending queue instead, and
//! [`Matrix::wait`](crate::Matrix::wait) sorts and merges the queue later.
//! Duplicate positions in the queue are combined with the queue's operator
//! (`None` keeps the last value), so every tuple in one queue must have been
//! produced under the same operator.

use crate::error::Result;
use crate::matrix::element::Element;
use crate::ops::BinaryOp;

/// The write window handed out by [`PendingTuples::grow`]
pub(crate) struct PendingWindow<'a, T> {
    pub rows: &'a mut [usize],
    pub cols: &'a mut [usize],
    /// Empty when the queue is iso
    pub values: &'a mut [T],
}

/// Queue of deferred insertions for one matrix
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTuples<T> {
    pub(crate) rows: Vec<usize>,
    pub(crate) cols: Vec<usize>,
    /// One value per tuple, or none at all when the queue is iso
    pub(crate) values: Vec<T>,
    pub(crate) op: Option<BinaryOp<T>>,
    pub(crate) iso: bool,
}

impl<T: Element> PendingTuples<T> {
    /// An empty queue combining duplicates with `op`
    pub fn new(op: Option<BinaryOp<T>>, iso: bool) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            op,
            iso,
        }
    }

    /// Number of queued tuples
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Operator the queue combines duplicates with
    pub fn op(&self) -> Option<&BinaryOp<T>> {
        self.op.as_ref()
    }

    /// Whether tuples produced under `op` may join this queue
    pub fn accepts(&self, op: Option<&BinaryOp<T>>) -> bool {
        self.op.as_ref() == op
    }

    /// Queue one tuple; `value` is ignored when the queue is iso
    pub fn push(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.rows.try_reserve(1)?;
        self.cols.try_reserve(1)?;
        if !self.iso {
            self.values.try_reserve(1)?;
            self.values.push(value);
        }
        self.rows.push(row);
        self.cols.push(col);
        Ok(())
    }

    /// Grow the queue by `additional` tuples and return the new, writable tail
    ///
    /// This is the only allocation of the insert phase. Tasks then write into
    /// disjoint parts of the window without synchronization.
    pub(crate) fn grow(&mut self, additional: usize) -> Result<PendingWindow<'_, T>> {
        let old = self.rows.len();
        self.rows.try_reserve_exact(additional)?;
        self.cols.try_reserve_exact(additional)?;
        if !self.iso {
            self.values.try_reserve_exact(additional)?;
            self.values.resize(old + additional, T::default());
        }
        self.rows.resize(old + additional, 0);
        self.cols.resize(old + additional, 0);
        let values = if self.iso { &mut self.values[..] } else { &mut self.values[old..] };
        Ok(PendingWindow {
            rows: &mut self.rows[old..],
            cols: &mut self.cols[old..],
            values,
        })
    }

    /// Give every queued tuple its own copy of `value`
    pub(crate) fn expand_iso(&mut self, value: T) {
        if self.iso {
            self.values = vec![value; self.rows.len()];
            self.iso = false;
        }
    }

    /// Value of tuple `k`, given the matrix's iso value
    #[inline]
    pub(crate) fn value(&self, k: usize, iso_value: Option<T>) -> Option<T> {
        if self.iso {
            iso_value
        } else {
            self.values.get(k).copied()
        }
    }

    /// Positions of the queued tuples, in queue order
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().copied().zip(self.cols.iter().copied())
    }
}
