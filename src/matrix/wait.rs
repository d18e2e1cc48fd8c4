//! Finishing deferred work
//!
//! [`Matrix::wait`] brings a sparse or hypersparse matrix to its finished
//! state in three steps: compact zombies away, sort jumbled vectors, then
//! merge the pending tuples into the structure.

use rayon::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::matrix::element::Element;
use crate::matrix::pending::PendingTuples;
use crate::matrix::storage::{Matrix, Sparsity};
use crate::matrix::zombie::RowIndex;
use crate::ops::combine;
use crate::parallel::split_by_counts;
use crate::utils::exclusive_scan;

/// One column of the merged result
struct MergedVector<T> {
    col: usize,
    rows: Vec<RowIndex>,
    values: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Finish all deferred work: zombies, jumbled vectors and pending tuples
    ///
    /// Afterwards [`is_finished`](Matrix::is_finished) holds. Bitmap and full
    /// matrices never carry deferred work, so for them this does nothing.
    pub fn wait(&mut self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        debug!(
            nzombies = self.nzombies,
            npending = self.npending(),
            jumbled = self.jumbled,
            sparsity = ?self.sparsity,
            "finishing matrix"
        );
        if self.nzombies > 0 {
            self.remove_zombies();
        }
        if self.jumbled {
            self.unjumble()?;
        }
        if let Some(queue) = self.pending.take() {
            if !queue.is_empty() {
                self.assemble_pending(queue)?;
            }
        }
        Ok(())
    }

    /// Compact zombies out of every vector; hypersparse vectors left empty are dropped
    fn remove_zombies(&mut self) {
        let hyper = self.sparsity == Sparsity::Hypersparse;
        let nvec = self.nvec();
        let mut new_p = Vec::with_capacity(nvec + 1);
        let mut new_h = Vec::new();
        new_p.push(0);

        let mut w = 0;
        for k in 0..nvec {
            let start = w;
            for pos in self.p[k]..self.p[k + 1] {
                if self.i[pos].is_live() {
                    self.i[w] = self.i[pos];
                    if !self.iso {
                        self.x[w] = self.x[pos];
                    }
                    w += 1;
                }
            }
            if hyper {
                if w > start {
                    new_h.push(self.h[k]);
                    new_p.push(w);
                }
            } else {
                new_p.push(w);
            }
        }

        self.i.truncate(w);
        if !self.iso {
            self.x.truncate(w);
        }
        self.p = new_p;
        if hyper {
            self.h = new_h;
        }
        self.nzombies = 0;
    }

    /// Sort the rows of every vector
    fn unjumble(&mut self) -> Result<()> {
        let counts: Vec<usize> = self.p.windows(2).map(|w| w[1] - w[0]).collect();
        let rows = split_by_counts(&mut self.i, &counts)?;
        if self.iso {
            rows.into_par_iter().for_each(|r| r.sort_unstable_by_key(RowIndex::row));
        } else {
            let values = split_by_counts(&mut self.x, &counts)?;
            rows.into_par_iter().zip(values).for_each(|(r, v)| {
                if r.windows(2).all(|w| w[0].row() < w[1].row()) {
                    return;
                }
                let mut pairs: Vec<(RowIndex, T)> = r.iter().copied().zip(v.iter().copied()).collect();
                pairs.sort_unstable_by_key(|(row, _)| row.row());
                for (k, (row, value)) in pairs.into_iter().enumerate() {
                    r[k] = row;
                    v[k] = value;
                }
            });
        }
        self.jumbled = false;
        Ok(())
    }

    /// Merge a non-empty pending queue into a zombie-free, sorted structure
    fn assemble_pending(&mut self, queue: PendingTuples<T>) -> Result<()> {
        let n = queue.len();
        let iso_value = self.iso_value();

        // sort by (col, row, arrival) so duplicates are combined in order
        let mut order: Vec<usize> = Vec::new();
        order.try_reserve_exact(n)?;
        order.extend(0..n);
        order.par_sort_unstable_by_key(|&k| (queue.cols[k], queue.rows[k], k));

        let mut tuples: Vec<(usize, usize, T)> = Vec::new();
        tuples.try_reserve_exact(n)?;
        for k in order {
            let (row, col) = (queue.rows[k], queue.cols[k]);
            let value = if queue.iso { iso_value.unwrap_or_default() } else { queue.values[k] };
            match tuples.last_mut() {
                Some(last) if last.0 == col && last.1 == row => {
                    if !queue.iso {
                        last.2 = combine(queue.op(), last.2, value);
                    }
                }
                _ => tuples.push((col, row, value)),
            }
        }

        // pair every existing vector and every tuple run with its column
        let mut groups: Vec<(usize, Option<usize>, std::ops::Range<usize>)> = Vec::new();
        let nvec = self.nvec();
        let (mut k, mut t) = (0, 0);
        while k < nvec || t < tuples.len() {
            let vcol = (k < nvec).then(|| self.vector_col(k));
            let tcol = tuples.get(t).map(|tup| tup.0);
            let col = match (vcol, tcol) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => break,
            };
            let existing = (vcol == Some(col)).then_some(k);
            if existing.is_some() {
                k += 1;
            }
            let run_start = t;
            while t < tuples.len() && tuples[t].0 == col {
                t += 1;
            }
            groups.push((col, existing, run_start..t));
        }

        let op = queue.op();
        let this = &*self;
        let merged: Vec<MergedVector<T>> = groups
            .into_par_iter()
            .map(|(col, existing, run)| {
                let old = existing.map_or(0..0, |k| this.vector_range(k));
                let new = &tuples[run];
                let mut rows = Vec::with_capacity(old.len() + new.len());
                let mut values = Vec::with_capacity(if this.iso { 0 } else { old.len() + new.len() });
                let (mut a, mut b) = (old.start, 0);
                while a < old.end || b < new.len() {
                    let ra = (a < old.end).then(|| this.i[a].row());
                    let rb = new.get(b).map(|tup| tup.1);
                    match (ra, rb) {
                        (Some(x), Some(y)) if x == y => {
                            rows.push(RowIndex::Live(x));
                            if !this.iso {
                                values.push(combine(op, this.x[a], new[b].2));
                            }
                            a += 1;
                            b += 1;
                        }
                        (Some(x), Some(y)) if x < y => {
                            rows.push(RowIndex::Live(x));
                            if !this.iso {
                                values.push(this.x[a]);
                            }
                            a += 1;
                        }
                        (Some(x), None) => {
                            rows.push(RowIndex::Live(x));
                            if !this.iso {
                                values.push(this.x[a]);
                            }
                            a += 1;
                        }
                        (_, Some(y)) => {
                            rows.push(RowIndex::Live(y));
                            if !this.iso {
                                values.push(new[b].2);
                            }
                            b += 1;
                        }
                        (None, None) => break,
                    }
                }
                MergedVector { col, rows, values }
            })
            .collect();

        self.install(merged)
    }

    /// Replace the structure with merged vectors, given in column order
    fn install(&mut self, merged: Vec<MergedVector<T>>) -> Result<()> {
        let hyper = self.sparsity == Sparsity::Hypersparse;
        let lens: Vec<usize> = merged.iter().map(|v| v.rows.len()).collect();
        let offsets = exclusive_scan(&lens);
        let nnz = offsets[offsets.len() - 1];

        let mut i = Vec::new();
        i.try_reserve_exact(nnz)?;
        let mut x = Vec::new();
        if !self.iso {
            x.try_reserve_exact(nnz)?;
        }

        if hyper {
            self.h = merged.iter().map(|v| v.col).collect();
            self.p = offsets;
        } else {
            // every column has an entry in p, including the untouched empty ones
            let mut p = vec![0; self.ncols + 1];
            for (v, &end) in merged.iter().zip(&offsets[1..]) {
                p[v.col + 1] = end;
            }
            for j in 0..self.ncols {
                p[j + 1] = p[j + 1].max(p[j]);
            }
            self.p = p;
        }
        for v in merged {
            i.extend(v.rows);
            x.extend(v.values);
        }
        self.i = i;
        if !self.iso {
            self.x = x;
        }
        Ok(())
    }
}
