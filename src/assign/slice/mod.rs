//! Task slicing
//!
//! A sparse kernel walks a list of vectors (one per position `jA` of `J` that
//! has work) and, within each, a list of driver entries and possibly a second
//! list to merge with. The slicer cuts that work into tasks:
//!
//! - a *coarse* task owns a run of whole vectors;
//! - a *fine* task owns one band of positions `iA` within a single vector,
//!   with the matching subranges of the driver and the other list.
//!
//! Every task also gets an *output* range: the contiguous slots of `C` it may
//! touch. Output ranges of different tasks never overlap, which is what lets
//! the kernels hand each task its own `&mut` piece of `C`.

pub mod cartesian;
pub mod single;
pub mod union;

use std::ops::Range;

use crate::assign::symbolic::SymbolicPattern;
use crate::constants::MIN_FINE_TASKS_PER_VECTOR;
use crate::index::IndexSet;
use crate::matrix::{Element, Matrix, RowIndex};

/// The work of one vector of the traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSpan {
    /// Position in `J`
    pub ja: usize,
    /// Entries of the driving list
    pub driver: Range<usize>,
    /// Entries of the list merged with the driver, if any
    pub other: Range<usize>,
}

/// Which part of the traversal a task owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Vectors `kfirst..=klast`, whole
    Coarse { kfirst: usize, klast: usize },
    /// Positions `rows` of vector `k`
    Fine {
        k: usize,
        rows: Range<usize>,
        driver: Range<usize>,
        other: Range<usize>,
    },
}

/// One unit of parallel work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    /// Slots of `C` the task may read and write
    pub output: Range<usize>,
    /// Insertions counted by the first phase
    pub pending: usize,
}

/// The vectors of a traversal and the tasks covering them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPlan {
    pub vectors: Vec<VectorSpan>,
    pub tasks: Vec<Task>,
}

impl TaskPlan {
    /// The spans a task visits, each with its band of positions
    pub fn spans(&self, task: &Task, ni: usize) -> Vec<(VectorSpan, Range<usize>)> {
        match &task.kind {
            TaskKind::Coarse { kfirst, klast } => self.vectors[*kfirst..=*klast]
                .iter()
                .map(|v| (v.clone(), 0..ni))
                .collect(),
            TaskKind::Fine { k, rows, driver, other } => vec![(
                VectorSpan {
                    ja: self.vectors[*k].ja,
                    driver: driver.clone(),
                    other: other.clone(),
                },
                rows.clone(),
            )],
        }
    }
}

/// A list of entries grouped by vector, each entry knowing its position `iA`
///
/// Positions are ascending within a vector.
pub trait Pattern: Sync {
    /// Number of stored vectors
    fn nvectors(&self) -> usize;
    /// Position in `J` of stored vector `k`
    fn vector_id(&self, k: usize) -> usize;
    /// Entries of stored vector `k`
    fn entries(&self, k: usize) -> Range<usize>;
    /// Entries of the vector at position `ja`, empty if it is not stored
    fn entries_of(&self, ja: usize) -> Range<usize>;
    /// Position `iA` of entry `pos`
    fn ia(&self, pos: usize) -> usize;
}

impl Pattern for SymbolicPattern {
    fn nvectors(&self) -> usize {
        self.p.len() - 1
    }

    fn vector_id(&self, k: usize) -> usize {
        k
    }

    fn entries(&self, k: usize) -> Range<usize> {
        self.vector(k)
    }

    fn entries_of(&self, ja: usize) -> Range<usize> {
        self.vector(ja)
    }

    #[inline]
    fn ia(&self, pos: usize) -> usize {
        self.ia[pos]
    }
}

impl<X: Element> Pattern for Matrix<X> {
    fn nvectors(&self) -> usize {
        self.nvec()
    }

    fn vector_id(&self, k: usize) -> usize {
        self.vector_col(k)
    }

    fn entries(&self, k: usize) -> Range<usize> {
        self.vector_range(k)
    }

    fn entries_of(&self, ja: usize) -> Range<usize> {
        self.column_slots(ja)
    }

    #[inline]
    fn ia(&self, pos: usize) -> usize {
        self.row_at(pos)
    }
}

/// First entry of `range` whose position is at least `ia`
pub(crate) fn seek<P: Pattern + ?Sized>(pattern: &P, range: Range<usize>, ia: usize) -> usize {
    let (mut lo, mut hi) = (range.start, range.end);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pattern.ia(mid) < ia {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Band boundaries cutting `0..ni` into at most `nparts` bands
///
/// Boundaries are taken at evenly spaced entries of `driver` (or of `other`
/// when the driver is empty), so each band carries a similar share of it.
fn band_bounds<P: Pattern + ?Sized, Q: Pattern + ?Sized>(
    ni: usize,
    nparts: usize,
    driver: (&P, Range<usize>),
    other: (&Q, Range<usize>),
) -> Vec<usize> {
    let mut bounds = vec![0];
    for t in 1..nparts {
        let b = if !driver.1.is_empty() {
            let r = &driver.1;
            driver.0.ia(r.start + r.len() * t / nparts)
        } else if !other.1.is_empty() {
            let r = &other.1;
            other.0.ia(r.start + r.len() * t / nparts)
        } else {
            ni * t / nparts
        };
        if b > bounds[bounds.len() - 1] && b < ni {
            bounds.push(b);
        }
    }
    bounds.push(ni);
    bounds
}

/// Split vector `k` into fine tasks of roughly equal work
pub(crate) fn fine_tasks<P: Pattern + ?Sized, Q: Pattern + ?Sized>(
    k: usize,
    span: &VectorSpan,
    ni: usize,
    nparts: usize,
    driver: &P,
    other: &Q,
) -> Vec<TaskKind> {
    let bounds = band_bounds(ni, nparts, (driver, span.driver.clone()), (other, span.other.clone()));
    bounds
        .windows(2)
        .map(|w| {
            let (lo, hi) = (w[0], w[1]);
            let d = seek(driver, span.driver.clone(), lo)..seek(driver, span.driver.clone(), hi);
            let o = seek(other, span.other.clone(), lo)..seek(other, span.other.clone(), hi);
            TaskKind::Fine { k, rows: lo..hi, driver: d, other: o }
        })
        .collect()
}

/// Group vectors into tasks greedily by cumulative work
///
/// A vector whose work exceeds a task's share is split into fine tasks.
pub(crate) fn group<P: Pattern + ?Sized, Q: Pattern + ?Sized>(
    vectors: &[VectorSpan],
    ni: usize,
    ntasks: usize,
    driver: &P,
    other: &Q,
) -> Vec<TaskKind> {
    if vectors.is_empty() {
        return Vec::new();
    }
    if ntasks <= 1 {
        return vec![TaskKind::Coarse { kfirst: 0, klast: vectors.len() - 1 }];
    }

    let work = |v: &VectorSpan| v.driver.len() + v.other.len();
    let total: usize = vectors.iter().map(work).sum();
    let target = total.div_ceil(ntasks).max(1);

    let mut kinds = Vec::new();
    let mut start = None;
    let mut acc = 0;
    for (k, v) in vectors.iter().enumerate() {
        let w = work(v);
        if w > target && ni > 1 {
            if let Some(first) = start.take() {
                kinds.push(TaskKind::Coarse { kfirst: first, klast: k - 1 });
                acc = 0;
            }
            let nparts = w.div_ceil(target).max(MIN_FINE_TASKS_PER_VECTOR).min(ni);
            kinds.extend(fine_tasks(k, v, ni, nparts, driver, other));
            continue;
        }
        start.get_or_insert(k);
        acc += w;
        if acc >= target {
            if let Some(first) = start.take() {
                kinds.push(TaskKind::Coarse { kfirst: first, klast: k });
            }
            acc = 0;
        }
    }
    if let Some(first) = start {
        kinds.push(TaskKind::Coarse { kfirst: first, klast: vectors.len() - 1 });
    }
    kinds
}

/// Attach to each task the slots of `C` it owns
///
/// `c_cols[ja]` is the slot range of `C(:, J[ja])`; `c_rows` are the row
/// indices of `C`, sorted within each vector.
pub(crate) fn with_outputs(
    kinds: Vec<TaskKind>,
    vectors: &[VectorSpan],
    c_cols: &[Range<usize>],
    c_rows: &[RowIndex],
    rows: &IndexSet<'_>,
) -> Vec<Task> {
    kinds
        .into_iter()
        .map(|kind| {
            let output = match &kind {
                TaskKind::Coarse { kfirst, klast } => {
                    let a = &c_cols[vectors[*kfirst].ja];
                    let b = &c_cols[vectors[*klast].ja];
                    a.start.min(b.start)..a.end.max(b.end)
                }
                TaskKind::Fine { k, rows: band, .. } => {
                    band_slots(&c_cols[vectors[*k].ja], c_rows, rows, band.clone())
                }
            };
            Task { kind, output, pending: 0 }
        })
        .collect()
}

/// Slots of one vector of `C` holding the rows of a band of positions
fn band_slots(col: &Range<usize>, c_rows: &[RowIndex], rows: &IndexSet<'_>, band: Range<usize>) -> Range<usize> {
    let slots = &c_rows[col.clone()];
    let first_at_least = |i: usize| col.start + slots.partition_point(|r| r.row() < i);
    let first_above = |i: usize| col.start + slots.partition_point(|r| r.row() <= i);
    let n = rows.len();
    if rows.is_ascending() {
        let start = if band.start == 0 { col.start } else { first_at_least(rows.get(band.start)) };
        let end = if band.end == n { col.end } else { first_at_least(rows.get(band.end)) };
        start..end
    } else {
        let start = if band.end == n { col.start } else { first_above(rows.get(band.end)) };
        let end = if band.start == 0 { col.end } else { first_above(rows.get(band.start)) };
        start..end
    }
}
