//! Assignment kernels
//!
//! Sparse kernels run in two phases over the tasks of a [`TaskPlan`]:
//!
//! 1. Every task walks its positions and applies the action the decision
//!    table gives for each: overwrite, accumulate, delete (zombie) or revive
//!    in place. Insertions are only counted.
//! 2. The counts are prefix-summed, the pending queue grows once, and every
//!    task walks its positions again to write its insertions into its own
//!    slice of the queue.
//!
//! Each task owns a disjoint `&mut` piece of `C`'s row indices and values, so
//! both phases run without locks and give the same result for any number of
//! tasks or threads.

pub mod bitmap;
pub mod dense;
pub mod traverse;

use std::fmt;
use std::ops::Range;

use tracing::{debug, trace};

use crate::assign::decision::{decide, Action, CEntry};
use crate::assign::method::{SubassignMethod, Traversal};
use crate::assign::slice::{cartesian, single, union, TaskPlan};
use crate::assign::symbolic::{symbolic, SymbolicPattern};
use crate::error::{AssignError, Result};
use crate::index::IndexSet;
use crate::matrix::{AssignConfig, Element, Matrix, PendingTuples, RowIndex};
use crate::ops::BinaryOp;
use crate::parallel::{run_tasks, split_by_counts, split_disjoint_mut};
use crate::utils::exclusive_scan;

/// The value assigned: one scalar for every position, or a matrix `|I|×|J|`
#[derive(Clone, Copy)]
pub enum Operand<'a, T> {
    Scalar(T),
    Matrix(&'a Matrix<T>),
}

impl<T: Element> Operand<'_, T> {
    /// Operand value at position `(iA, jA)`
    #[inline]
    pub fn at(&self, ia: usize, ja: usize) -> Option<T> {
        match self {
            Operand::Scalar(x) => Some(*x),
            Operand::Matrix(a) => a.entry(ia, ja),
        }
    }

    pub fn matrix(&self) -> Option<&Matrix<T>> {
        match self {
            Operand::Scalar(_) => None,
            Operand::Matrix(a) => Some(a),
        }
    }
}

/// A mask matrix together with how its entries are read
#[derive(Clone, Copy)]
pub struct MaskView<'a, M> {
    pub matrix: &'a Matrix<M>,
    pub structural: bool,
}

impl<M: Element> MaskView<'_, M> {
    /// Mask value stored at slot `pos`, before any complement
    #[inline]
    pub fn value_at(&self, pos: usize) -> bool {
        self.matrix.is_present(pos) && (self.structural || self.matrix.value_at(pos).is_truthy())
    }

    /// Mask value at position `(iA, jA)`, before any complement
    #[inline]
    pub fn at(&self, ia: usize, ja: usize) -> bool {
        self.matrix
            .entry(ia, ja)
            .is_some_and(|v| self.structural || v.is_truthy())
    }
}

impl<T: Element> fmt::Debug for Operand<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Scalar(x) => f.debug_tuple("Scalar").field(x).finish(),
            Operand::Matrix(a) => write!(f, "Matrix({}x{}, {:?})", a.nrows(), a.ncols(), a.sparsity()),
        }
    }
}

impl<M: Element> fmt::Debug for MaskView<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskView")
            .field("shape", &self.matrix.shape())
            .field("sparsity", &self.matrix.sparsity())
            .field("structural", &self.structural)
            .finish()
    }
}

/// Everything a kernel needs to know about one assignment, after prep
pub struct Call<'a, T, M> {
    pub rows: &'a IndexSet<'a>,
    pub cols: &'a IndexSet<'a>,
    pub operand: Operand<'a, T>,
    pub mask: Option<MaskView<'a, M>>,
    pub complement: bool,
    pub replace: bool,
    pub accum: Option<&'a BinaryOp<T>>,
}

impl<T: Element, M: Element> Call<'_, T, M> {
    /// The effective mask at `(iA, jA)`, complement applied
    #[inline]
    pub fn mask_at(&self, ia: usize, ja: usize) -> bool {
        self.mask.map_or(true, |m| m.at(ia, ja)) != self.complement
    }

    #[inline]
    fn decide(&self, c: CEntry, pos: &Position<T>) -> Action {
        decide(c, pos.operand.is_some(), pos.mask, self.accum.is_some(), self.replace)
    }
}

/// One visited position of `C(I,J)`
#[derive(Debug, Clone, Copy)]
pub struct Position<T> {
    pub ia: usize,
    pub ja: usize,
    /// Slot of `C` holding this position, live or zombie
    pub slot: Option<usize>,
    pub operand: Option<T>,
    /// Effective mask value
    pub mask: bool,
}

/// The part of `C` a task can see
pub trait Slots {
    /// Absolute slot of `rows()[0]`
    fn start(&self) -> usize;
    fn rows(&self) -> &[RowIndex];

    /// Slot holding row `i` within `col`, restricted to what the task owns
    fn find(&self, col: &Range<usize>, i: usize) -> Option<usize> {
        let start = self.start();
        let end = start + self.rows().len();
        let lo = col.start.max(start);
        let hi = col.end.min(end);
        if lo >= hi {
            return None;
        }
        let window = &self.rows()[lo - start..hi - start];
        window.binary_search_by_key(&i, RowIndex::row).ok().map(|off| lo + off)
    }
}

/// Phase one: in-place updates, counting insertions
struct Update<'s, 'a, T, M> {
    call: &'a Call<'a, T, M>,
    start: usize,
    rows: &'s mut [RowIndex],
    /// `None` when `C` is iso
    values: Option<&'s mut [T]>,
    zombies: isize,
    inserts: usize,
}

impl<T: Element, M: Element> Slots for Update<'_, '_, T, M> {
    fn start(&self) -> usize {
        self.start
    }

    fn rows(&self) -> &[RowIndex] {
        &*self.rows
    }
}

impl<T: Element, M: Element> Update<'_, '_, T, M> {
    fn apply(&mut self, pos: Position<T>) -> Result<()> {
        let state = match pos.slot {
            Some(s) if self.rows[s - self.start].is_live() => CEntry::Live,
            Some(_) => CEntry::Zombie,
            None => CEntry::Absent,
        };
        let action = self.call.decide(state, &pos);
        match (action, pos.slot, pos.operand) {
            (Action::NoOp, _, _) => {}
            (Action::Overwrite, Some(s), Some(a)) => self.write(s, a),
            (Action::Accumulate, Some(s), Some(a)) => {
                if let (Some(values), Some(op)) = (self.values.as_deref_mut(), self.call.accum) {
                    let local = s - self.start;
                    values[local] = op.apply(values[local], a);
                }
            }
            (Action::Delete, Some(s), _) => {
                let local = s - self.start;
                self.rows[local] = self.rows[local].kill();
                self.zombies += 1;
            }
            (Action::Revive, Some(s), Some(a)) => {
                let local = s - self.start;
                self.rows[local] = self.rows[local].revive();
                self.zombies -= 1;
                self.write(s, a);
            }
            (Action::Insert, None, Some(_)) => self.inserts += 1,
            (action, slot, _) => {
                return Err(AssignError::Internal(format!(
                    "action {:?} at ({}, {}) with slot {:?}",
                    action, pos.ia, pos.ja, slot
                )))
            }
        }
        Ok(())
    }

    #[inline]
    fn write(&mut self, slot: usize, value: T) {
        if let Some(values) = self.values.as_deref_mut() {
            values[slot - self.start] = value;
        }
    }
}

/// Phase two: writing insertions into the task's window of the pending queue
struct Insert<'s, 'a, T, M> {
    call: &'a Call<'a, T, M>,
    start: usize,
    rows: &'s [RowIndex],
    out_rows: &'s mut [usize],
    out_cols: &'s mut [usize],
    /// Empty when the queue is iso
    out_values: &'s mut [T],
    next: usize,
}

impl<T: Element, M: Element> Slots for Insert<'_, '_, T, M> {
    fn start(&self) -> usize {
        self.start
    }

    fn rows(&self) -> &[RowIndex] {
        self.rows
    }
}

impl<T: Element, M: Element> Insert<'_, '_, T, M> {
    fn apply(&mut self, pos: Position<T>) -> Result<()> {
        if pos.slot.is_some() || self.call.decide(CEntry::Absent, &pos) != Action::Insert {
            return Ok(());
        }
        let (Some(value), Some(row)) = (pos.operand, self.out_rows.get_mut(self.next)) else {
            return Err(AssignError::Internal("insert window overrun".into()));
        };
        *row = self.call.rows.get(pos.ia);
        self.out_cols[self.next] = self.call.cols.get(pos.ja);
        if let Some(v) = self.out_values.get_mut(self.next) {
            *v = value;
        }
        self.next += 1;
        Ok(())
    }
}

/// Run a sparse method on a sparse or hypersparse `C`
///
/// `C` must not be jumbled. Its pending queue, if not empty, must combine
/// with `pending_op`.
pub fn run_sparse<T: Element, M: Element>(
    c: &mut Matrix<T>,
    method: SubassignMethod,
    call: &Call<'_, T, M>,
    pending_op: Option<BinaryOp<T>>,
    config: &AssignConfig,
) -> Result<()> {
    let traversal = method
        .traversal()
        .ok_or_else(|| AssignError::Internal(format!("{} has no sparse traversal", method)))?;

    let s: Option<SymbolicPattern> = if method.uses_symbolic() {
        Some(symbolic(c, call.rows, call.cols)?)
    } else {
        None
    };
    let c_cols: Vec<Range<usize>> = (0..call.cols.len())
        .map(|ja| c.column_slots(call.cols.get(ja)))
        .collect();

    let plan = make_plan(c, traversal, call, s.as_ref(), &c_cols, config)?;
    debug!(
        %method,
        ntasks = plan.tasks.len(),
        nvec = plan.vectors.len(),
        symbolic = s.as_ref().map_or(0, SymbolicPattern::len),
        "running sparse kernel"
    );
    let walker = traverse::Walker {
        call,
        traversal,
        symbolic: s.as_ref(),
        c_cols: &c_cols,
        plan: &plan,
    };
    let nthreads = config.system_params.n_threads;
    let mut tasks = plan.tasks.clone();
    let ranges: Vec<Range<usize>> = tasks.iter().map(|t| t.output.clone()).collect();

    // phase 1: update in place, count insertions
    let counts: Vec<(isize, usize)> = {
        let row_parts = split_disjoint_mut(&mut c.i, &ranges)?;
        let value_parts: Vec<Option<&mut [T]>> = if c.iso {
            ranges.iter().map(|_| None).collect()
        } else {
            split_disjoint_mut(&mut c.x, &ranges)?.into_iter().map(Some).collect()
        };
        let items: Vec<_> = tasks.iter().zip(row_parts).zip(value_parts).collect();
        run_tasks(items, nthreads, |((task, rows), values)| {
            let mut out = Update {
                call,
                start: task.output.start,
                rows,
                values,
                zombies: 0,
                inserts: 0,
            };
            walker.walk(task, &mut out, |o, p| o.apply(p))?;
            Ok((out.zombies, out.inserts))
        })?
    };

    let delta: isize = counts.iter().map(|&(z, _)| z).sum();
    c.nzombies = c
        .nzombies
        .checked_add_signed(delta)
        .ok_or_else(|| AssignError::Internal("zombie count went negative".into()))?;
    for (task, &(_, n)) in tasks.iter_mut().zip(&counts) {
        task.pending = n;
    }
    let pending: Vec<usize> = tasks.iter().map(|t| t.pending).collect();
    let offsets = exclusive_scan(&pending);
    let total = offsets[offsets.len() - 1];
    trace!(zombie_delta = delta, inserts = total, "phase 1 done");
    if total == 0 {
        return Ok(());
    }

    // phase 2: write insertions into private windows of the queue
    let iso = c.iso;
    let queue = c.pending.get_or_insert_with(|| PendingTuples::new(None, iso));
    if queue.is_empty() {
        *queue = PendingTuples::new(pending_op, iso);
    } else if !queue.accepts(pending_op.as_ref()) || queue.iso != iso {
        return Err(AssignError::Internal("pending queue does not match this assignment".into()));
    }
    let window = queue.grow(total)?;
    let out_rows = split_by_counts(window.rows, &pending)?;
    let out_cols = split_by_counts(window.cols, &pending)?;
    let out_values: Vec<&mut [T]> = if iso {
        pending.iter().map(|_| <&mut [T]>::default()).collect()
    } else {
        split_by_counts(window.values, &pending)?
    };
    let c_rows: &[RowIndex] = &c.i;
    let items: Vec<_> = tasks
        .iter()
        .zip(out_rows)
        .zip(out_cols)
        .zip(out_values)
        .filter(|(((task, _), _), _)| task.pending > 0)
        .collect();
    run_tasks(items, nthreads, |(((task, r), cl), v)| {
        let mut out = Insert {
            call,
            start: task.output.start,
            rows: &c_rows[task.output.clone()],
            out_rows: r,
            out_cols: cl,
            out_values: v,
            next: 0,
        };
        walker.walk(task, &mut out, |o, p| o.apply(p))?;
        if out.next != task.pending {
            return Err(AssignError::Internal(format!(
                "task wrote {} insertions, counted {}",
                out.next, task.pending
            )));
        }
        Ok(())
    })?;
    trace!(npending = c.npending(), "phase 2 done");
    Ok(())
}

fn make_plan<T: Element, M: Element>(
    c: &Matrix<T>,
    traversal: Traversal,
    call: &Call<'_, T, M>,
    s: Option<&SymbolicPattern>,
    c_cols: &[Range<usize>],
    config: &AssignConfig,
) -> Result<TaskPlan> {
    let missing = |what: &str| AssignError::Internal(format!("{:?} traversal without {}", traversal, what));
    let c_rows = &c.i[..];
    let plan = match traversal {
        Traversal::Cartesian { .. } => cartesian::slice(call.rows, call.cols, s, c_cols, c_rows, config),
        Traversal::Operand => {
            let a = call.operand.matrix().ok_or_else(|| missing("a matrix operand"))?;
            single::slice(a, call.rows, c_cols, c_rows, config)
        }
        Traversal::Mask => {
            let m = call.mask.ok_or_else(|| missing("a mask"))?;
            single::slice(m.matrix, call.rows, c_cols, c_rows, config)
        }
        Traversal::SymbolicOperand => {
            let s = s.ok_or_else(|| missing("S"))?;
            let a = call.operand.matrix().ok_or_else(|| missing("a matrix operand"))?;
            union::slice(s, a, call.rows, c_cols, c_rows, config)
        }
        Traversal::SymbolicMask => {
            let s = s.ok_or_else(|| missing("S"))?;
            let m = call.mask.ok_or_else(|| missing("a mask"))?;
            union::slice(s, m.matrix, call.rows, c_cols, c_rows, config)
        }
    };
    Ok(plan)
}
