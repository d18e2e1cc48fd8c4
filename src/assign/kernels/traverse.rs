//! Position traversals shared by the sparse kernels
//!
//! A [`Walker`] visits the positions of `C(I,J)` a task owns, in ascending
//! `iA` within each vector, and hands each one to the phase's visitor. Both
//! phases use the same walk, so a task sees exactly the same positions twice.

use std::ops::Range;

use super::{Call, Position, Slots};
use crate::assign::method::Traversal;
use crate::assign::slice::{Task, TaskPlan, VectorSpan};
use crate::assign::symbolic::SymbolicPattern;
use crate::error::{AssignError, Result};
use crate::matrix::Element;

pub struct Walker<'a, T, M> {
    pub call: &'a Call<'a, T, M>,
    pub traversal: Traversal,
    pub symbolic: Option<&'a SymbolicPattern>,
    /// Slots of `C(:, J[jA])` for every `jA`
    pub c_cols: &'a [Range<usize>],
    pub plan: &'a TaskPlan,
}

impl<T: Element, M: Element> Walker<'_, T, M> {
    /// Visit every position of one task
    pub fn walk<O, F>(&self, task: &Task, out: &mut O, mut visit: F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        for (span, band) in self.plan.spans(task, self.call.rows.len()) {
            match self.traversal {
                Traversal::Cartesian { symbolic } => self.cartesian(&span, band, symbolic, out, &mut visit)?,
                Traversal::Operand => self.operand(&span, out, &mut visit)?,
                Traversal::Mask => self.mask(&span, out, &mut visit)?,
                Traversal::SymbolicOperand => self.symbolic_operand(&span, out, &mut visit)?,
                Traversal::SymbolicMask => self.symbolic_mask(&span, out, &mut visit)?,
            }
        }
        Ok(())
    }

    fn s(&self) -> Result<&SymbolicPattern> {
        self.symbolic
            .ok_or_else(|| AssignError::Internal("traversal needs the symbolic pattern".into()))
    }

    /// Every position of the band
    fn cartesian<O, F>(&self, span: &VectorSpan, band: Range<usize>, symbolic: bool, out: &mut O, visit: &mut F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        let call = self.call;
        let ja = span.ja;
        let col = &self.c_cols[ja];
        let mut sp = span.other.start;
        for ia in band {
            let slot = if symbolic {
                let s = self.s()?;
                if sp < span.other.end && s.ia[sp] == ia {
                    sp += 1;
                    Some(s.slot[sp - 1].0)
                } else {
                    None
                }
            } else {
                out.find(col, call.rows.get(ia))
            };
            let pos = Position {
                ia,
                ja,
                slot,
                operand: call.operand.at(ia, ja),
                mask: call.mask_at(ia, ja),
            };
            visit(out, pos)?;
        }
        Ok(())
    }

    /// The entries of `A`
    fn operand<O, F>(&self, span: &VectorSpan, out: &mut O, visit: &mut F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        let call = self.call;
        let a = call
            .operand
            .matrix()
            .ok_or_else(|| AssignError::Internal("operand traversal of a scalar".into()))?;
        let ja = span.ja;
        let col = &self.c_cols[ja];
        for p in span.driver.clone() {
            if !a.is_present(p) {
                continue;
            }
            let ia = a.row_at(p);
            let pos = Position {
                ia,
                ja,
                slot: out.find(col, call.rows.get(ia)),
                operand: Some(a.value_at(p)),
                mask: call.mask_at(ia, ja),
            };
            visit(out, pos)?;
        }
        Ok(())
    }

    /// The entries of `M`
    fn mask<O, F>(&self, span: &VectorSpan, out: &mut O, visit: &mut F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        let call = self.call;
        let m = call
            .mask
            .ok_or_else(|| AssignError::Internal("mask traversal without a mask".into()))?;
        let ja = span.ja;
        let col = &self.c_cols[ja];
        for p in span.driver.clone() {
            if !m.matrix.is_present(p) {
                continue;
            }
            let ia = m.matrix.row_at(p);
            let pos = Position {
                ia,
                ja,
                slot: out.find(col, call.rows.get(ia)),
                operand: call.operand.at(ia, ja),
                mask: m.value_at(p) != call.complement,
            };
            visit(out, pos)?;
        }
        Ok(())
    }

    /// Merge of `S` with the entries of `A`
    fn symbolic_operand<O, F>(&self, span: &VectorSpan, out: &mut O, visit: &mut F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        let call = self.call;
        let s = self.s()?;
        let a = call
            .operand
            .matrix()
            .ok_or_else(|| AssignError::Internal("operand traversal of a scalar".into()))?;
        let ja = span.ja;
        let (mut sp, mut ap) = (span.driver.start, span.other.start);
        loop {
            let si = (sp < span.driver.end).then(|| s.ia[sp]);
            let ai = (ap < span.other.end).then(|| a.row_at(ap));
            let ia = match (si, ai) {
                (None, None) => break,
                (Some(x), None) | (None, Some(x)) => x,
                (Some(x), Some(y)) => x.min(y),
            };
            let slot = if si == Some(ia) {
                sp += 1;
                Some(s.slot[sp - 1].0)
            } else {
                None
            };
            let operand = if ai == Some(ia) {
                ap += 1;
                a.is_present(ap - 1).then(|| a.value_at(ap - 1))
            } else {
                None
            };
            let pos = Position {
                ia,
                ja,
                slot,
                operand,
                mask: call.mask_at(ia, ja),
            };
            visit(out, pos)?;
        }
        Ok(())
    }

    /// Merge of `S` with the entries of `M`; the operand is a scalar
    fn symbolic_mask<O, F>(&self, span: &VectorSpan, out: &mut O, visit: &mut F) -> Result<()>
    where
        O: Slots,
        F: FnMut(&mut O, Position<T>) -> Result<()>,
    {
        let call = self.call;
        let s = self.s()?;
        let m = call
            .mask
            .ok_or_else(|| AssignError::Internal("mask traversal without a mask".into()))?;
        let ja = span.ja;
        let (mut sp, mut mp) = (span.driver.start, span.other.start);
        loop {
            let si = (sp < span.driver.end).then(|| s.ia[sp]);
            let mi = (mp < span.other.end).then(|| m.matrix.row_at(mp));
            let ia = match (si, mi) {
                (None, None) => break,
                (Some(x), None) | (None, Some(x)) => x,
                (Some(x), Some(y)) => x.min(y),
            };
            let slot = if si == Some(ia) {
                sp += 1;
                Some(s.slot[sp - 1].0)
            } else {
                None
            };
            let raw = if mi == Some(ia) {
                mp += 1;
                m.value_at(mp - 1)
            } else {
                false
            };
            let pos = Position {
                ia,
                ja,
                slot,
                operand: call.operand.at(ia, ja),
                mask: raw != call.complement,
            };
            visit(out, pos)?;
        }
        Ok(())
    }
}
