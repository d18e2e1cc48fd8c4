//! The action table shared by every assignment kernel
//!
//! Kernels differ only in which positions of `C(I,J)` they visit. At each
//! visited position they classify the state of `C`, whether the operand has
//! an entry and the mask value (already complemented), then look the action up
//! here.

/// State of `C` at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CEntry {
    Live,
    Zombie,
    Absent,
}

/// What a kernel does at one position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NoOp,
    /// `C(i,j) = a`
    Overwrite,
    /// `C(i,j) = accum(C(i,j), a)`
    Accumulate,
    /// Turn the live entry into a zombie
    Delete,
    /// Bring the zombie back to life holding `a`
    Revive,
    /// Queue `(i, j, a)` as a pending tuple
    Insert,
}

use Action::*;

/// Actions where the mask is true, indexed `[C state][operand present][accum]`
const MASK_TRUE: [[[Action; 2]; 2]; 3] = [
    // live
    [[Delete, NoOp], [Overwrite, Accumulate]],
    // zombie
    [[NoOp, NoOp], [Revive, Revive]],
    // absent
    [[NoOp, NoOp], [Insert, Insert]],
];

/// Actions where the mask is false, indexed `[C state][replace]`
const MASK_FALSE: [[Action; 2]; 3] = [
    // live
    [NoOp, Delete],
    // zombie
    [NoOp, NoOp],
    // absent
    [NoOp, NoOp],
];

/// Look up the action for one position
///
/// `mask` is the effective mask value, after any complement.
#[inline]
pub fn decide(c: CEntry, operand: bool, mask: bool, accum: bool, replace: bool) -> Action {
    let state = match c {
        CEntry::Live => 0,
        CEntry::Zombie => 1,
        CEntry::Absent => 2,
    };
    if mask {
        MASK_TRUE[state][usize::from(operand)][usize::from(accum)]
    } else {
        MASK_FALSE[state][usize::from(replace)]
    }
}
