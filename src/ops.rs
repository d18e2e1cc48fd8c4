//! Binary operators used as accumulators
//!
//! The engine never looks inside an operator. It only calls it, compares
//! operators by name (to keep the pending-tuple queue consistent) and asks
//! whether it is the "second argument wins" operator.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Add, Mul};
use std::sync::Arc;

/// A named binary operator `z = f(x, y)` over one value type
#[derive(Clone)]
pub struct BinaryOp<T> {
    name: Cow<'static, str>,
    second: bool,
    func: Arc<dyn Fn(T, T) -> T + Send + Sync>,
}

impl<T> BinaryOp<T> {
    /// Wrap a closure as a named operator
    ///
    /// Two operators with the same name are treated as the same operator.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            second: false,
            func: Arc::new(func),
        }
    }

    /// Name of the operator
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `f(x, y) == y` for all inputs
    pub fn is_second(&self) -> bool {
        self.second
    }

    /// Apply the operator
    #[inline]
    pub fn apply(&self, x: T, y: T) -> T {
        (self.func)(x, y)
    }
}

impl<T: Copy + 'static> BinaryOp<T> {
    /// `f(x, y) = x`
    pub fn first() -> Self {
        Self::new("first", |x, _| x)
    }

    /// `f(x, y) = y`
    pub fn second() -> Self {
        let mut op = Self::new("second", |_, y| y);
        op.second = true;
        op
    }
}

impl<T: Copy + Add<Output = T> + 'static> BinaryOp<T> {
    pub fn plus() -> Self {
        Self::new("plus", |x, y| x + y)
    }
}

impl<T: Copy + Mul<Output = T> + 'static> BinaryOp<T> {
    pub fn times() -> Self {
        Self::new("times", |x, y| x * y)
    }
}

impl<T: Copy + PartialOrd + 'static> BinaryOp<T> {
    pub fn min() -> Self {
        Self::new("min", |x, y| if y < x { y } else { x })
    }

    pub fn max() -> Self {
        Self::new("max", |x, y| if y > x { y } else { x })
    }
}

impl<T> PartialEq for BinaryOp<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> fmt::Debug for BinaryOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryOp({})", self.name)
    }
}

/// Combine `x` and `y` with an optional operator; `None` means the second wins
#[inline]
pub(crate) fn combine<T: Copy>(op: Option<&BinaryOp<T>>, x: T, y: T) -> T {
    match op {
        Some(op) => op.apply(x, y),
        None => y,
    }
}
