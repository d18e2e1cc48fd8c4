//! Element types and the cast predicate used for domain checks

use std::fmt::Debug;

use num_traits::Zero;

/// Runtime code identifying the domain of a matrix or operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Fp32,
    Fp64,
    /// A user-defined type, identified by name
    User(&'static str),
}

impl TypeCode {
    /// Whether this is one of the built-in types
    pub fn is_builtin(&self) -> bool {
        !matches!(self, TypeCode::User(_))
    }
}

/// Returns true if a value of type `from` can be cast to type `to`
///
/// Built-in types cast to each other. A user-defined type only casts to
/// itself.
pub fn castable(from: TypeCode, to: TypeCode) -> bool {
    match (from, to) {
        (TypeCode::User(a), TypeCode::User(b)) => a == b,
        (TypeCode::User(_), _) | (_, TypeCode::User(_)) => false,
        _ => true,
    }
}

/// A value that can be stored in a [`Matrix`](crate::Matrix)
///
/// Implemented for the built-in numeric types and `bool`. User types
/// implement it with a [`TypeCode::User`] code; such types can still serve as
/// structural masks, but not as valued masks. `Default` supplies the filler
/// for unoccupied bitmap slots.
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// Domain of the type
    const TYPE: TypeCode;

    /// Value of the entry when used as a valued mask
    fn is_truthy(&self) -> bool {
        true
    }
}

macro_rules! numeric_element {
    ($($t:ty => $code:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const TYPE: TypeCode = TypeCode::$code;

                #[inline]
                fn is_truthy(&self) -> bool {
                    !self.is_zero()
                }
            }
        )*
    };
}

numeric_element! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Fp32,
    f64 => Fp64,
}

impl Element for bool {
    const TYPE: TypeCode = TypeCode::Bool;

    #[inline]
    fn is_truthy(&self) -> bool {
        *self
    }
}
