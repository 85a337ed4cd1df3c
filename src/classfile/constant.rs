//! Loadable constant values.
//!
//! A [`Constant`] is a literal that a method can push onto the operand stack, either through an
//! `ldc` family instruction referencing the constant pool or through one of the short push
//! forms (`iconst_*`, `bipush`, `sipush`, `lconst_*`, `fconst_*`, `dconst_*`).
//!
//! Every constant belongs to exactly one [`ConstantKind`]. Constant replacement never crosses
//! categories: an `int` literal is only ever replaced by another `int` literal, a `long` by a
//! `long`, and so on, so the width of the value on the operand stack never changes.

use std::fmt;

use strum::Display;

/// Category of a loadable constant.
///
/// The categories are distinct for replacement purposes even where the JVM would accept an
/// implicit conversion, e.g. `int` and `long` are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConstantKind {
    /// 32-bit signed integer (also used for `boolean`, `byte`, `char` and `short`)
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 float
    Float,
    /// 64-bit IEEE 754 float
    Double,
    /// `java.lang.String` literal
    String,
    /// Class literal (`Foo.class`)
    Type,
}

/// A literal value loadable by a single instruction.
///
/// Equality compares floating point values by their bit pattern, so `0.0` and `-0.0` are
/// different constants, matching how they are stored in a class file.
///
/// # Examples
///
/// ```rust
/// use classpatch::classfile::{Constant, ConstantKind};
///
/// let fps = Constant::from("\u{1} FPS");
/// assert_eq!(fps.kind(), ConstantKind::String);
/// assert_eq!(Constant::from(true), Constant::Int(1));
/// assert!(Constant::Long(5).is_wide());
/// ```
#[derive(Debug, Clone)]
pub enum Constant {
    /// `int` constant
    Int(i32),
    /// `long` constant
    Long(i64),
    /// `float` constant
    Float(f32),
    /// `double` constant
    Double(f64),
    /// String literal
    String(String),
    /// Class literal, stored as an internal name or array descriptor
    Type(String),
}

impl Constant {
    /// Returns the category of this constant.
    #[must_use]
    pub fn kind(&self) -> ConstantKind {
        match self {
            Constant::Int(_) => ConstantKind::Int,
            Constant::Long(_) => ConstantKind::Long,
            Constant::Float(_) => ConstantKind::Float,
            Constant::Double(_) => ConstantKind::Double,
            Constant::String(_) => ConstantKind::String,
            Constant::Type(_) => ConstantKind::Type,
        }
    }

    /// Returns `true` for `long` and `double` constants, which occupy two stack slots.
    #[must_use]
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    /// Number of operand stack slots taken by this constant once loaded.
    #[must_use]
    pub fn slots(&self) -> u16 {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    /// Returns the string value if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::String(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Int(a), Constant::Int(b)) => a == b,
            (Constant::Long(a), Constant::Long(b)) => a == b,
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            (Constant::String(a), Constant::String(b)) | (Constant::Type(a), Constant::Type(b)) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "{value}"),
            Constant::Long(value) => write!(f, "{value}L"),
            Constant::Float(value) => write!(f, "{value}F"),
            Constant::Double(value) => write!(f, "{value}D"),
            Constant::String(value) => write!(f, "\"{}\"", value.escape_debug()),
            Constant::Type(value) => write!(f, "{value}.class"),
        }
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Constant::Int(value)
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Int(i32::from(value))
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Long(value)
    }
}

impl From<f32> for Constant {
    fn from(value: f32) -> Self {
        Constant::Float(value)
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Constant::Double(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<String> for Constant {
    fn from(value: String) -> Self {
        Constant::String(value)
    }
}
