//! JVM field and method descriptors.
//!
//! Descriptors are the only type information a compiled class carries for its members, so all
//! argument and return-type predicates as well as the stack effect of calls and field accesses
//! are derived from them.

use std::{fmt, str::FromStr};

use crate::{
    assembly::opcodes,
    classfile::Constant,
    Error, Result,
};

/// A JVM value type, as encoded in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `V`, only valid as a return type
    Void,
    /// `Z`
    Boolean,
    /// `B`
    Byte,
    /// `C`
    Char,
    /// `S`
    Short,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
    /// `Lpkg/Name;`, holding the internal name
    Object(String),
    /// `[elem`
    Array(Box<Type>),
}

impl Type {
    /// Creates an object type from an internal or dotted class name.
    #[must_use]
    pub fn object(name: &str) -> Self {
        Type::Object(name.replace('.', "/"))
    }

    /// Shorthand for `java/lang/String`.
    #[must_use]
    pub fn string() -> Self {
        Type::Object("java/lang/String".to_string())
    }

    /// Parses a single field descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if `descriptor` is not exactly one type.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let (ty, rest) = Self::parse_prefix(descriptor)?;
        if !rest.is_empty() {
            return Err(Error::InvalidDescriptor(format!(
                "trailing characters in '{descriptor}'"
            )));
        }
        Ok(ty)
    }

    fn parse_prefix(input: &str) -> Result<(Self, &str)> {
        let mut chars = input.chars();
        let Some(tag) = chars.next() else {
            return Err(Error::InvalidDescriptor("empty descriptor".to_string()));
        };
        let rest = chars.as_str();
        let ty = match tag {
            'V' => Type::Void,
            'Z' => Type::Boolean,
            'B' => Type::Byte,
            'C' => Type::Char,
            'S' => Type::Short,
            'I' => Type::Int,
            'J' => Type::Long,
            'F' => Type::Float,
            'D' => Type::Double,
            'L' => {
                let end = rest.find(';').ok_or_else(|| {
                    Error::InvalidDescriptor(format!("unterminated object type in '{input}'"))
                })?;
                if end == 0 {
                    return Err(Error::InvalidDescriptor(format!(
                        "empty class name in '{input}'"
                    )));
                }
                return Ok((Type::Object(rest[..end].to_string()), &rest[end + 1..]));
            }
            '[' => {
                let (element, rest) = Self::parse_prefix(rest)?;
                if element == Type::Void {
                    return Err(Error::InvalidDescriptor(format!(
                        "array of void in '{input}'"
                    )));
                }
                return Ok((Type::Array(Box::new(element)), rest));
            }
            other => {
                return Err(Error::InvalidDescriptor(format!(
                    "unknown type tag '{other}' in '{input}'"
                )))
            }
        };
        Ok((ty, rest))
    }

    /// Returns the descriptor string of this type.
    #[must_use]
    pub fn descriptor(&self) -> String {
        self.to_string()
    }

    /// Number of operand stack (and local variable) slots a value of this type occupies.
    #[must_use]
    pub fn size(&self) -> u16 {
        match self {
            Type::Void => 0,
            Type::Long | Type::Double => 2,
            _ => 1,
        }
    }

    /// Returns `true` for object and array types.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Object(_) | Type::Array(_))
    }

    /// Opcode returning a value of this type from a method.
    #[must_use]
    pub fn return_opcode(&self) -> u8 {
        match self {
            Type::Void => opcodes::RETURN,
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => opcodes::IRETURN,
            Type::Long => opcodes::LRETURN,
            Type::Float => opcodes::FRETURN,
            Type::Double => opcodes::DRETURN,
            Type::Object(_) | Type::Array(_) => opcodes::ARETURN,
        }
    }

    /// Opcode loading a local variable of this type.
    #[must_use]
    pub fn load_opcode(&self) -> u8 {
        match self {
            Type::Long => opcodes::LLOAD,
            Type::Float => opcodes::FLOAD,
            Type::Double => opcodes::DLOAD,
            Type::Object(_) | Type::Array(_) => opcodes::ALOAD,
            _ => opcodes::ILOAD,
        }
    }

    /// Opcode storing a local variable of this type.
    #[must_use]
    pub fn store_opcode(&self) -> u8 {
        match self {
            Type::Long => opcodes::LSTORE,
            Type::Float => opcodes::FSTORE,
            Type::Double => opcodes::DSTORE,
            Type::Object(_) | Type::Array(_) => opcodes::ASTORE,
            _ => opcodes::ISTORE,
        }
    }

    /// Returns `true` if `constant` can be returned from a method of this return type.
    ///
    /// Sub-int primitives accept `int` constants, references accept strings and class
    /// literals of the matching class. `null` is expressed as no constant at all.
    #[must_use]
    pub fn accepts(&self, constant: &Constant) -> bool {
        match (self, constant) {
            (
                Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int,
                Constant::Int(_),
            )
            | (Type::Long, Constant::Long(_))
            | (Type::Float, Constant::Float(_))
            | (Type::Double, Constant::Double(_)) => true,
            (Type::Object(name), Constant::String(_)) => {
                matches!(
                    name.as_str(),
                    "java/lang/String" | "java/lang/Object" | "java/lang/CharSequence"
                )
            }
            (Type::Object(name), Constant::Type(_)) => {
                matches!(name.as_str(), "java/lang/Class" | "java/lang/Object")
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("V"),
            Type::Boolean => f.write_str("Z"),
            Type::Byte => f.write_str("B"),
            Type::Char => f.write_str("C"),
            Type::Short => f.write_str("S"),
            Type::Int => f.write_str("I"),
            Type::Long => f.write_str("J"),
            Type::Float => f.write_str("F"),
            Type::Double => f.write_str("D"),
            Type::Object(name) => write!(f, "L{name};"),
            Type::Array(element) => write!(f, "[{element}"),
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Type::parse(s)
    }
}

/// A parsed method descriptor, `(args)ret`.
///
/// # Examples
///
/// ```rust
/// use classpatch::classfile::{MethodDescriptor, Type};
///
/// let desc = MethodDescriptor::parse("(ILjava/lang/String;J)Z")?;
/// assert_eq!(desc.arguments, vec![Type::Int, Type::string(), Type::Long]);
/// assert_eq!(desc.return_type, Type::Boolean);
/// assert_eq!(desc.argument_slots(), 4);
/// # Ok::<(), classpatch::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Argument types in declaration order
    pub arguments: Vec<Type>,
    /// Return type, [`Type::Void`] for `void`
    pub return_type: Type,
}

impl MethodDescriptor {
    /// Parses a method descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] if the descriptor is malformed or declares a `void`
    /// argument.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut rest = descriptor.strip_prefix('(').ok_or_else(|| {
            Error::InvalidDescriptor(format!("method descriptor '{descriptor}' lacks '('"))
        })?;

        let mut arguments = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (argument, after) = Type::parse_prefix(rest)?;
            if argument == Type::Void {
                return Err(Error::InvalidDescriptor(format!(
                    "void argument in '{descriptor}'"
                )));
            }
            arguments.push(argument);
            rest = after;
        }

        Ok(MethodDescriptor {
            arguments,
            return_type: Type::parse(rest)?,
        })
    }

    /// Total stack slots consumed by the arguments, not counting a receiver.
    #[must_use]
    pub fn argument_slots(&self) -> u16 {
        self.arguments.iter().map(Type::size).sum()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for argument in &self.arguments {
            write!(f, "{argument}")?;
        }
        write!(f, "){}", self.return_type)
    }
}

impl FromStr for MethodDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MethodDescriptor::parse(s)
    }
}
