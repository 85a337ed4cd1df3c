//! JVM instruction representation and per-instruction metadata.
//!
//! Instructions are kept in tree form: branch targets are symbolic [`Label`]s, constants are
//! values rather than pool indices and member references carry their owner, name and descriptor
//! inline. This is the shape a host produces when it parses a method body, and the only shape the
//! scanner edits. Encoding back to bytes (and choosing wide forms) is the host's concern.
//!
//! # Key Components
//!
//! - [`Instruction`] - One instruction or pseudo-instruction of a method body
//! - [`FieldRef`] / [`MethodRef`] - Symbolic member references
//! - [`FlowType`] - Control flow behaviour of an instruction
//! - [`StackBehavior`] - Operand stack effect measured in slots

use std::fmt;

use crate::{
    assembly::opcodes,
    classfile::{Constant, MethodDescriptor, Type},
    Result,
};

/// Symbolic branch target.
///
/// A label is placed in an instruction list with [`Instruction::Label`] and referenced by jumps,
/// switches and try/catch blocks. Label numbers only need to be unique within one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Reference to a field, as used by `getfield`, `putfield`, `getstatic` and `putstatic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// One of the four field access opcodes
    pub opcode: u8,
    /// Internal name of the class declaring the field
    pub owner: String,
    /// Field name
    pub name: String,
    /// Field descriptor
    pub descriptor: String,
}

impl FieldRef {
    /// Creates a field reference.
    #[must_use]
    pub fn new(opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        FieldRef {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    /// Returns `true` for `getstatic` and `putstatic`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.opcode, opcodes::GETSTATIC | opcodes::PUTSTATIC)
    }

    /// Returns `true` for `getfield` and `getstatic`.
    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self.opcode, opcodes::GETFIELD | opcodes::GETSTATIC)
    }
}

/// Reference to a method, as used by the four `invoke*` opcodes other than `invokedynamic`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// `invokevirtual`, `invokespecial`, `invokestatic` or `invokeinterface`
    pub opcode: u8,
    /// Internal name of the class or interface declaring the method
    pub owner: String,
    /// Method name
    pub name: String,
    /// Method descriptor
    pub descriptor: String,
    /// `true` if `owner` is an interface
    pub interface: bool,
}

impl MethodRef {
    /// Creates a method reference. `interface` is derived from the opcode.
    #[must_use]
    pub fn new(opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        MethodRef {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            interface: opcode == opcodes::INVOKEINTERFACE,
        }
    }

    /// Returns `true` for calls to `<init>`.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Returns `true` for `invokestatic`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.opcode == opcodes::INVOKESTATIC
    }

    /// Number of stack slots consumed by the call, receiver included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor cannot be parsed.
    pub fn consumed_slots(&self) -> Result<u16> {
        let descriptor = MethodDescriptor::parse(&self.descriptor)?;
        Ok(descriptor.argument_slots() + u16::from(!self.is_static()))
    }

    /// Number of stack slots produced by the call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor cannot be parsed.
    pub fn produced_slots(&self) -> Result<u16> {
        Ok(MethodDescriptor::parse(&self.descriptor)?.return_type.size())
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}

/// Control flow behaviour of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Execution continues with the next instruction
    Sequential,
    /// Branches to a label or falls through
    ConditionalBranch,
    /// Always branches to a label
    UnconditionalBranch,
    /// Calls a method and continues with the next instruction
    Call,
    /// Returns from the current method
    Return,
    /// Multi-way branch
    Switch,
    /// Throws the exception on top of the stack
    Throw,
    /// `jsr` / `ret`, not supported by this crate
    Subroutine,
    /// Label or line number marker, not a real instruction
    Pseudo,
}

/// Operand stack effect of an instruction, measured in slots (`long` and `double` take two).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBehavior {
    /// Number of slots popped
    pub pops: u16,
    /// Number of slots pushed
    pub pushes: u16,
}

impl StackBehavior {
    const fn new(pops: u16, pushes: u16) -> Self {
        StackBehavior { pops, pushes }
    }

    /// Net effect on stack depth (`pushes - pops`).
    #[must_use]
    pub fn net_effect(&self) -> i32 {
        i32::from(self.pushes) - i32::from(self.pops)
    }
}

/// One element of a method's instruction sequence.
///
/// Besides real instructions the sequence contains [`Instruction::Label`] and
/// [`Instruction::LineNumber`] markers, which occupy no bytes in the encoded method.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Instruction without operands (`iadd`, `areturn`, `iconst_1`, ...)
    Simple(u8),
    /// `bipush`, `sipush` or `newarray`
    Int {
        /// Opcode
        opcode: u8,
        /// Immediate operand
        operand: i32,
    },
    /// Local variable load or store
    Var {
        /// Opcode
        opcode: u8,
        /// Local variable slot
        index: u16,
    },
    /// `new`, `anewarray`, `checkcast` or `instanceof`
    Type {
        /// Opcode
        opcode: u8,
        /// Internal name or array descriptor
        descriptor: String,
    },
    /// Field access
    Field(FieldRef),
    /// Method invocation
    Method(MethodRef),
    /// `invokedynamic`; the bootstrap method is opaque to this crate
    InvokeDynamic {
        /// Call site name
        name: String,
        /// Call site descriptor
        descriptor: String,
    },
    /// Conditional or unconditional branch
    Jump {
        /// Opcode
        opcode: u8,
        /// Branch target
        target: Label,
    },
    /// Placement of a label
    Label(Label),
    /// `ldc` family constant load
    Ldc(Constant),
    /// `iinc`
    Iinc {
        /// Local variable slot
        index: u16,
        /// Increment
        delta: i16,
    },
    /// `tableswitch`
    TableSwitch {
        /// Lowest key
        min: i32,
        /// Highest key
        max: i32,
        /// Target for keys outside `min..=max`
        default: Label,
        /// Targets for `min..=max`
        targets: Vec<Label>,
    },
    /// `lookupswitch`
    LookupSwitch {
        /// Target for unlisted keys
        default: Label,
        /// Sorted keys
        keys: Vec<i32>,
        /// Target per key
        targets: Vec<Label>,
    },
    /// `multianewarray`
    MultiANewArray {
        /// Array descriptor
        descriptor: String,
        /// Number of dimensions popped
        dimensions: u8,
    },
    /// Source line marker
    LineNumber {
        /// Source line
        line: u16,
        /// Label where the line starts
        start: Label,
    },
}

impl Instruction {
    /// Shorthand for an `invokevirtual` instruction.
    #[must_use]
    pub fn invoke_virtual(owner: &str, name: &str, descriptor: &str) -> Self {
        Instruction::Method(MethodRef::new(opcodes::INVOKEVIRTUAL, owner, name, descriptor))
    }

    /// Shorthand for an `invokestatic` instruction.
    #[must_use]
    pub fn invoke_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Instruction::Method(MethodRef::new(opcodes::INVOKESTATIC, owner, name, descriptor))
    }

    /// Shorthand for an `invokespecial` instruction.
    #[must_use]
    pub fn invoke_special(owner: &str, name: &str, descriptor: &str) -> Self {
        Instruction::Method(MethodRef::new(opcodes::INVOKESPECIAL, owner, name, descriptor))
    }

    /// Shorthand for an `invokeinterface` instruction.
    #[must_use]
    pub fn invoke_interface(owner: &str, name: &str, descriptor: &str) -> Self {
        Instruction::Method(MethodRef::new(
            opcodes::INVOKEINTERFACE,
            owner,
            name,
            descriptor,
        ))
    }

    /// Shorthand for a field access instruction.
    #[must_use]
    pub fn field(opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        Instruction::Field(FieldRef::new(opcode, owner, name, descriptor))
    }

    /// Shorthand for a local variable instruction.
    #[must_use]
    pub fn var(opcode: u8, index: u16) -> Self {
        Instruction::Var { opcode, index }
    }

    /// Shorthand for a type instruction.
    #[must_use]
    pub fn type_insn(opcode: u8, descriptor: &str) -> Self {
        Instruction::Type {
            opcode,
            descriptor: descriptor.to_string(),
        }
    }

    /// Builds the shortest instruction pushing `constant`.
    ///
    /// Small ints use `iconst_*`, `bipush` or `sipush`; `0`/`1` longs, `0`/`1`/`2` floats and
    /// `0`/`1` doubles use their dedicated opcodes; everything else becomes an `ldc`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use classpatch::{assembly::{opcodes, Instruction}, classfile::Constant};
    ///
    /// assert_eq!(Instruction::load_constant(&Constant::Int(3)), Instruction::Simple(opcodes::ICONST_3));
    /// assert_eq!(
    ///     Instruction::load_constant(&Constant::Int(-26)),
    ///     Instruction::Int { opcode: opcodes::BIPUSH, operand: -26 }
    /// );
    /// assert_eq!(
    ///     Instruction::load_constant(&Constant::Int(i32::MAX)),
    ///     Instruction::Ldc(Constant::Int(i32::MAX))
    /// );
    /// ```
    #[must_use]
    pub fn load_constant(constant: &Constant) -> Self {
        match *constant {
            Constant::Int(value @ -1..=5) => {
                // -1..=5 maps onto iconst_m1..=iconst_5
                Instruction::Simple(opcodes::ICONST_0.wrapping_add_signed(value as i8))
            }
            Constant::Int(value) if i8::try_from(value).is_ok() => Instruction::Int {
                opcode: opcodes::BIPUSH,
                operand: value,
            },
            Constant::Int(value) if i16::try_from(value).is_ok() => Instruction::Int {
                opcode: opcodes::SIPUSH,
                operand: value,
            },
            Constant::Long(0) => Instruction::Simple(opcodes::LCONST_0),
            Constant::Long(1) => Instruction::Simple(opcodes::LCONST_1),
            Constant::Float(value) if value.to_bits() == 0.0f32.to_bits() => {
                Instruction::Simple(opcodes::FCONST_0)
            }
            Constant::Float(value) if value == 1.0 => Instruction::Simple(opcodes::FCONST_1),
            Constant::Float(value) if value == 2.0 => Instruction::Simple(opcodes::FCONST_2),
            Constant::Double(value) if value.to_bits() == 0.0f64.to_bits() => {
                Instruction::Simple(opcodes::DCONST_0)
            }
            Constant::Double(value) if value == 1.0 => Instruction::Simple(opcodes::DCONST_1),
            _ => Instruction::Ldc(constant.clone()),
        }
    }

    /// Returns the opcode, or `None` for label and line number markers.
    #[must_use]
    pub fn opcode(&self) -> Option<u8> {
        match self {
            Instruction::Simple(opcode)
            | Instruction::Int { opcode, .. }
            | Instruction::Var { opcode, .. }
            | Instruction::Type { opcode, .. }
            | Instruction::Jump { opcode, .. } => Some(*opcode),
            Instruction::Field(field) => Some(field.opcode),
            Instruction::Method(method) => Some(method.opcode),
            Instruction::InvokeDynamic { .. } => Some(opcodes::INVOKEDYNAMIC),
            Instruction::Ldc(_) => Some(opcodes::LDC),
            Instruction::Iinc { .. } => Some(opcodes::IINC),
            Instruction::TableSwitch { .. } => Some(opcodes::TABLESWITCH),
            Instruction::LookupSwitch { .. } => Some(opcodes::LOOKUPSWITCH),
            Instruction::MultiANewArray { .. } => Some(opcodes::MULTIANEWARRAY),
            Instruction::Label(_) | Instruction::LineNumber { .. } => None,
        }
    }

    /// Returns `true` for label and line number markers.
    #[must_use]
    pub fn is_pseudo(&self) -> bool {
        matches!(self, Instruction::Label(_) | Instruction::LineNumber { .. })
    }

    /// Returns `true` for the six return instructions.
    #[must_use]
    pub fn is_return(&self) -> bool {
        matches!(self, Instruction::Simple(opcode) if opcodes::is_return(*opcode))
    }

    /// Control flow behaviour of this instruction.
    #[must_use]
    pub fn flow_type(&self) -> FlowType {
        match self {
            Instruction::Label(_) | Instruction::LineNumber { .. } => FlowType::Pseudo,
            Instruction::Simple(opcode) if opcodes::is_return(*opcode) => FlowType::Return,
            Instruction::Simple(opcodes::ATHROW) => FlowType::Throw,
            Instruction::Var {
                opcode: opcodes::RET,
                ..
            } => FlowType::Subroutine,
            Instruction::Jump { opcode, .. } => match *opcode {
                opcodes::GOTO | opcodes::GOTO_W => FlowType::UnconditionalBranch,
                opcodes::JSR | opcodes::JSR_W => FlowType::Subroutine,
                _ => FlowType::ConditionalBranch,
            },
            Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => FlowType::Switch,
            Instruction::Method(_) | Instruction::InvokeDynamic { .. } => FlowType::Call,
            _ => FlowType::Sequential,
        }
    }

    /// Labels this instruction may transfer control to, excluding fall-through.
    #[must_use]
    pub fn targets(&self) -> Vec<Label> {
        match self {
            Instruction::Jump { target, .. } => vec![*target],
            Instruction::TableSwitch {
                default, targets, ..
            }
            | Instruction::LookupSwitch {
                default, targets, ..
            } => std::iter::once(*default)
                .chain(targets.iter().copied())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Operand stack effect of this instruction in slots.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if a member descriptor cannot be parsed and
    /// [`crate::Error::Malformed`] if the opcode is not valid for the instruction variant.
    pub fn stack_behavior(&self) -> Result<StackBehavior> {
        let behavior = match self {
            Instruction::Simple(opcode) => simple_behavior(*opcode)
                .ok_or_else(|| malformed_error!("{} takes an operand", opcodes::mnemonic(*opcode)))?,
            Instruction::Int { opcode, .. } => match *opcode {
                opcodes::BIPUSH | opcodes::SIPUSH => StackBehavior::new(0, 1),
                opcodes::NEWARRAY => StackBehavior::new(1, 1),
                other => return Err(invalid_variant(other, "int")),
            },
            Instruction::Var { opcode, .. } => match *opcode {
                opcodes::ILOAD | opcodes::FLOAD | opcodes::ALOAD => StackBehavior::new(0, 1),
                opcodes::LLOAD | opcodes::DLOAD => StackBehavior::new(0, 2),
                opcodes::ISTORE | opcodes::FSTORE | opcodes::ASTORE => StackBehavior::new(1, 0),
                opcodes::LSTORE | opcodes::DSTORE => StackBehavior::new(2, 0),
                opcodes::RET => StackBehavior::new(0, 0),
                other => return Err(invalid_variant(other, "local variable")),
            },
            Instruction::Type { opcode, .. } => match *opcode {
                opcodes::NEW => StackBehavior::new(0, 1),
                opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF => {
                    StackBehavior::new(1, 1)
                }
                other => return Err(invalid_variant(other, "type")),
            },
            Instruction::Field(field) => {
                let size = Type::parse(&field.descriptor)?.size();
                match field.opcode {
                    opcodes::GETSTATIC => StackBehavior::new(0, size),
                    opcodes::PUTSTATIC => StackBehavior::new(size, 0),
                    opcodes::GETFIELD => StackBehavior::new(1, size),
                    opcodes::PUTFIELD => StackBehavior::new(1 + size, 0),
                    other => return Err(invalid_variant(other, "field")),
                }
            }
            Instruction::Method(method) => {
                if !opcodes::is_invoke(method.opcode) {
                    return Err(invalid_variant(method.opcode, "method"));
                }
                StackBehavior::new(method.consumed_slots()?, method.produced_slots()?)
            }
            Instruction::InvokeDynamic { descriptor, .. } => {
                let descriptor = MethodDescriptor::parse(descriptor)?;
                StackBehavior::new(descriptor.argument_slots(), descriptor.return_type.size())
            }
            Instruction::Jump { opcode, .. } => match *opcode {
                opcodes::IFEQ..=opcodes::IFLE | opcodes::IFNULL | opcodes::IFNONNULL => {
                    StackBehavior::new(1, 0)
                }
                opcodes::IF_ICMPEQ..=opcodes::IF_ACMPNE => StackBehavior::new(2, 0),
                opcodes::GOTO | opcodes::GOTO_W => StackBehavior::new(0, 0),
                opcodes::JSR | opcodes::JSR_W => StackBehavior::new(0, 1),
                other => return Err(invalid_variant(other, "jump")),
            },
            Instruction::Ldc(constant) => StackBehavior::new(0, constant.slots()),
            Instruction::TableSwitch { .. } | Instruction::LookupSwitch { .. } => {
                StackBehavior::new(1, 0)
            }
            Instruction::MultiANewArray { dimensions, .. } => {
                StackBehavior::new(u16::from(*dimensions), 1)
            }
            Instruction::Iinc { .. } | Instruction::Label(_) | Instruction::LineNumber { .. } => {
                StackBehavior::new(0, 0)
            }
        };
        Ok(behavior)
    }

    /// Returns the constant pushed by this instruction, if it is a constant load.
    ///
    /// Covers `ldc` as well as the short push forms, so `iconst_5` and `bipush 5` both yield
    /// `Constant::Int(5)`. `aconst_null` is not a constant in this sense.
    #[must_use]
    pub fn constant_value(&self) -> Option<Constant> {
        match self {
            Instruction::Simple(opcode) => match *opcode {
                opcodes::ICONST_M1..=opcodes::ICONST_5 => {
                    Some(Constant::Int(i32::from(*opcode) - i32::from(opcodes::ICONST_0)))
                }
                opcodes::LCONST_0 | opcodes::LCONST_1 => {
                    Some(Constant::Long(i64::from(*opcode - opcodes::LCONST_0)))
                }
                opcodes::FCONST_0..=opcodes::FCONST_2 => {
                    Some(Constant::Float(f32::from(*opcode - opcodes::FCONST_0)))
                }
                opcodes::DCONST_0 | opcodes::DCONST_1 => {
                    Some(Constant::Double(f64::from(*opcode - opcodes::DCONST_0)))
                }
                _ => None,
            },
            Instruction::Int {
                opcode: opcodes::BIPUSH | opcodes::SIPUSH,
                operand,
            } => Some(Constant::Int(*operand)),
            Instruction::Ldc(constant) => Some(constant.clone()),
            _ => None,
        }
    }

    /// Returns the method reference of an invocation.
    #[must_use]
    pub fn as_method(&self) -> Option<&MethodRef> {
        match self {
            Instruction::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Returns the field reference of a field access.
    #[must_use]
    pub fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Instruction::Field(field) => Some(field),
            _ => None,
        }
    }
}

impl From<Constant> for Instruction {
    fn from(constant: Constant) -> Self {
        Instruction::load_constant(&constant)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Simple(opcode) => f.write_str(opcodes::mnemonic(*opcode)),
            Instruction::Int { opcode, operand } => {
                write!(f, "{} {operand}", opcodes::mnemonic(*opcode))
            }
            Instruction::Var { opcode, index } => {
                write!(f, "{} {index}", opcodes::mnemonic(*opcode))
            }
            Instruction::Type { opcode, descriptor } => {
                write!(f, "{} {descriptor}", opcodes::mnemonic(*opcode))
            }
            Instruction::Field(field) => write!(
                f,
                "{} {}.{}:{}",
                opcodes::mnemonic(field.opcode),
                field.owner,
                field.name,
                field.descriptor
            ),
            Instruction::Method(method) => {
                write!(f, "{} {method}", opcodes::mnemonic(method.opcode))
            }
            Instruction::InvokeDynamic { name, descriptor } => {
                write!(f, "invokedynamic {name}{descriptor}")
            }
            Instruction::Jump { opcode, target } => {
                write!(f, "{} {target}", opcodes::mnemonic(*opcode))
            }
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Ldc(constant) => write!(f, "ldc {constant}"),
            Instruction::Iinc { index, delta } => write!(f, "iinc {index} {delta}"),
            Instruction::TableSwitch { min, max, .. } => write!(f, "tableswitch {min}..{max}"),
            Instruction::LookupSwitch { keys, .. } => {
                write!(f, "lookupswitch ({} keys)", keys.len())
            }
            Instruction::MultiANewArray {
                descriptor,
                dimensions,
            } => write!(f, "multianewarray {descriptor} {dimensions}"),
            Instruction::LineNumber { line, start } => write!(f, "line {line} {start}"),
        }
    }
}

fn invalid_variant(opcode: u8, variant: &str) -> crate::Error {
    malformed_error!(
        "{} is not a {} instruction",
        opcodes::mnemonic(opcode),
        variant
    )
}

/// Stack effect of the operand-less instructions, `None` for opcodes that take operands.
fn simple_behavior(opcode: u8) -> Option<StackBehavior> {
    use opcodes::*;

    let (pops, pushes) = match opcode {
        NOP => (0, 0),
        ACONST_NULL | ICONST_M1..=ICONST_5 | FCONST_0..=FCONST_2 => (0, 1),
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 => (0, 2),

        IALOAD | FALOAD | AALOAD | BALOAD | CALOAD | SALOAD => (2, 1),
        LALOAD | DALOAD => (2, 2),
        IASTORE | FASTORE | AASTORE | BASTORE | CASTORE | SASTORE => (3, 0),
        LASTORE | DASTORE => (4, 0),

        POP => (1, 0),
        POP2 => (2, 0),
        DUP => (1, 2),
        DUP_X1 => (2, 3),
        DUP_X2 => (3, 4),
        DUP2 => (2, 4),
        DUP2_X1 => (3, 5),
        DUP2_X2 => (4, 6),
        SWAP => (2, 2),

        // add, sub, mul, div, rem cycle through int, long, float, double
        IADD..=DREM => match (opcode - IADD) % 4 {
            1 | 3 => (4, 2),
            _ => (2, 1),
        },
        INEG | FNEG => (1, 1),
        LNEG | DNEG => (2, 2),
        ISHL | ISHR | IUSHR => (2, 1),
        LSHL | LSHR | LUSHR => (3, 2),
        IAND | IOR | IXOR => (2, 1),
        LAND | LOR | LXOR => (4, 2),

        I2F | F2I | I2B | I2C | I2S => (1, 1),
        I2L | I2D | F2L | F2D => (1, 2),
        L2I | L2F | D2I | D2F => (2, 1),
        L2D | D2L => (2, 2),

        LCMP | DCMPL | DCMPG => (4, 1),
        FCMPL | FCMPG => (2, 1),

        IRETURN | FRETURN | ARETURN => (1, 0),
        LRETURN | DRETURN => (2, 0),
        RETURN => (0, 0),

        ARRAYLENGTH => (1, 1),
        ATHROW | MONITORENTER | MONITOREXIT => (1, 0),
        _ => return None,
    };
    Some(StackBehavior::new(pops, pushes))
}
