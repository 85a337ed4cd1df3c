use crate::{
    assembly::{FieldRef, Instruction, Label, MethodRef},
    classfile::{AccessFlags, Constant, MethodDescriptor, Type},
    Result,
};

/// An exception handler range of a method body.
#[derive(Debug, Clone, PartialEq)]
pub struct TryCatchBlock {
    /// First instruction covered by the handler
    pub start: Label,
    /// Label after the last covered instruction
    pub end: Label,
    /// Label of the handler code
    pub handler: Label,
    /// Internal name of the caught type, `None` for `finally`
    pub catch_type: Option<String>,
}

/// A method of a [`crate::classfile::ClassRecord`] together with its instruction sequence.
///
/// Argument and return types are decoded once from the descriptor. The instruction list is
/// only replaced as a whole by the scanner when a transform block commits.
#[derive(Debug, Clone)]
pub struct MethodRecord {
    /// Method name, `<init>` for constructors and `<clinit>` for static initializers
    pub name: String,
    /// Raw JVM descriptor
    pub descriptor: String,
    /// Access flags
    pub access: AccessFlags,
    /// Decoded argument types
    pub arguments: Vec<Type>,
    /// Decoded return type
    pub return_type: Type,
    /// Instruction sequence, including label and line number pseudo-instructions
    pub instructions: Vec<Instruction>,
    /// Exception handlers
    pub try_catch: Vec<TryCatchBlock>,
    /// Maximum operand stack depth in slots
    pub max_stack: u16,
    /// Number of local variable slots
    pub max_locals: u16,
}

impl MethodRecord {
    /// Creates a method record, decoding argument and return types from `descriptor`.
    ///
    /// `max_locals` is initialised to the slots taken by the receiver and the arguments and
    /// `max_stack` to zero; hosts supplying parsed classes overwrite both.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor cannot be parsed.
    pub fn new(
        name: impl Into<String>,
        descriptor: impl Into<String>,
        access: AccessFlags,
        instructions: Vec<Instruction>,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        let parsed = MethodDescriptor::parse(&descriptor)?;
        let receiver = u16::from(!access.contains(AccessFlags::STATIC));

        Ok(MethodRecord {
            name: name.into(),
            max_locals: receiver + parsed.argument_slots(),
            descriptor,
            access,
            arguments: parsed.arguments,
            return_type: parsed.return_type,
            instructions,
            try_catch: Vec::new(),
            max_stack: 0,
        })
    }

    /// Returns `true` for instance constructors (`<init>`).
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }

    /// `name + descriptor`, the identity of a method within its class.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }

    /// Iterates over every constant pushed by the method body.
    pub fn constants(&self) -> impl Iterator<Item = Constant> + '_ {
        self.instructions.iter().filter_map(Instruction::constant_value)
    }

    /// Iterates over every string literal loaded by the method body.
    pub fn strings(&self) -> impl Iterator<Item = &str> + '_ {
        self.instructions.iter().filter_map(|insn| match insn {
            Instruction::Ldc(Constant::String(value)) => Some(value.as_str()),
            _ => None,
        })
    }

    /// Iterates over every method invoked by the method body.
    pub fn calls(&self) -> impl Iterator<Item = &MethodRef> + '_ {
        self.instructions.iter().filter_map(Instruction::as_method)
    }

    /// Iterates over every field accessed by the method body.
    pub fn references(&self) -> impl Iterator<Item = &FieldRef> + '_ {
        self.instructions.iter().filter_map(Instruction::as_field)
    }
}
