use crate::{
    assembly::{opcodes, FieldRef},
    classfile::{AccessFlags, Type},
    Result,
};

/// A field declared by a class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    /// Internal name of the declaring class
    pub owner: String,
    /// Field name
    pub name: String,
    /// Raw JVM descriptor
    pub descriptor: String,
    /// Access flags
    pub access: AccessFlags,
    /// Decoded field type
    pub field_type: Type,
}

impl FieldRecord {
    /// Creates a field record, decoding its type from `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if the descriptor cannot be parsed.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        access: AccessFlags,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        Ok(FieldRecord {
            field_type: Type::parse(&descriptor)?,
            owner: owner.into(),
            name: name.into(),
            descriptor,
            access,
        })
    }

    /// Returns `true` for static fields.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }

    /// Builds the reference used by a read of this field (`getfield` or `getstatic`).
    #[must_use]
    pub fn getter(&self) -> FieldRef {
        let opcode = if self.is_static() {
            opcodes::GETSTATIC
        } else {
            opcodes::GETFIELD
        };
        FieldRef::new(opcode, &self.owner, &self.name, &self.descriptor)
    }

    /// Builds the reference used by a write of this field (`putfield` or `putstatic`).
    #[must_use]
    pub fn setter(&self) -> FieldRef {
        let opcode = if self.is_static() {
            opcodes::PUTSTATIC
        } else {
            opcodes::PUTFIELD
        };
        FieldRef::new(opcode, &self.owner, &self.name, &self.descriptor)
    }
}
