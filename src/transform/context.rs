use crate::{
    assembly::{FieldRef, Instruction, InstructionCursor},
    classfile::{ClassRecord, FieldRecord, MethodRecord},
    Error, Result,
};

/// What a lazily built fragment can see: the class being transformed and the method under edit.
///
/// The method reflects every operation already applied earlier in the same transform block.
/// Lookups that fail produce [`Error::InstructionNotFound`] naming the registration, which
/// aborts the transform of this method and leaves it untouched.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The class owning the method
    pub class: &'a ClassRecord,
    /// The method under edit
    pub method: &'a MethodRecord,
    /// Label of the registration being applied
    pub registration: &'a str,
}

impl<'a> TransformContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(class: &'a ClassRecord, method: &'a MethodRecord, registration: &'a str) -> Self {
        TransformContext {
            class,
            method,
            registration,
        }
    }

    /// A cursor over the instructions of the method under edit.
    #[must_use]
    pub fn cursor(&self) -> InstructionCursor<'a> {
        InstructionCursor::new(&self.method.instructions)
    }

    /// Builds the error reported when `target` cannot be found.
    #[must_use]
    pub fn not_found(&self, target: impl Into<String>) -> Error {
        Error::InstructionNotFound {
            registration: self.registration.to_string(),
            target: target.into(),
        }
    }

    /// Index of the first `ldc` of exactly `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstructionNotFound`] if the method loads no such string.
    pub fn find_string(&self, value: &str) -> Result<usize> {
        self.cursor()
            .find_string(value)
            .ok_or_else(|| self.not_found(format!("ldc \"{}\"", value.escape_debug())))
    }

    /// First field access after instruction `index` satisfying `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstructionNotFound`] if no instruction after `index` qualifies.
    pub fn next_field_after<F>(&self, index: usize, what: &str, condition: F) -> Result<&'a FieldRef>
    where
        F: Fn(&FieldRef) -> bool,
    {
        InstructionCursor::at(&self.method.instructions, index)
            .find_field(condition)
            .map(|(_, field)| field)
            .ok_or_else(|| self.not_found(what))
    }

    /// First field access anywhere in the method satisfying `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstructionNotFound`] if no field access qualifies.
    pub fn field_reference<F>(&self, what: &str, condition: F) -> Result<&'a FieldRef>
    where
        F: Fn(&FieldRef) -> bool,
    {
        self.method
            .references()
            .find(|field| condition(field))
            .ok_or_else(|| self.not_found(what))
    }

    /// First field declared by the class satisfying `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstructionNotFound`] if the class declares no such field.
    pub fn class_field<F>(&self, what: &str, condition: F) -> Result<&'a FieldRecord>
    where
        F: Fn(&FieldRecord) -> bool,
    {
        self.class
            .fields
            .iter()
            .find(|field| condition(field))
            .ok_or_else(|| self.not_found(what))
    }

    /// First instruction satisfying `condition`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InstructionNotFound`] if nothing qualifies.
    pub fn instruction<F>(&self, what: &str, condition: F) -> Result<(usize, &'a Instruction)>
    where
        F: Fn(&Instruction) -> bool,
    {
        self.cursor()
            .next(condition)
            .ok_or_else(|| self.not_found(what))
    }
}
