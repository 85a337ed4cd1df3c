//! Fluent construction of class records.
//!
//! Hosts that already parse class files fill [`ClassRecord`] directly. The builders here are
//! for everybody else: synthetic fixtures, stub classes and tools that describe a class shape
//! by hand. The constant pool is derived from the `ldc` instructions of all methods, and
//! `max_stack` is computed with [`crate::assembly::analyze_stack`] unless given explicitly.
//!
//! # Examples
//!
//! ```rust
//! use classpatch::{assembly::{opcodes, Instruction}, classfile::ClassBuilder};
//!
//! let class = ClassBuilder::new("com/example/Hud")
//!     .string_constant("[1466 FPS]")
//!     .field("label", "Ljava/lang/String;")
//!     .method("getText", "()Ljava/lang/String;", |method| {
//!         method.public().code(vec![
//!             Instruction::Ldc("\u{1} FPS".into()),
//!             Instruction::Simple(opcodes::ARETURN),
//!         ])
//!     })
//!     .build()?;
//!
//! assert_eq!(class.methods[0].max_stack, 1);
//! assert!(class.strings().any(|s| s == "\u{1} FPS"));
//! # Ok::<(), classpatch::Error>(())
//! ```

use crate::{
    assembly::{analyze_stack, Instruction},
    classfile::{AccessFlags, ClassRecord, Constant, FieldRecord, MethodRecord, TryCatchBlock},
    Result,
};

/// Builder for a single method, used through [`ClassBuilder::method`].
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    descriptor: String,
    access: AccessFlags,
    instructions: Vec<Instruction>,
    try_catch: Vec<TryCatchBlock>,
    max_stack: Option<u16>,
}

impl MethodBuilder {
    fn new(name: &str, descriptor: &str) -> Self {
        MethodBuilder {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access: AccessFlags::empty(),
            instructions: Vec::new(),
            try_catch: Vec::new(),
            max_stack: None,
        }
    }

    /// Marks the method public.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.access |= AccessFlags::PUBLIC;
        self
    }

    /// Marks the method private.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.access |= AccessFlags::PRIVATE;
        self
    }

    /// Marks the method static.
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.access |= AccessFlags::STATIC;
        self
    }

    /// Adds raw access flags.
    #[must_use]
    pub fn access(mut self, flags: AccessFlags) -> Self {
        self.access |= flags;
        self
    }

    /// Sets the method body.
    #[must_use]
    pub fn code(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = instructions;
        self
    }

    /// Adds an exception handler.
    #[must_use]
    pub fn try_catch(mut self, block: TryCatchBlock) -> Self {
        self.try_catch.push(block);
        self
    }

    /// Overrides the computed `max_stack`.
    #[must_use]
    pub fn max_stack(mut self, max_stack: u16) -> Self {
        self.max_stack = Some(max_stack);
        self
    }

    fn build(self) -> Result<MethodRecord> {
        let mut method =
            MethodRecord::new(self.name, self.descriptor, self.access, self.instructions)?;
        method.try_catch = self.try_catch;
        method.max_stack = match self.max_stack {
            Some(max_stack) => max_stack,
            // Bodies the analysis cannot follow keep 0 and are left to the host.
            None => analyze_stack(&method)
                .map(|analysis| analysis.max_stack)
                .unwrap_or(0),
        };
        Ok(method)
    }
}

struct PendingField {
    name: String,
    descriptor: String,
    access: AccessFlags,
}

/// Builder for a [`ClassRecord`].
pub struct ClassBuilder {
    class: ClassRecord,
    fields: Vec<PendingField>,
    methods: Vec<MethodBuilder>,
    extra_constants: Vec<Constant>,
}

impl ClassBuilder {
    /// Starts a public class extending `java/lang/Object`. Dotted names are accepted.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            class: ClassRecord::new(name.replace('.', "/")),
            fields: Vec::new(),
            methods: Vec::new(),
            extra_constants: Vec::new(),
        }
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, super_name: &str) -> Self {
        self.class.super_name = Some(super_name.replace('.', "/"));
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: &str) -> Self {
        self.class.interfaces.push(interface.replace('.', "/"));
        self
    }

    /// Declares the class as an enum extending `java/lang/Enum`.
    #[must_use]
    pub fn enumeration(mut self) -> Self {
        self.class.access |= AccessFlags::ENUM | AccessFlags::FINAL;
        self.class.super_name = Some("java/lang/Enum".to_string());
        self
    }

    /// Adds raw class access flags.
    #[must_use]
    pub fn access(mut self, flags: AccessFlags) -> Self {
        self.class.access |= flags;
        self
    }

    /// Adds a private instance field.
    #[must_use]
    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.field_with_access(name, descriptor, AccessFlags::PRIVATE)
    }

    /// Adds a field with explicit access flags.
    #[must_use]
    pub fn field_with_access(mut self, name: &str, descriptor: &str, access: AccessFlags) -> Self {
        self.fields.push(PendingField {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            access,
        });
        self
    }

    /// Adds a method configured by `configure`.
    #[must_use]
    pub fn method<F>(mut self, name: &str, descriptor: &str, configure: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.methods.push(configure(MethodBuilder::new(name, descriptor)));
        self
    }

    /// Adds a string to the constant pool that no method loads, e.g. an annotation value.
    #[must_use]
    pub fn string_constant(mut self, value: &str) -> Self {
        self.extra_constants.push(Constant::from(value));
        self
    }

    /// Builds the record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDescriptor`] if any field or method descriptor is
    /// malformed.
    pub fn build(self) -> Result<ClassRecord> {
        let mut class = self.class;

        for field in self.fields {
            let record = FieldRecord::new(&class.name, field.name, field.descriptor, field.access)?;
            class.fields.push(record);
        }

        for method in self.methods {
            class.methods.push(method.build()?);
        }

        let mut pool: Vec<Constant> = Vec::new();
        let loaded = class
            .methods
            .iter()
            .flat_map(|method| method.instructions.iter())
            .filter_map(|insn| match insn {
                Instruction::Ldc(constant) => Some(constant.clone()),
                _ => None,
            });
        for constant in self.extra_constants.into_iter().chain(loaded) {
            if !pool.contains(&constant) {
                pool.push(constant);
            }
        }
        class.constant_pool = pool;

        Ok(class)
    }
}
