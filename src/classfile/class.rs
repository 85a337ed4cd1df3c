use crate::classfile::{AccessFlags, Constant, FieldRecord, MethodRecord};

/// Structural view of one class as delivered by the host.
///
/// A record is built once per class-load event. Matching only reads it; the scanner replaces
/// method bodies in place when a transform block commits, after which the host re-serializes
/// the record and discards it.
#[derive(Debug, Clone)]
pub struct ClassRecord {
    /// Internal name (`com/example/Foo`)
    pub name: String,
    /// Internal name of the superclass, `None` only for `java/lang/Object`
    pub super_name: Option<String>,
    /// Internal names of directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Class access flags
    pub access: AccessFlags,
    /// Declared fields, in class file order
    pub fields: Vec<FieldRecord>,
    /// Declared methods, in class file order
    pub methods: Vec<MethodRecord>,
    /// Loadable entries of the constant pool
    pub constant_pool: Vec<Constant>,
}

impl ClassRecord {
    /// Creates an empty class extending `java/lang/Object`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ClassRecord {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: AccessFlags::PUBLIC | AccessFlags::SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            constant_pool: Vec::new(),
        }
    }

    /// Returns `true` if the class is an enum.
    ///
    /// Obfuscators sometimes strip `ACC_ENUM`, so a direct `java/lang/Enum` superclass is
    /// accepted as well.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.access.contains(AccessFlags::ENUM)
            || self.super_name.as_deref() == Some("java/lang/Enum")
    }

    /// Returns `true` if the class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(AccessFlags::INTERFACE)
    }

    /// Iterates over the string literals of the constant pool.
    pub fn strings(&self) -> impl Iterator<Item = &str> + '_ {
        self.constant_pool.iter().filter_map(Constant::as_str)
    }

    /// Returns the first method named `name`.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Returns the first field whose descriptor equals `descriptor`.
    #[must_use]
    pub fn field_by_descriptor(&self, descriptor: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|field| field.descriptor == descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_class_flags() {
        let class = ClassRecord::new("a/Plain");
        assert!(class.access.contains(AccessFlags::PUBLIC | AccessFlags::SUPER));
        assert!(!class.is_enum());
        assert!(!class.is_interface());
    }

    #[test]
    fn test_enum_detection() {
        let mut class = ClassRecord::new("a/Mode");
        class.super_name = Some("java/lang/Enum".to_string());
        assert!(class.is_enum());

        let mut flagged = ClassRecord::new("a/Flagged");
        flagged.access |= AccessFlags::ENUM;
        assert!(flagged.is_enum());
    }
}
