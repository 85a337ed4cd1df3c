use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Access and property flags of classes, methods and fields.
    ///
    /// The JVM reuses several bit positions with a different meaning per member kind
    /// (e.g. `0x0020` is `ACC_SUPER` on classes and `ACC_SYNCHRONIZED` on methods); only the
    /// names needed by the matchers are defined separately.
    pub struct AccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Methods: synchronized
        const SYNCHRONIZED = 0x0020;
        /// Classes: treat superclass calls specially (`ACC_SUPER`)
        const SUPER = 0x0020;
        /// Methods: bridge. Fields: volatile
        const BRIDGE = 0x0040;
        /// Methods: varargs. Fields: transient
        const VARARGS = 0x0080;
        /// Implemented in native code
        const NATIVE = 0x0100;
        /// Class is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Strict floating point
        const STRICT = 0x0800;
        /// Generated by the compiler
        const SYNTHETIC = 0x1000;
        /// Class is an annotation type
        const ANNOTATION = 0x2000;
        /// Class is an enum, or field is an enum constant
        const ENUM = 0x4000;
    }
}
