//! # classpatch Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the classpatch library. Import this module to get quick access to the essential
//! types for matching and patching classes.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all classpatch operations
pub use crate::Error;

/// The result type used throughout classpatch
pub use crate::Result;

// ================================================================================================
// Class Records
// ================================================================================================

/// Structural records handed in by the host
pub use crate::classfile::{
    AccessFlags, ClassBuilder, ClassRecord, Constant, ConstantKind, FieldRecord, MethodRecord,
    Type,
};

// ================================================================================================
// Instructions
// ================================================================================================

/// Instruction model and helpers
pub use crate::assembly::{
    analyze_stack, opcodes, FieldRef, Fragment, FragmentBuilder, Instruction, InstructionCursor,
    Label, MethodRef,
};

// ================================================================================================
// Matching and Scanning
// ================================================================================================

/// Predicate DSL
pub use crate::matcher::{ClassMatcher, MemberMatcher, MethodMatcher, StringMatch};

/// Registration DSL and scanner
pub use crate::scanner::{ClassReport, Scanner, ScannerBuilder};

/// Transform blocks
pub use crate::transform::{TransformBuilder, TransformContext, TransformOp};

// ================================================================================================
// Modules and Tweaks
// ================================================================================================

/// Module configuration
pub use crate::module::{ModuleId, ModuleRegistry};

/// The default tweak set
pub use crate::tweaks;

/// Event log
pub use crate::events::{EventKind, EventLog};
