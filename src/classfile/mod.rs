//! Structural records of JVM classes.
//!
//! This module provides the read-mostly view of a class that all matching and transformation
//! works on. A host parses class bytes into a [`ClassRecord`], hands it to the
//! [`crate::scanner::Scanner`] and re-serializes whatever comes back.
//!
//! # Key Components
//!
//! - [`ClassRecord`] - Name, hierarchy, flags, fields, methods and constant pool of a class
//! - [`MethodRecord`] - Decoded signature plus the editable instruction sequence
//! - [`FieldRecord`] - A declared field
//! - [`Constant`] / [`ConstantKind`] - Loadable literal values and their categories
//! - [`Type`] / [`MethodDescriptor`] - Parsed JVM descriptors
//! - [`ClassBuilder`] - Fluent construction of records without a class file

mod builder;
mod class;
mod constant;
mod descriptor;
mod field;
mod flags;
mod method;

pub use builder::{ClassBuilder, MethodBuilder};
pub use class::ClassRecord;
pub use constant::{Constant, ConstantKind};
pub use descriptor::{MethodDescriptor, Type};
pub use field::FieldRecord;
pub use flags::AccessFlags;
pub use method::{MethodRecord, TryCatchBlock};
