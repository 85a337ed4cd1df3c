// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # classpatch
//!
//! A matching and patching engine for the compiled JVM classes of a closed-source, obfuscated
//! application. Instead of relying on names, which change with every release, code is located
//! by content: string literals, constants, calls and field accesses. Once located, method
//! bodies are edited with a small set of structural operations that keep the operand stack
//! consistent.
//!
//! ## Features
//!
//! - **🔍 Content-based matching** - Composable predicates over classes, methods and members
//! - **🔧 Structural transforms** - Constant and string replacement, stubbing, call advice,
//!   call replacement, exit injection and full body overwrites
//! - **🛡️ Atomic commits** - A transform block either applies completely and passes stack
//!   analysis, or leaves the method untouched
//! - **🧩 Modules** - Every tweak is guarded by a module configured once, before scanning
//! - **⚡ Parallel scanning** - A frozen scanner is `Send + Sync`; batches run on rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use classpatch::prelude::*;
//!
//! let registry = ModuleRegistry::from_json(
//!     r#"{"modules": {"remove_profiles_cap": {"enabled": true}}}"#,
//! )?;
//! let scanner = tweaks::default_scanner(Arc::new(registry));
//!
//! let mut class = ClassBuilder::new("com/moonsworth/lunar/Profiles")
//!     .string_constant("saveNewProfile")
//!     .method("a", "(Ljava/lang/String;)Z", |m| {
//!         m.code(vec![
//!             Instruction::Ldc("profile".into()),
//!             Instruction::Simple(opcodes::POP),
//!             Instruction::Int { opcode: opcodes::BIPUSH, operand: 8 },
//!             Instruction::Simple(opcodes::IRETURN),
//!         ])
//!     })
//!     .build()?;
//!
//! let report = scanner.transform(&mut class)?;
//! assert!(report.is_modified());
//! assert!(class.methods[0].constants().any(|c| c == Constant::Int(i32::MAX)));
//! # Ok::<(), classpatch::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`classfile`] - Structural records of classes, methods and fields handed in by the host
//! - [`assembly`] - The instruction model, cursors, fragments and stack analysis
//! - [`matcher`] - Predicate DSL over classes, methods and members
//! - [`transform`] - Transform operations and the block builder
//! - [`scanner`] - Registration DSL and the scanner applying it
//! - [`module`] - Module identifiers, options and the configuration registry
//! - [`tweaks`] - The default tweak set
//! - [`events`] - Per-class event log
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! No single failure aborts a scan. Errors raised while applying one registration to one
//! method are collected in the [`scanner::ClassReport`]; configuration errors disable only the
//! module they belong to.
//!
//! ```rust
//! use classpatch::{Error, transform::TransformOp};
//!
//! match TransformOp::replace_constant(8, 8i64) {
//!     Err(Error::ConstantTypeMismatch { from, to }) => println!("{from} cannot become {to}"),
//!     Err(e) => println!("Other error: {e}"),
//!     Ok(_) => println!("accepted"),
//! }
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use classpatch::prelude::*;
///
/// let mut matcher = ClassMatcher::new();
/// matcher.is_host_class().has_string("[1466 FPS]");
/// ```
pub mod prelude;

/// The instruction model and the tools built on it.
///
/// # Key Types
///
/// - [`assembly::Instruction`] - One JVM instruction or pseudo-instruction
/// - [`assembly::InstructionCursor`] - Forward and backward search through a body
/// - [`assembly::Fragment`] / [`assembly::FragmentBuilder`] - Spliceable instruction sequences
/// - [`assembly::analyze_stack`] - Operand stack validation of a whole body
pub mod assembly;

/// Structural records of classes, fields and methods.
///
/// The host parses class files and hands [`classfile::ClassRecord`]s to the scanner; reading
/// and writing the binary class format is the host's business.
pub mod classfile;

/// Per-class event log.
pub mod events;

/// Composable predicates over classes, methods and members.
pub mod matcher;

/// Module identifiers, typed options and the configuration registry.
pub mod module;

/// Registration DSL and the scanner applying registrations to classes.
pub mod scanner;

/// Method body transformations.
pub mod transform;

/// The default tweak set.
pub mod tweaks;

/// `classpatch` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `classpatch` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
