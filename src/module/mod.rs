//! Independently toggleable bundles of registrations.
//!
//! A module groups the registrations implementing one user-visible tweak. Whether a module
//! takes part in a scan, and with which option values, is resolved once from a
//! [`ConfigSnapshot`] into a [`ModuleRegistry`] before any class is scanned. Registrations of a
//! disabled module are never built, so they cannot evaluate predicates or edit methods.
//!
//! # Key Components
//!
//! - [`ModuleId`] - The fixed set of module identifiers
//! - [`Module`] - Enabled flag plus typed option access
//! - [`ModuleRegistry`] - One module per identifier, built from configuration
//! - [`ConfigSnapshot`] - The JSON configuration document

mod config;
mod id;
mod options;
mod registry;

pub use config::{ConfigSnapshot, ModuleSettings};
pub use id::ModuleId;
pub use options::{Module, OptionValue};
pub use registry::ModuleRegistry;
