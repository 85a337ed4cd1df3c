use thiserror::Error;

use crate::{classfile::ConstantKind, module::ModuleId};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// None of these errors is fatal to a scan. The scanner catches every error raised while
/// applying one registration to one method, records it in the [`crate::scanner::ClassReport`]
/// and continues with the next registration, leaving the failed method untouched.
///
/// # Error Categories
///
/// ## Matching
/// - [`Error::MatchNotFound`] - A registration never matched anything (audit only)
/// - [`Error::InstructionNotFound`] - A transform could not locate its target instruction
///
/// ## Structural validity
/// - [`Error::StackImbalance`] - An edit leaves the operand stack inconsistent
/// - [`Error::ConstantTypeMismatch`] - A constant replacement changes the constant category
/// - [`Error::InvalidDescriptor`] - A JVM type or method descriptor could not be parsed
/// - [`Error::Malformed`] - An instruction sequence violates an internal invariant
///
/// ## Configuration
/// - [`Error::ModuleConfig`] - A module option is missing or has the wrong type
/// - [`Error::Config`] - The configuration document could not be decoded
///
/// # Examples
///
/// ```rust,no_run
/// use classpatch::{Error, transform::TransformOp, classfile::Constant};
///
/// match TransformOp::replace_constant(Constant::Int(8), Constant::Long(8)) {
///     Err(Error::ConstantTypeMismatch { from, to }) => {
///         eprintln!("cannot turn a {from} into a {to}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
///     Ok(_) => {}
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A registration did not match any class or method during the scan.
    ///
    /// Registrations are written defensively against host-application version drift, so this
    /// is reported for auditing only and never aborts a scan.
    #[error("Registration '{registration}' did not match anything")]
    MatchNotFound {
        /// Label of the registration that never matched
        registration: String,
    },

    /// A transform could not find the instruction it needs to edit.
    ///
    /// Raised when a call site, field reference or constant load that a transform relies on
    /// is absent from the matched method. Only the transform of that method is aborted.
    #[error("{registration}: could not find {target}")]
    InstructionNotFound {
        /// Label of the registration whose transform failed
        registration: String,
        /// Description of what was searched for
        target: String,
    },

    /// An edit produces a statically inconsistent operand stack.
    #[error("Stack imbalance in {method}: {message}")]
    StackImbalance {
        /// `name + descriptor` of the affected method
        method: String,
        /// What went wrong
        message: String,
    },

    /// A constant replacement would change the category of the loaded constant.
    #[error("Constant category mismatch - cannot replace a {from} with a {to}")]
    ConstantTypeMismatch {
        /// Category of the constant being replaced
        from: ConstantKind,
        /// Category of the replacement
        to: ConstantKind,
    },

    /// A JVM descriptor could not be parsed.
    #[error("Invalid descriptor - {0}")]
    InvalidDescriptor(String),

    /// A module option is missing or holds a value of the wrong type.
    ///
    /// Raised while building the registrations of a module. The module is disabled for the
    /// scan; other modules are not affected.
    #[error("Module {module}: {message}")]
    ModuleConfig {
        /// The module whose configuration is broken
        module: ModuleId,
        /// What is wrong with it
        message: String,
    },

    /// The configuration document could not be decoded.
    #[error("{0}")]
    Config(#[from] serde_json::Error),

    /// An instruction sequence violates an internal invariant.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to lock target.
    ///
    /// A per-class lock was poisoned by a panicking transform on another thread.
    #[error("Failed to lock target")]
    LockError,
}
