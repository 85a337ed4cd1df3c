//! Class pool scanning.
//!
//! The [`Scanner`] holds the frozen list of class registrations built by a
//! [`ScannerBuilder`]. For every class handed to it, it evaluates each registration in
//! declaration order:
//!
//! 1. The class predicates are tested.
//! 2. Every method registration is bound to the first method satisfying its predicates, in
//!    declaration order of the methods. A method registration without a transform block is a
//!    constraint: if it cannot be bound, the class does not match.
//! 3. Each bound transform block is applied to its method and committed atomically.
//!
//! A failed block is recorded in the [`ClassReport`] and the scan continues with the next
//! registration, so one broken registration never prevents another from applying.
//!
//! # Concurrency
//!
//! A scanner is `Send + Sync` and can scan distinct classes on several threads at once; the
//! same class is serialised by a per-class-name lock. [`Scanner::transform_all`] uses rayon to
//! scan a batch in parallel.
//!
//! # Key Components
//!
//! - [`ScannerBuilder`] / [`ClassFinderBuilder`] / [`MethodsBuilder`] / [`MethodFinderBuilder`]
//!   - The registration DSL
//! - [`Scanner`] - Frozen registrations applied to classes
//! - [`ClassReport`] - What happened to one class

mod builder;
mod registration;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, warn};

pub use builder::{ClassFinderBuilder, MethodFinderBuilder, MethodsBuilder, ScannerBuilder};
pub use registration::{ClassRegistration, MethodRegistration};

use crate::{
    classfile::ClassRecord,
    events::{EventKind, EventLog},
    module::{ModuleId, ModuleRegistry},
    Error, Result,
};

/// A transform block that failed on one method and was discarded.
#[derive(Debug)]
pub struct TransformFailure {
    /// Label of the method registration
    pub registration: String,
    /// Signature of the method that stayed untouched
    pub method: String,
    /// Why the block failed
    pub error: Error,
}

/// What a scan did to one class.
#[derive(Debug)]
pub struct ClassReport {
    /// Internal name of the class
    pub class: String,
    /// Labels of the class registrations that matched
    pub matched: Vec<String>,
    /// Signatures of the methods whose bodies changed, without duplicates
    pub transformed: Vec<String>,
    /// Blocks that failed
    pub failures: Vec<TransformFailure>,
    /// Detailed events
    pub events: EventLog,
    /// Whether the host should recompute stack map frames when writing the class
    pub compute_frames: bool,
}

impl ClassReport {
    fn new(class: &str) -> Self {
        ClassReport {
            class: class.to_string(),
            matched: Vec::new(),
            transformed: Vec::new(),
            failures: Vec::new(),
            events: EventLog::new(),
            compute_frames: true,
        }
    }

    /// Returns `true` if some method body changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.transformed.is_empty()
    }

    /// Returns `true` if the class matched some registration.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// One line of [`Scanner::audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAudit {
    /// Qualified registration label
    pub label: String,
    /// Module that added it
    pub module: Option<ModuleId>,
    /// Classes matched, or methods bound for method registrations
    pub matches: usize,
}

/// Applies frozen registrations to classes.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use classpatch::{
///     assembly::{opcodes, Instruction},
///     classfile::ClassBuilder,
///     module::ModuleRegistry,
///     scanner::ScannerBuilder,
/// };
///
/// let mut builder = ScannerBuilder::new(Arc::new(ModuleRegistry::new()));
/// builder.find_host_class(|class| {
///     class.has_string("Refreshed render target textures.");
///     class.methods(|methods| {
///         methods.method("checkCloth", |method| {
///             method.has_string("LunarPlus");
///             method.transform(|t| {
///                 t.fixed_value(true);
///             });
///         });
///     });
/// });
/// let scanner = builder.build();
///
/// let mut class = ClassBuilder::new("com/moonsworth/lunar/Capes")
///     .string_constant("Refreshed render target textures.")
///     .method("a", "()Z", |m| {
///         m.code(vec![
///             Instruction::Ldc("LunarPlus".into()),
///             Instruction::Simple(opcodes::POP),
///             Instruction::Simple(opcodes::ICONST_0),
///             Instruction::Simple(opcodes::IRETURN),
///         ])
///     })
///     .build()?;
///
/// let report = scanner.transform(&mut class)?;
/// assert!(report.is_modified());
/// assert_eq!(class.methods[0].instructions.len(), 2);
/// # Ok::<(), classpatch::Error>(())
/// ```
pub struct Scanner {
    registry: Arc<ModuleRegistry>,
    registrations: Vec<ClassRegistration>,
    issues: Vec<Error>,
    build_events: EventLog,
    locks: DashMap<String, Arc<Mutex<()>>>,
    scanned: AtomicUsize,
}

impl Scanner {
    fn new(
        registry: Arc<ModuleRegistry>,
        registrations: Vec<ClassRegistration>,
        issues: Vec<Error>,
        build_events: EventLog,
    ) -> Self {
        Scanner {
            registry,
            registrations,
            issues,
            build_events,
            locks: DashMap::new(),
            scanned: AtomicUsize::new(0),
        }
    }

    /// The module snapshot the registrations were built against.
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Class registrations, in declaration order.
    #[must_use]
    pub fn registrations(&self) -> &[ClassRegistration] {
        &self.registrations
    }

    /// Problems met while registering, such as modules disabled for bad configuration.
    #[must_use]
    pub fn issues(&self) -> &[Error] {
        &self.issues
    }

    /// Events recorded while registering.
    #[must_use]
    pub fn build_events(&self) -> &EventLog {
        &self.build_events
    }

    /// Number of classes scanned so far.
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.scanned.load(Ordering::Relaxed)
    }

    /// Scans one class, applying every matching registration in declaration order.
    ///
    /// Failures of individual transform blocks are reported in the returned
    /// [`ClassReport`] and never abort the scan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockError`] if the lock of this class was poisoned.
    pub fn transform(&self, class: &mut ClassRecord) -> Result<ClassReport> {
        let name = class.name.clone();
        let lock = Arc::clone(self.locks.entry(name.clone()).or_default().value());
        let report = match lock!(lock) {
            Ok(_guard) => Ok(self.scan(class)),
            Err(error) => Err(error),
        };

        // the entry stays only while another scan of the same class holds it
        drop(lock);
        self.locks.remove_if(&name, |_, lock| Arc::strong_count(lock) == 1);
        report
    }

    fn scan(&self, class: &mut ClassRecord) -> ClassReport {
        self.scanned.fetch_add(1, Ordering::Relaxed);
        let mut report = ClassReport::new(&class.name);
        for registration in &self.registrations {
            self.apply_registration(registration, class, &mut report);
        }

        if report.is_modified() {
            debug!(
                class = %class.name,
                methods = report.transformed.len(),
                failures = report.failures.len(),
                "class transformed"
            );
        }
        report
    }

    /// Scans a batch of classes in parallel.
    ///
    /// Reports are returned in the order of `classes`.
    pub fn transform_all(&self, classes: &mut [ClassRecord]) -> Vec<Result<ClassReport>> {
        classes
            .par_iter_mut()
            .map(|class| self.transform(class))
            .collect()
    }

    fn apply_registration(
        &self,
        registration: &ClassRegistration,
        class: &mut ClassRecord,
        report: &mut ClassReport,
    ) {
        if !registration.matcher.matches(class) {
            return;
        }

        let bindings: Vec<Option<usize>> = registration
            .methods
            .iter()
            .map(|method| method.bind(class))
            .collect();
        let unmet = registration
            .methods
            .iter()
            .zip(&bindings)
            .any(|(method, binding)| method.transform.is_none() && binding.is_none());
        if unmet {
            return;
        }

        registration.matches.fetch_add(1, Ordering::Relaxed);
        report.matched.push(registration.label.clone());
        report
            .events
            .record(EventKind::ClassMatched)
            .class(class.name.clone())
            .registration(registration.label.clone());

        for (method_registration, binding) in registration.methods.iter().zip(bindings) {
            let Some(index) = binding else {
                report
                    .events
                    .record(EventKind::RegistrationUnmatched)
                    .class(class.name.clone())
                    .registration(method_registration.label.clone());
                continue;
            };
            method_registration.matches.fetch_add(1, Ordering::Relaxed);
            report
                .events
                .record(EventKind::MethodMatched)
                .class(class.name.clone())
                .method(class.methods[index].signature())
                .registration(method_registration.label.clone());

            let Some(transform) = &method_registration.transform else {
                continue;
            };

            let mut method = class.methods[index].clone();
            let outcome = transform.apply(
                class,
                &mut method,
                &method_registration.label,
                &report.events,
            );
            match outcome {
                Ok(outcome) => {
                    if outcome.changed {
                        let signature = method.signature();
                        class.methods[index] = method;
                        if !report.transformed.contains(&signature) {
                            report.transformed.push(signature);
                        }
                        if !transform.compute_frames() {
                            report.compute_frames = false;
                        }
                    }
                }
                Err(error) => {
                    let signature = method.signature();
                    warn!(
                        class = %class.name,
                        method = %signature,
                        registration = %method_registration.label,
                        %error,
                        "transform failed, method left untouched"
                    );
                    report
                        .events
                        .record(EventKind::TransformFailed)
                        .class(class.name.clone())
                        .method(signature.clone())
                        .registration(method_registration.label.clone())
                        .message(error.to_string());
                    report.failures.push(TransformFailure {
                        registration: method_registration.label.clone(),
                        method: signature,
                        error,
                    });
                }
            }
        }
    }

    /// Match counts of every class and method registration.
    #[must_use]
    pub fn audit(&self) -> Vec<RegistrationAudit> {
        let mut lines = Vec::new();
        for class in &self.registrations {
            lines.push(RegistrationAudit {
                label: class.label.clone(),
                module: class.module,
                matches: class.match_count(),
            });
            for method in &class.methods {
                lines.push(RegistrationAudit {
                    label: method.label.clone(),
                    module: method.module.or(class.module),
                    matches: method.match_count(),
                });
            }
        }
        lines
    }

    /// Registrations that never matched, as [`Error::MatchNotFound`], each logged as a warning.
    ///
    /// Meant to be called after the whole class pool was scanned.
    #[must_use]
    pub fn unmatched(&self) -> Vec<Error> {
        self.audit()
            .into_iter()
            .filter(|line| line.matches == 0)
            .map(|line| {
                warn!(registration = %line.label, module = ?line.module, "registration never matched");
                Error::MatchNotFound {
                    registration: line.label,
                }
            })
            .collect()
    }
}
