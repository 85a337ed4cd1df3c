use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    classfile::{ClassRecord, MethodRecord},
    matcher::{ClassMatcher, MethodMatcher},
    module::ModuleId,
    transform::Transform,
};

/// A method-level registration: predicates plus, optionally, the block applied to the bound
/// method. Without a block the registration is a constraint the class has to satisfy.
#[derive(Debug)]
pub struct MethodRegistration {
    pub(crate) label: String,
    pub(crate) matcher: MethodMatcher,
    pub(crate) transform: Option<Transform>,
    pub(crate) module: Option<ModuleId>,
    pub(crate) matches: AtomicUsize,
}

impl MethodRegistration {
    pub(crate) fn new(
        label: String,
        matcher: MethodMatcher,
        transform: Option<Transform>,
        module: Option<ModuleId>,
    ) -> Self {
        MethodRegistration {
            label,
            matcher,
            transform,
            module,
            matches: AtomicUsize::new(0),
        }
    }

    /// Qualified label, `class::method`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The predicates selecting the method.
    #[must_use]
    pub fn matcher(&self) -> &MethodMatcher {
        &self.matcher
    }

    /// The block applied to the bound method, `None` for constraints.
    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Module that added the registration, if any.
    #[must_use]
    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    /// How often the registration was bound so far.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.load(Ordering::Relaxed)
    }

    /// Index of the first method of `class` satisfying the predicates, in declaration order.
    pub(crate) fn bind(&self, class: &ClassRecord) -> Option<usize> {
        class
            .methods
            .iter()
            .position(|method: &MethodRecord| self.matcher.matches(method))
    }
}

/// A class-level registration with its method registrations.
#[derive(Debug)]
pub struct ClassRegistration {
    pub(crate) label: String,
    pub(crate) matcher: ClassMatcher,
    pub(crate) methods: Vec<MethodRegistration>,
    pub(crate) module: Option<ModuleId>,
    pub(crate) matches: AtomicUsize,
}

impl ClassRegistration {
    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The predicates selecting the class.
    #[must_use]
    pub fn matcher(&self) -> &ClassMatcher {
        &self.matcher
    }

    /// Method registrations, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodRegistration] {
        &self.methods
    }

    /// Module that added the registration, if any.
    #[must_use]
    pub fn module(&self) -> Option<ModuleId> {
        self.module
    }

    /// How many classes matched so far.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.load(Ordering::Relaxed)
    }

    /// Returns `true` if some method registration carries a non-empty block.
    pub(crate) fn has_work(&self) -> bool {
        self.methods
            .iter()
            .any(|method| method.transform.as_ref().is_some_and(|t| !t.is_empty()))
    }
}
