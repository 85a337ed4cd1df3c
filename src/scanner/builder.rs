use std::{
    ops::{Deref, DerefMut},
    sync::{atomic::AtomicUsize, Arc},
};

use tracing::{debug, trace, warn};

use crate::{
    classfile::Constant,
    events::{EventKind, EventLog},
    matcher::{ClassMatcher, MethodMatcher},
    module::{Module, ModuleId, ModuleRegistry},
    scanner::{ClassRegistration, MethodRegistration, Scanner},
    transform::{module_failure, TransformBuilder},
    Error, Result,
};

/// Shared rollback logic of module-scoped sections.
///
/// A section only runs when its module is enabled. If it returns an error, or anything it adds
/// reports an issue, every registration it added is removed and a single
/// [`Error::ModuleConfig`] takes the place of the raised issues.
trait ModuleScope: Sized {
    /// Everything a section can add, recorded before it runs.
    type Mark;

    fn shared_registry(&self) -> Arc<ModuleRegistry>;
    fn issues_mut(&mut self) -> &mut Vec<Error>;
    fn registered(&self) -> Self::Mark;
    fn rollback(&mut self, registered: Self::Mark);
    fn scope(&mut self) -> &mut Option<ModuleId>;

    fn scoped<F>(&mut self, id: ModuleId, section: F)
    where
        F: FnOnce(&Module, &mut Self) -> Result<()>,
    {
        let registry = self.shared_registry();
        if !registry.is_enabled(id) {
            trace!(module = %id, "module disabled, section skipped");
            return;
        }

        let registered = self.registered();
        let mark = self.issues_mut().len();
        let outer = self.scope().replace(id);
        let result = section(registry.module(id), self);
        *self.scope() = outer;

        if let Some(error) = module_failure(id, result, self.issues_mut(), mark) {
            warn!(module = %id, %error, "module registrations rolled back");
            self.rollback(registered);
            self.issues_mut().push(error);
        }
    }
}

/// Collects class registrations, then freezes them into a [`Scanner`].
///
/// Registration happens once, single-threaded, before any class is scanned. Sections guarded
/// by [`ScannerBuilder::with_module`] see the module snapshot of the registry; sections of
/// disabled modules never run and leave nothing behind.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use classpatch::{module::{ModuleId, ModuleRegistry}, scanner::ScannerBuilder};
///
/// let mut registry = ModuleRegistry::new();
/// registry.enable(ModuleId::RemoveProfilesCap);
///
/// let mut builder = ScannerBuilder::new(Arc::new(registry));
/// builder.with_module(ModuleId::RemoveProfilesCap, |_, scanner| {
///     scanner.find_host_class(|class| {
///         class.has_string("saveNewProfile");
///         class.methods(|methods| {
///             methods.method("handleNewProfile", |method| {
///                 method.has_string("profile");
///                 method.transform(|t| {
///                     t.replace_constant(8, i32::MAX);
///                 });
///             });
///         });
///     });
///     Ok(())
/// });
///
/// let scanner = builder.build();
/// assert_eq!(scanner.registrations().len(), 1);
/// ```
pub struct ScannerBuilder {
    registry: Arc<ModuleRegistry>,
    classes: Vec<ClassRegistration>,
    issues: Vec<Error>,
    module: Option<ModuleId>,
}

impl ModuleScope for ScannerBuilder {
    type Mark = usize;

    fn shared_registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    fn issues_mut(&mut self) -> &mut Vec<Error> {
        &mut self.issues
    }

    fn registered(&self) -> usize {
        self.classes.len()
    }

    fn rollback(&mut self, registered: usize) {
        self.classes.truncate(registered);
    }

    fn scope(&mut self) -> &mut Option<ModuleId> {
        &mut self.module
    }
}

impl ScannerBuilder {
    /// Creates a builder registering against `registry`.
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        ScannerBuilder {
            registry,
            classes: Vec::new(),
            issues: Vec::new(),
            module: None,
        }
    }

    /// The module snapshot registrations are built against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Registers a class with predicates and method registrations set up by `configure`.
    ///
    /// A class registration that ends up with nothing to apply is dropped.
    pub fn find_class<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ClassFinderBuilder),
    {
        let mut finder = ClassFinderBuilder::new(Arc::clone(&self.registry), self.module);
        configure(&mut finder);
        let (registration, issues) = finder.finish();
        self.issues.extend(issues);
        match registration {
            Some(registration) => self.classes.push(registration),
            None => trace!("class registration with nothing to apply dropped"),
        }
        self
    }

    /// Registers a class of the host application package.
    pub fn find_host_class<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ClassFinderBuilder),
    {
        self.find_class(|class| {
            class.is_host_class();
            configure(class);
        })
    }

    /// Registers a class of the platform package.
    pub fn find_platform_class<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ClassFinderBuilder),
    {
        self.find_class(|class| {
            class.is_platform_class();
            configure(class);
        })
    }

    /// Registers a class by name, dotted or internal.
    pub fn find_named_class<F>(&mut self, name: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ClassFinderBuilder),
    {
        self.find_class(|class| {
            class.named(name);
            configure(class);
        })
    }

    /// Runs `section` if module `id` is enabled.
    ///
    /// Option lookups inside the section use `?`; a failure removes everything the section
    /// registered and disables only this module.
    pub fn with_module<F>(&mut self, id: ModuleId, section: F) -> &mut Self
    where
        F: FnOnce(&Module, &mut ScannerBuilder) -> Result<()>,
    {
        self.scoped(id, section);
        self
    }

    /// Issues collected so far.
    #[must_use]
    pub fn issues(&self) -> &[Error] {
        &self.issues
    }

    /// Freezes the registrations.
    #[must_use]
    pub fn build(self) -> Scanner {
        let log = EventLog::new();
        for issue in &self.issues {
            match issue {
                Error::ModuleConfig { module, message } => {
                    log.record(EventKind::ModuleDisabled)
                        .message(format!("{module}: {message}"));
                }
                other => log.error(other.to_string()),
            }
        }
        debug!(
            registrations = self.classes.len(),
            issues = self.issues.len(),
            "scanner built"
        );
        Scanner::new(self.registry, self.classes, self.issues, log)
    }
}

/// Predicates and method registrations of one class registration.
///
/// Dereferences to [`ClassMatcher`], so every class predicate can be added directly.
pub struct ClassFinderBuilder {
    registry: Arc<ModuleRegistry>,
    matcher: ClassMatcher,
    label: Option<String>,
    methods: Vec<MethodRegistration>,
    issues: Vec<Error>,
    module: Option<ModuleId>,
    class_module: Option<ModuleId>,
    unnamed: usize,
}

impl Deref for ClassFinderBuilder {
    type Target = ClassMatcher;

    fn deref(&self) -> &ClassMatcher {
        &self.matcher
    }
}

impl DerefMut for ClassFinderBuilder {
    fn deref_mut(&mut self) -> &mut ClassMatcher {
        &mut self.matcher
    }
}

impl ModuleScope for ClassFinderBuilder {
    type Mark = (usize, usize, Option<String>);

    fn shared_registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    fn issues_mut(&mut self) -> &mut Vec<Error> {
        &mut self.issues
    }

    fn registered(&self) -> Self::Mark {
        (
            self.methods.len(),
            self.matcher.predicates().len(),
            self.label.clone(),
        )
    }

    fn rollback(&mut self, (methods, predicates, label): Self::Mark) {
        self.methods.truncate(methods);
        self.matcher.truncate(predicates);
        self.label = label;
    }

    fn scope(&mut self) -> &mut Option<ModuleId> {
        &mut self.module
    }
}

impl ClassFinderBuilder {
    fn new(registry: Arc<ModuleRegistry>, module: Option<ModuleId>) -> Self {
        ClassFinderBuilder {
            registry,
            matcher: ClassMatcher::new(),
            label: None,
            methods: Vec::new(),
            issues: Vec::new(),
            module,
            class_module: module,
            unnamed: 0,
        }
    }

    /// Names the registration in reports; defaults to the printed predicates.
    pub fn label(&mut self, label: &str) -> &mut Self {
        self.label = Some(label.to_string());
        self
    }

    /// Adds method registrations.
    pub fn methods<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MethodsBuilder),
    {
        let mut methods = MethodsBuilder {
            registry: Arc::clone(&self.registry),
            methods: Vec::new(),
            issues: Vec::new(),
            module: self.module,
            unnamed: self.unnamed,
        };
        configure(&mut methods);
        self.unnamed = methods.unnamed;
        self.methods.extend(methods.methods);
        self.issues.extend(methods.issues);
        self
    }

    /// Replaces `from` with `to` in the first method pushing `from`.
    pub fn constant_replacement(
        &mut self,
        from: impl Into<Constant>,
        to: impl Into<Constant>,
    ) -> &mut Self {
        let (from, to) = (from.into(), to.into());
        self.methods(|methods| {
            methods.constant_replacement(from, to);
        })
    }

    /// One [`ClassFinderBuilder::constant_replacement`] per pair.
    pub fn constant_replacements<C>(&mut self, pairs: impl IntoIterator<Item = (C, C)>) -> &mut Self
    where
        C: Into<Constant>,
    {
        for (from, to) in pairs {
            self.constant_replacement(from, to);
        }
        self
    }

    /// Runs `section` if module `id` is enabled; see [`ScannerBuilder::with_module`].
    pub fn with_module<F>(&mut self, id: ModuleId, section: F) -> &mut Self
    where
        F: FnOnce(&Module, &mut ClassFinderBuilder) -> Result<()>,
    {
        self.scoped(id, section);
        self
    }

    fn finish(self) -> (Option<ClassRegistration>, Vec<Error>) {
        let label = self.label.unwrap_or_else(|| self.matcher.to_string());
        let methods = self
            .methods
            .into_iter()
            .filter(|method| method.transform.as_ref().map_or(true, |t| !t.is_empty()))
            .map(|mut method| {
                method.label = format!("{label}::{}", method.label);
                method
            })
            .collect();

        let registration = ClassRegistration {
            label,
            matcher: self.matcher,
            methods,
            module: self.class_module,
            matches: AtomicUsize::new(0),
        };
        let registration = registration.has_work().then_some(registration);
        (registration, self.issues)
    }
}

/// Method registrations of one class registration.
pub struct MethodsBuilder {
    registry: Arc<ModuleRegistry>,
    methods: Vec<MethodRegistration>,
    issues: Vec<Error>,
    module: Option<ModuleId>,
    unnamed: usize,
}

impl ModuleScope for MethodsBuilder {
    type Mark = usize;

    fn shared_registry(&self) -> Arc<ModuleRegistry> {
        Arc::clone(&self.registry)
    }

    fn issues_mut(&mut self) -> &mut Vec<Error> {
        &mut self.issues
    }

    fn registered(&self) -> usize {
        self.methods.len()
    }

    fn rollback(&mut self, registered: usize) {
        self.methods.truncate(registered);
    }

    fn scope(&mut self) -> &mut Option<ModuleId> {
        &mut self.module
    }
}

impl MethodsBuilder {
    fn register<F>(&mut self, label: String, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MethodFinderBuilder),
    {
        let mut finder = MethodFinderBuilder {
            registry: Arc::clone(&self.registry),
            matcher: MethodMatcher::new(),
            transform: None,
        };
        configure(&mut finder);

        let transform = finder.transform.map(|builder| {
            let (transform, issues) = builder.finish();
            self.issues.extend(issues);
            transform
        });
        self.methods.push(MethodRegistration::new(
            label,
            finder.matcher,
            transform,
            self.module,
        ));
        self
    }

    /// Registers a method under `label`.
    ///
    /// The label only names the registration; the method is found by the predicates set up
    /// in `configure`, since obfuscated names change between host versions.
    pub fn method<F>(&mut self, label: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MethodFinderBuilder),
    {
        self.register(label.to_string(), configure)
    }

    /// Registers a method without a label.
    pub fn unnamed_method<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MethodFinderBuilder),
    {
        self.unnamed += 1;
        let label = format!("<unnamed {}>", self.unnamed);
        self.register(label, configure)
    }

    /// Transforms the method whose actual name is `name`.
    pub fn named_transform<F>(&mut self, name: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut TransformBuilder),
    {
        self.register(name.to_string(), |method| {
            method.named(name);
            method.transform(configure);
        })
    }

    /// Replaces `from` with `to` in the first method pushing `from`.
    pub fn constant_replacement(
        &mut self,
        from: impl Into<Constant>,
        to: impl Into<Constant>,
    ) -> &mut Self {
        let (from, to) = (from.into(), to.into());
        self.unnamed_method(|method| {
            method.has_constant(from.clone());
            method.transform(|t| {
                t.replace_constant(from, to);
            });
        })
    }

    /// One [`MethodsBuilder::constant_replacement`] per pair.
    pub fn constant_replacements<C>(&mut self, pairs: impl IntoIterator<Item = (C, C)>) -> &mut Self
    where
        C: Into<Constant>,
    {
        for (from, to) in pairs {
            self.constant_replacement(from, to);
        }
        self
    }

    /// Runs `section` if module `id` is enabled; see [`ScannerBuilder::with_module`].
    pub fn with_module<F>(&mut self, id: ModuleId, section: F) -> &mut Self
    where
        F: FnOnce(&Module, &mut MethodsBuilder) -> Result<()>,
    {
        self.scoped(id, section);
        self
    }
}

/// Predicates of one method registration plus its transform block.
///
/// Dereferences to [`MethodMatcher`], so every method predicate can be added directly.
pub struct MethodFinderBuilder {
    registry: Arc<ModuleRegistry>,
    matcher: MethodMatcher,
    transform: Option<TransformBuilder>,
}

impl Deref for MethodFinderBuilder {
    type Target = MethodMatcher;

    fn deref(&self) -> &MethodMatcher {
        &self.matcher
    }
}

impl DerefMut for MethodFinderBuilder {
    fn deref_mut(&mut self) -> &mut MethodMatcher {
        &mut self.matcher
    }
}

impl MethodFinderBuilder {
    /// Adds operations to the transform block of this registration.
    ///
    /// A registration that never calls this is a constraint: the class only matches if some
    /// method satisfies it.
    pub fn transform<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut TransformBuilder),
    {
        let registry = Arc::clone(&self.registry);
        let builder = self
            .transform
            .get_or_insert_with(|| TransformBuilder::new(registry));
        configure(builder);
        self
    }
}
