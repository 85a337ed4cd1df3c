use std::{fmt, sync::Arc};

use crate::{
    classfile::{ClassRecord, Constant},
    matcher::{MemberMatcher, MethodMatcher, StringMatch, HOST_PACKAGE, PLATFORM_PACKAGE},
};

/// Closure predicate over a class.
pub type ClassFn = Arc<dyn Fn(&ClassRecord) -> bool + Send + Sync>;

/// A single test on a [`ClassRecord`].
#[derive(Clone)]
pub enum ClassPredicate {
    /// Internal name equals
    Named(String),
    /// Internal name starts with this package prefix
    InPackage(String),
    /// A string in the constant pool matches
    HasString(StringMatch),
    /// The constant pool contains this constant
    HasConstant(Constant),
    /// Superclass or a directly implemented interface equals
    Extends(String),
    /// The class is an enum
    IsEnum,
    /// The class is an interface
    IsInterface,
    /// Some declared method satisfies the matcher
    HasMethod(MethodMatcher),
    /// Some declared field satisfies the matcher
    HasField(MemberMatcher),
    /// Arbitrary closure
    Custom(ClassFn),
}

impl ClassPredicate {
    /// Evaluates the predicate.
    #[must_use]
    pub fn test(&self, class: &ClassRecord) -> bool {
        match self {
            ClassPredicate::Named(name) => class.name == *name,
            ClassPredicate::InPackage(prefix) => class.name.starts_with(prefix.as_str()),
            ClassPredicate::HasString(pattern) => class.strings().any(|value| pattern.matches(value)),
            ClassPredicate::HasConstant(constant) => class.constant_pool.contains(constant),
            ClassPredicate::Extends(name) => {
                class.super_name.as_deref() == Some(name.as_str())
                    || class.interfaces.iter().any(|interface| interface == name)
            }
            ClassPredicate::IsEnum => class.is_enum(),
            ClassPredicate::IsInterface => class.is_interface(),
            ClassPredicate::HasMethod(matcher) => {
                class.methods.iter().any(|method| matcher.matches(method))
            }
            ClassPredicate::HasField(matcher) => {
                class.fields.iter().any(|field| matcher.matches(field))
            }
            ClassPredicate::Custom(predicate) => predicate(class),
        }
    }
}

impl fmt::Debug for ClassPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ClassPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassPredicate::Named(name) => write!(f, "named {name}"),
            ClassPredicate::InPackage(prefix) => write!(f, "in {prefix}"),
            ClassPredicate::HasString(pattern) => write!(f, "strings has {pattern}"),
            ClassPredicate::HasConstant(constant) => write!(f, "constants has {constant}"),
            ClassPredicate::Extends(name) => write!(f, "extends {name}"),
            ClassPredicate::IsEnum => f.write_str("enum"),
            ClassPredicate::IsInterface => f.write_str("interface"),
            ClassPredicate::HasMethod(matcher) => write!(f, "has method ({matcher})"),
            ClassPredicate::HasField(matcher) => write!(f, "has field ({matcher})"),
            ClassPredicate::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Conjunction of [`ClassPredicate`]s, evaluated in insertion order with short-circuit.
///
/// Names are accepted in dotted or internal form and stored internally as `a/b/C`.
///
/// # Examples
///
/// ```rust
/// use classpatch::{classfile::ClassBuilder, matcher::ClassMatcher};
///
/// let class = ClassBuilder::new("com.moonsworth.lunar.Sprint")
///     .enumeration()
///     .string_constant("settings")
///     .string_constant("flying")
///     .build()?;
///
/// let mut matcher = ClassMatcher::new();
/// matcher
///     .in_package("com/moonsworth/lunar/")
///     .is_enum()
///     .has_string("settings")
///     .has_string("flying");
/// assert!(matcher.matches(&class));
/// # Ok::<(), classpatch::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClassMatcher {
    predicates: Vec<ClassPredicate>,
}

impl ClassMatcher {
    /// Creates a matcher accepting every class.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate.
    pub fn predicate(&mut self, predicate: ClassPredicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Requires the class to be named `name`.
    pub fn named(&mut self, name: &str) -> &mut Self {
        self.predicate(ClassPredicate::Named(name.replace('.', "/")))
    }

    /// Requires the class name to start with `prefix`.
    pub fn in_package(&mut self, prefix: &str) -> &mut Self {
        self.predicate(ClassPredicate::InPackage(prefix.replace('.', "/")))
    }

    /// Requires a constant pool string equal to `value`.
    pub fn has_string(&mut self, value: &str) -> &mut Self {
        self.predicate(ClassPredicate::HasString(StringMatch::exact(value)))
    }

    /// Requires a constant pool string containing `fragment`.
    pub fn has_partial_string(&mut self, fragment: &str) -> &mut Self {
        self.predicate(ClassPredicate::HasString(StringMatch::partial(fragment)))
    }

    /// Requires the class to belong to the host application ([`HOST_PACKAGE`]).
    pub fn is_host_class(&mut self) -> &mut Self {
        self.in_package(HOST_PACKAGE)
    }

    /// Requires the class to belong to the platform the host builds on ([`PLATFORM_PACKAGE`]).
    pub fn is_platform_class(&mut self) -> &mut Self {
        self.in_package(PLATFORM_PACKAGE)
    }

    /// Requires `constant` in the constant pool.
    pub fn has_constant(&mut self, constant: impl Into<Constant>) -> &mut Self {
        self.predicate(ClassPredicate::HasConstant(constant.into()))
    }

    /// Requires `name` as superclass or directly implemented interface.
    pub fn extends(&mut self, name: &str) -> &mut Self {
        self.predicate(ClassPredicate::Extends(name.replace('.', "/")))
    }

    /// Requires the class to be an enum.
    pub fn is_enum(&mut self) -> &mut Self {
        self.predicate(ClassPredicate::IsEnum)
    }

    /// Requires the class to be an interface.
    pub fn is_interface(&mut self) -> &mut Self {
        self.predicate(ClassPredicate::IsInterface)
    }

    /// Requires a declared method matching the nested matcher.
    pub fn has_method<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MethodMatcher),
    {
        let mut matcher = MethodMatcher::new();
        configure(&mut matcher);
        self.predicate(ClassPredicate::HasMethod(matcher))
    }

    /// Requires a declared field matching the nested matcher.
    pub fn has_field<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MemberMatcher),
    {
        self.predicate(ClassPredicate::HasField(MemberMatcher::build(configure)))
    }

    /// Adds a closure predicate.
    pub fn custom<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&ClassRecord) -> bool + Send + Sync + 'static,
    {
        self.predicate(ClassPredicate::Custom(Arc::new(predicate)))
    }

    /// Returns `true` if every predicate holds for `class`.
    #[must_use]
    pub fn matches(&self, class: &ClassRecord) -> bool {
        self.predicates.iter().all(|predicate| predicate.test(class))
    }

    /// The predicates of this matcher.
    #[must_use]
    pub fn predicates(&self) -> &[ClassPredicate] {
        &self.predicates
    }

    /// Drops every predicate added after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.predicates.truncate(len);
    }
}

impl fmt::Display for ClassMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::write_conjunction(f, &self.predicates, "any class")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::ClassBuilder,
        test::factories::{fps_mod_class, websocket_class},
    };

    #[test]
    fn test_strings_and_package() {
        let class = fps_mod_class();

        let mut matcher = ClassMatcher::new();
        matcher.is_host_class().has_string("[1466 FPS]");
        assert!(matcher.matches(&class));

        matcher.has_string("[16 CPS]");
        assert!(!matcher.matches(&class));
    }

    #[test]
    fn test_extends_checks_interfaces() {
        let class = websocket_class();
        let mut matcher = ClassMatcher::new();
        matcher.extends("org.java_websocket.client.WebSocketClient");
        assert!(matcher.matches(&class));

        let runnable = ClassBuilder::new("a/Task")
            .implements("java/lang/Runnable")
            .build()
            .unwrap();
        let mut matcher = ClassMatcher::new();
        matcher.extends("java/lang/Runnable");
        assert!(matcher.matches(&runnable));
        assert!(!matcher.matches(&class));
    }

    #[test]
    fn test_enum_detection() {
        let plain = ClassBuilder::new("a/Plain").build().unwrap();
        let stripped = ClassBuilder::new("a/Stripped")
            .extends("java/lang/Enum")
            .build()
            .unwrap();
        let mut matcher = ClassMatcher::new();
        matcher.is_enum();
        assert!(!matcher.matches(&plain));
        assert!(matcher.matches(&stripped));
    }

    #[test]
    fn test_has_method_and_field() {
        let class = websocket_class();
        let mut matcher = ClassMatcher::new();
        matcher
            .has_method(|method| {
                method.constructor().has_string("Assets");
            })
            .has_field(|field| {
                field.descriptor("Ljava/util/Map;");
            });
        assert!(matcher.matches(&class));
    }

    #[test]
    fn test_evaluation_order_is_irrelevant() {
        let class = fps_mod_class();
        let predicates = [
            ClassPredicate::InPackage("com/moonsworth/lunar/".into()),
            ClassPredicate::HasString(StringMatch::exact("[1466 FPS]")),
            ClassPredicate::IsEnum,
        ];
        let forward = predicates
            .iter()
            .fold(ClassMatcher::new(), |mut matcher, predicate| {
                matcher.predicate(predicate.clone());
                matcher
            });
        let backward = predicates
            .iter()
            .rev()
            .fold(ClassMatcher::new(), |mut matcher, predicate| {
                matcher.predicate(predicate.clone());
                matcher
            });
        assert_eq!(forward.matches(&class), backward.matches(&class));
        assert!(!forward.matches(&class));
    }
}
