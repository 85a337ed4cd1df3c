use std::{fmt, sync::Arc};

use crate::{
    classfile::{AccessFlags, Constant, MethodRecord, Type},
    matcher::{MemberMatcher, StringMatch},
};

/// Closure predicate over a method.
pub type MethodFn = Arc<dyn Fn(&MethodRecord) -> bool + Send + Sync>;

/// A single test on a [`MethodRecord`].
#[derive(Clone)]
pub enum MethodPredicate {
    /// Method name equals
    Named(String),
    /// Method descriptor equals
    Descriptor(String),
    /// Method is `<init>`
    IsConstructor,
    /// All of these access flags are set
    Access(AccessFlags),
    /// A string literal loaded by the method matches
    HasString(StringMatch),
    /// The method pushes this constant
    HasConstant(Constant),
    /// The method invokes a method matching the nested matcher
    Calls(MemberMatcher),
    /// The method accesses a field matching the nested matcher
    References(MemberMatcher),
    /// Argument `index` has type `ty`
    Argument {
        /// Zero-based argument position, the receiver not counted
        index: usize,
        /// Expected type
        ty: Type,
    },
    /// The method declares exactly this many arguments
    ArgumentCount(usize),
    /// The method returns `ty`
    Returns(Type),
    /// Arbitrary closure
    Custom(MethodFn),
}

impl MethodPredicate {
    /// Evaluates the predicate.
    #[must_use]
    pub fn test(&self, method: &MethodRecord) -> bool {
        match self {
            MethodPredicate::Named(name) => method.name == *name,
            MethodPredicate::Descriptor(descriptor) => method.descriptor == *descriptor,
            MethodPredicate::IsConstructor => method.is_constructor(),
            MethodPredicate::Access(flags) => method.access.contains(*flags),
            MethodPredicate::HasString(pattern) => {
                method.strings().any(|value| pattern.matches(value))
            }
            MethodPredicate::HasConstant(constant) => {
                method.constants().any(|value| value == *constant)
            }
            MethodPredicate::Calls(matcher) => method.calls().any(|call| matcher.matches(call)),
            MethodPredicate::References(matcher) => {
                method.references().any(|field| matcher.matches(field))
            }
            MethodPredicate::Argument { index, ty } => method.arguments.get(*index) == Some(ty),
            MethodPredicate::ArgumentCount(count) => method.arguments.len() == *count,
            MethodPredicate::Returns(ty) => method.return_type == *ty,
            MethodPredicate::Custom(predicate) => predicate(method),
        }
    }
}

impl fmt::Debug for MethodPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MethodPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodPredicate::Named(name) => write!(f, "named {name}"),
            MethodPredicate::Descriptor(descriptor) => write!(f, "described by {descriptor}"),
            MethodPredicate::IsConstructor => f.write_str("constructor"),
            MethodPredicate::Access(flags) => write!(f, "access {:#06x}", flags.bits()),
            MethodPredicate::HasString(pattern) => write!(f, "strings has {pattern}"),
            MethodPredicate::HasConstant(constant) => write!(f, "constants has {constant}"),
            MethodPredicate::Calls(matcher) => write!(f, "calls ({matcher})"),
            MethodPredicate::References(matcher) => write!(f, "references ({matcher})"),
            MethodPredicate::Argument { index, ty } => write!(f, "arguments[{index}] = {ty}"),
            MethodPredicate::ArgumentCount(count) => write!(f, "{count} arguments"),
            MethodPredicate::Returns(ty) => write!(f, "returns {ty}"),
            MethodPredicate::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Conjunction of [`MethodPredicate`]s, evaluated in insertion order with short-circuit.
///
/// # Examples
///
/// ```rust
/// use classpatch::{
///     assembly::{opcodes, Instruction},
///     classfile::{AccessFlags, MethodRecord, Type},
///     matcher::MethodMatcher,
/// };
///
/// let method = MethodRecord::new(
///     "a",
///     "()Z",
///     AccessFlags::PUBLIC,
///     vec![
///         Instruction::Ldc("LunarPlus".into()),
///         Instruction::invoke_virtual("a/Cape", "isCloth", "(Ljava/lang/String;)Z"),
///         Instruction::Simple(opcodes::IRETURN),
///     ],
/// )?;
///
/// let mut matcher = MethodMatcher::new();
/// matcher.returns(Type::Boolean).has_string("LunarPlus");
/// assert!(matcher.matches(&method));
///
/// matcher.calls(|call| {
///     call.named("isSilk");
/// });
/// assert!(!matcher.matches(&method));
/// # Ok::<(), classpatch::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    predicates: Vec<MethodPredicate>,
}

impl MethodMatcher {
    /// Creates a matcher accepting every method.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate.
    pub fn predicate(&mut self, predicate: MethodPredicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Requires the method name to equal `name`.
    pub fn named(&mut self, name: &str) -> &mut Self {
        self.predicate(MethodPredicate::Named(name.to_string()))
    }

    /// Requires the descriptor to equal `descriptor`.
    pub fn descriptor(&mut self, descriptor: &str) -> &mut Self {
        self.predicate(MethodPredicate::Descriptor(descriptor.to_string()))
    }

    /// Requires the method to be a constructor.
    pub fn constructor(&mut self) -> &mut Self {
        self.predicate(MethodPredicate::IsConstructor)
    }

    /// Requires all of `flags` to be set.
    pub fn access(&mut self, flags: AccessFlags) -> &mut Self {
        self.predicate(MethodPredicate::Access(flags))
    }

    /// Requires a string literal equal to `value`.
    pub fn has_string(&mut self, value: &str) -> &mut Self {
        self.predicate(MethodPredicate::HasString(StringMatch::exact(value)))
    }

    /// Requires a string literal equal to each of `values`.
    pub fn has_strings(&mut self, values: &[&str]) -> &mut Self {
        for value in values {
            self.has_string(value);
        }
        self
    }

    /// Requires a string literal containing `fragment`.
    pub fn has_partial_string(&mut self, fragment: &str) -> &mut Self {
        self.predicate(MethodPredicate::HasString(StringMatch::partial(fragment)))
    }

    /// Requires a load of `constant`, including short push forms.
    pub fn has_constant(&mut self, constant: impl Into<Constant>) -> &mut Self {
        self.predicate(MethodPredicate::HasConstant(constant.into()))
    }

    /// Requires a call to a method matching the nested matcher.
    pub fn calls<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MemberMatcher),
    {
        self.predicate(MethodPredicate::Calls(MemberMatcher::build(configure)))
    }

    /// Requires an access to a field matching the nested matcher.
    pub fn references<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut MemberMatcher),
    {
        self.predicate(MethodPredicate::References(MemberMatcher::build(configure)))
    }

    /// Requires argument `index` to have type `ty`.
    pub fn argument(&mut self, index: usize, ty: Type) -> &mut Self {
        self.predicate(MethodPredicate::Argument { index, ty })
    }

    /// Requires exactly `count` arguments.
    pub fn argument_count(&mut self, count: usize) -> &mut Self {
        self.predicate(MethodPredicate::ArgumentCount(count))
    }

    /// Requires the return type to equal `ty`.
    pub fn returns(&mut self, ty: Type) -> &mut Self {
        self.predicate(MethodPredicate::Returns(ty))
    }

    /// Adds a closure predicate.
    pub fn custom<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&MethodRecord) -> bool + Send + Sync + 'static,
    {
        self.predicate(MethodPredicate::Custom(Arc::new(predicate)))
    }

    /// Returns `true` if every predicate holds for `method`.
    #[must_use]
    pub fn matches(&self, method: &MethodRecord) -> bool {
        self.predicates.iter().all(|predicate| predicate.test(method))
    }

    /// The predicates of this matcher.
    #[must_use]
    pub fn predicates(&self) -> &[MethodPredicate] {
        &self.predicates
    }

    /// Returns `true` if no predicate was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::write_conjunction(f, &self.predicates, "any method")
    }
}
