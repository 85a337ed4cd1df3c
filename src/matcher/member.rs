use std::{fmt, sync::Arc};

use crate::{
    assembly::{FieldRef, MethodRef},
    classfile::FieldRecord,
};

/// Common view of the things a member predicate can inspect: call targets, field references
/// and declared fields.
pub trait Member {
    /// Internal name of the declaring class.
    fn owner(&self) -> &str;
    /// Member name.
    fn name(&self) -> &str;
    /// JVM descriptor.
    fn descriptor(&self) -> &str;
    /// Opcode of the referencing instruction, `None` for declarations.
    fn opcode(&self) -> Option<u8>;
}

impl Member for MethodRef {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn opcode(&self) -> Option<u8> {
        Some(self.opcode)
    }
}

impl Member for FieldRef {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn opcode(&self) -> Option<u8> {
        Some(self.opcode)
    }
}

impl Member for FieldRecord {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn opcode(&self) -> Option<u8> {
        None
    }
}

/// Closure predicate over a member.
pub type MemberFn = Arc<dyn Fn(&dyn Member) -> bool + Send + Sync>;

/// A single test on a [`Member`].
#[derive(Clone)]
pub enum MemberPredicate {
    /// Name equals
    Named(String),
    /// Declaring class equals (internal name)
    Owner(String),
    /// Descriptor equals
    Descriptor(String),
    /// Referencing opcode equals
    Opcode(u8),
    /// Name is `<init>`
    IsConstructor,
    /// Arbitrary closure
    Custom(MemberFn),
}

impl MemberPredicate {
    /// Evaluates the predicate.
    #[must_use]
    pub fn test(&self, member: &dyn Member) -> bool {
        match self {
            MemberPredicate::Named(name) => member.name() == name,
            MemberPredicate::Owner(owner) => member.owner() == owner,
            MemberPredicate::Descriptor(descriptor) => member.descriptor() == descriptor,
            MemberPredicate::Opcode(opcode) => member.opcode() == Some(*opcode),
            MemberPredicate::IsConstructor => member.name() == "<init>",
            MemberPredicate::Custom(predicate) => predicate(member),
        }
    }
}

impl fmt::Debug for MemberPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MemberPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberPredicate::Named(name) => write!(f, "named {name}"),
            MemberPredicate::Owner(owner) => write!(f, "owned by {owner}"),
            MemberPredicate::Descriptor(descriptor) => write!(f, "described by {descriptor}"),
            MemberPredicate::Opcode(opcode) => {
                write!(f, "via {}", crate::assembly::opcodes::mnemonic(*opcode))
            }
            MemberPredicate::IsConstructor => f.write_str("constructor"),
            MemberPredicate::Custom(_) => f.write_str("custom"),
        }
    }
}

/// Conjunction of [`MemberPredicate`]s. An empty matcher matches every member.
///
/// # Examples
///
/// ```rust
/// use classpatch::{assembly::Instruction, matcher::MemberMatcher};
///
/// let mut matcher = MemberMatcher::new();
/// matcher.named("create").owner("java/net/URI");
///
/// let call = Instruction::invoke_static("java/net/URI", "create", "(Ljava/lang/String;)Ljava/net/URI;");
/// assert!(matcher.matches(call.as_method().unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemberMatcher {
    predicates: Vec<MemberPredicate>,
}

impl MemberMatcher {
    /// Creates a matcher accepting every member.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a matcher with a closure, the way nested `calls` and `references` blocks do.
    #[must_use]
    pub fn build<F>(configure: F) -> Self
    where
        F: FnOnce(&mut MemberMatcher),
    {
        let mut matcher = Self::new();
        configure(&mut matcher);
        matcher
    }

    /// Adds a predicate.
    pub fn predicate(&mut self, predicate: MemberPredicate) -> &mut Self {
        self.predicates.push(predicate);
        self
    }

    /// Requires the member name to equal `name`.
    pub fn named(&mut self, name: &str) -> &mut Self {
        self.predicate(MemberPredicate::Named(name.to_string()))
    }

    /// Requires the declaring class to equal `owner` (dotted names are accepted).
    pub fn owner(&mut self, owner: &str) -> &mut Self {
        self.predicate(MemberPredicate::Owner(owner.replace('.', "/")))
    }

    /// Requires the descriptor to equal `descriptor`.
    pub fn descriptor(&mut self, descriptor: &str) -> &mut Self {
        self.predicate(MemberPredicate::Descriptor(descriptor.to_string()))
    }

    /// Requires the referencing instruction to use `opcode`.
    pub fn opcode(&mut self, opcode: u8) -> &mut Self {
        self.predicate(MemberPredicate::Opcode(opcode))
    }

    /// Requires the member to be a constructor.
    pub fn constructor(&mut self) -> &mut Self {
        self.predicate(MemberPredicate::IsConstructor)
    }

    /// Adds a closure predicate.
    pub fn custom<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&dyn Member) -> bool + Send + Sync + 'static,
    {
        self.predicate(MemberPredicate::Custom(Arc::new(predicate)))
    }

    /// Returns `true` if every predicate holds for `member`.
    #[must_use]
    pub fn matches(&self, member: &dyn Member) -> bool {
        self.predicates.iter().all(|predicate| predicate.test(member))
    }

    /// The predicates of this matcher.
    #[must_use]
    pub fn predicates(&self) -> &[MemberPredicate] {
        &self.predicates
    }
}

impl fmt::Display for MemberMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::write_conjunction(f, &self.predicates, "any member")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assembly::opcodes, classfile::AccessFlags};

    #[test]
    fn test_empty_matches_everything() {
        let field = FieldRef::new(opcodes::GETFIELD, "a/B", "x", "I");
        assert!(MemberMatcher::new().matches(&field));
    }

    #[test]
    fn test_conjunction() {
        let matcher = MemberMatcher::build(|m| {
            m.constructor().owner("java.net.URI");
        });
        let init = MethodRef::new(
            opcodes::INVOKESPECIAL,
            "java/net/URI",
            "<init>",
            "(Ljava/lang/String;)V",
        );
        let other_init = MethodRef::new(opcodes::INVOKESPECIAL, "java/io/File", "<init>", "()V");
        assert!(matcher.matches(&init));
        assert!(!matcher.matches(&other_init));
        assert_eq!(matcher.to_string(), "constructor and owned by java/net/URI");
    }

    #[test]
    fn test_custom_and_declarations() {
        let matcher = MemberMatcher::build(|m| {
            m.custom(|member| member.name().starts_with("LEGACY"));
        });
        let declared =
            FieldRecord::new("a/B", "LEGACY_COMBAT", "Z", AccessFlags::STATIC).unwrap();
        assert!(matcher.matches(&declared));
        assert_eq!(declared.opcode(), None);
    }
}
