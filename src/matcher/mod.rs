//! Composable predicates over classes, methods and members.
//!
//! Matchers locate code in an application whose names are obfuscated and change between
//! versions. Instead of names they rely on content: string literals, constants, the calls a
//! method makes and the fields it touches, the shape of its signature. Each matcher is a
//! conjunction of tagged predicates that can be inspected and printed, plus a `Custom` closure
//! variant for tests that do not fit a predefined shape.
//!
//! Predicates never mutate what they inspect, so a matcher gives the same answer no matter in
//! which order its predicates are evaluated or how often it is asked.
//!
//! # Key Components
//!
//! - [`ClassMatcher`] / [`ClassPredicate`] - Tests on a [`crate::classfile::ClassRecord`]
//! - [`MethodMatcher`] / [`MethodPredicate`] - Tests on a [`crate::classfile::MethodRecord`]
//! - [`MemberMatcher`] / [`MemberPredicate`] - Tests on call targets and field references
//! - [`StringMatch`] - Exact or partial string comparison

mod class;
mod member;
mod method;

use std::fmt;

pub use class::{ClassFn, ClassMatcher, ClassPredicate};
pub use member::{Member, MemberFn, MemberMatcher, MemberPredicate};
pub use method::{MethodFn, MethodMatcher, MethodPredicate};

/// Package prefix of the host application's own classes.
pub const HOST_PACKAGE: &str = "com/moonsworth/lunar/";

/// Package prefix of the platform classes the host application builds on.
pub const PLATFORM_PACKAGE: &str = "net/minecraft/";

/// Exact or partial comparison against a string literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StringMatch {
    /// The literal equals the value
    Exact(String),
    /// The literal contains the value
    Partial(String),
}

impl StringMatch {
    /// Matches literals equal to `value`.
    #[must_use]
    pub fn exact(value: &str) -> Self {
        StringMatch::Exact(value.to_string())
    }

    /// Matches literals containing `fragment`.
    #[must_use]
    pub fn partial(fragment: &str) -> Self {
        StringMatch::Partial(fragment.to_string())
    }

    /// Tests `literal`.
    #[must_use]
    pub fn matches(&self, literal: &str) -> bool {
        match self {
            StringMatch::Exact(value) => literal == value,
            StringMatch::Partial(fragment) => literal.contains(fragment.as_str()),
        }
    }
}

impl fmt::Display for StringMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringMatch::Exact(value) => write!(f, "\"{}\"", value.escape_debug()),
            StringMatch::Partial(fragment) => write!(f, "partial \"{}\"", fragment.escape_debug()),
        }
    }
}

fn write_conjunction<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    predicates: &[T],
    empty: &str,
) -> fmt::Result {
    if predicates.is_empty() {
        return f.write_str(empty);
    }
    for (index, predicate) in predicates.iter().enumerate() {
        if index > 0 {
            f.write_str(" and ")?;
        }
        write!(f, "{predicate}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_match() {
        assert!(StringMatch::exact("CPS").matches("CPS"));
        assert!(!StringMatch::exact("CPS").matches("[16 CPS]"));
        assert!(StringMatch::partial("CPS").matches("[16 CPS]"));
        assert_eq!(StringMatch::partial("\u{1} FPS").to_string(), "partial \"\\u{1} FPS\"");
    }
}
