//! Event logging for class scans.
//!
//! Every scan of a class records what happened to it: which registrations matched, which
//! methods were edited and how, and what failed. Events are collected in an [`EventLog`] that is
//! returned with the [`crate::scanner::ClassReport`]; hosts can inspect it or drop it.
//!
//! # Architecture
//!
//! - [`Event`] - A single recorded event
//! - [`EventLog`] - Append-only, thread-safe collection of events with query helpers
//! - [`EventBuilder`] - Fluent API for creating events, pushed into the log on drop
//!
//! # Example
//!
//! ```rust
//! use classpatch::events::{EventKind, EventLog};
//!
//! let log = EventLog::new();
//!
//! log.record(EventKind::ConstantReplaced)
//!     .class("com/example/Hud")
//!     .at("getText()Ljava/lang/String;", 3)
//!     .message("\"\\u{1} FPS\" -> \"\\u{1} CPS\"");
//! log.warn("nothing to replace");
//!
//! assert_eq!(log.transformation_count(), 1);
//! assert_eq!(log.warnings().count(), 1);
//! ```

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A class satisfied the class-level predicates of a registration.
    ClassMatched,
    /// A method satisfied the predicates of a method registration.
    MethodMatched,
    /// A constant load was replaced.
    ConstantReplaced,
    /// A method body was replaced by an immediate return.
    MethodStubbed,
    /// A method body was replaced by new instructions.
    BodyOverwritten,
    /// Advice was inserted around a call.
    AdviceInserted,
    /// A call was removed or replaced.
    CallReplaced,
    /// Code was inserted before a return.
    ExitInjected,

    /// A transform block failed and its method was left untouched.
    TransformFailed,
    /// A registration has not matched anything so far.
    RegistrationUnmatched,
    /// A module was skipped because of a configuration error.
    ModuleDisabled,

    /// Informational message.
    Info,
    /// Warning (something unexpected but recoverable).
    Warning,
    /// Error (something failed).
    Error,
}

impl EventKind {
    /// Returns a human-readable description of this event kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            // Matching
            Self::ClassMatched => "class matched",
            Self::MethodMatched => "method matched",
            // Transformations
            Self::ConstantReplaced => "constant replaced",
            Self::MethodStubbed => "method stubbed",
            Self::BodyOverwritten => "body overwritten",
            Self::AdviceInserted => "advice inserted",
            Self::CallReplaced => "call replaced",
            Self::ExitInjected => "exit injected",
            // Failures
            Self::TransformFailed => "transform failed",
            Self::RegistrationUnmatched => "registration unmatched",
            Self::ModuleDisabled => "module disabled",
            // Diagnostic
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns true if this event represents an edit of a method body.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::ConstantReplaced
                | Self::MethodStubbed
                | Self::BodyOverwritten
                | Self::AdviceInserted
                | Self::CallReplaced
                | Self::ExitInjected
        )
    }

    /// Returns true if this is a diagnostic event (failure, info, warning or error).
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::TransformFailed
                | Self::RegistrationUnmatched
                | Self::ModuleDisabled
                | Self::Info
                | Self::Warning
                | Self::Error
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single logged event.
#[derive(Debug, Clone)]
pub struct Event {
    /// The type of event.
    pub kind: EventKind,
    /// Internal name of the class concerned (if applicable).
    pub class: Option<String>,
    /// `name + descriptor` of the method concerned (if applicable).
    pub method: Option<String>,
    /// Instruction index within the method.
    pub location: Option<usize>,
    /// Human-readable description.
    pub message: String,
    /// Label of the registration that caused the event (if any).
    pub registration: Option<String>,
}

impl Event {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            class: None,
            method: None,
            location: None,
            message: message.into(),
            registration: None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(class) = &self.class {
            write!(f, " {class}")?;
            if let Some(method) = &self.method {
                write!(f, ".{method}")?;
            }
        }
        write!(f, " {}", self.message)
    }
}

/// Builder for creating events with a fluent API.
///
/// Created by [`EventLog::record`]. The event is automatically added
/// to the log when the builder is dropped.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    kind: EventKind,
    class: Option<String>,
    method: Option<String>,
    location: Option<usize>,
    message: Option<String>,
    registration: Option<String>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            class: None,
            method: None,
            location: None,
            message: None,
            registration: None,
        }
    }

    /// Sets the class the event concerns.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Sets the method and instruction index where the event occurred.
    pub fn at(mut self, method: impl Into<String>, location: usize) -> Self {
        self.method = Some(method.into());
        self.location = Some(location);
        self
    }

    /// Sets only the method (for method-level events without specific location).
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets a custom message describing the event.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Associates this event with a registration.
    pub fn registration(mut self, label: impl Into<String>) -> Self {
        self.registration = Some(label.into());
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        let event = Event {
            kind: self.kind,
            class: self.class.take(),
            method: self.method.take(),
            location: self.location.take(),
            message,
            registration: self.registration.take(),
        };

        self.log.events.push(event);
    }
}

/// Collection of events from scanning.
///
/// This type is thread-safe: events can be appended concurrently from
/// multiple threads using shared references (`&self`).
#[derive(Debug)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        let new_log = Self::new();
        new_log.merge(self);
        new_log
    }
}

impl EventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: boxcar::Vec::new(),
        }
    }

    /// Returns true if no events have been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the total number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts building a new event of the given kind.
    ///
    /// The event is automatically added when the builder is dropped.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Records an informational message.
    pub fn info(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Info, message));
    }

    /// Records a warning message.
    pub fn warn(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Warning, message));
    }

    /// Records an error message.
    pub fn error(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Error, message));
    }

    /// Appends copies of all events of `other`.
    pub fn merge(&self, other: &EventLog) {
        for (_, event) in &other.events {
            self.events.push(event.clone());
        }
    }

    /// Returns true if any event of the given kind exists.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|(_, e)| e.kind == kind)
    }

    /// Counts events of the given kind.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|(_, e)| e.kind == kind).count()
    }

    /// Returns an iterator over all events.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    /// Returns an iterator over events of a specific kind.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter_map(move |(_, e)| if e.kind == kind { Some(e) } else { None })
    }

    /// Returns an iterator over events caused by one registration.
    pub fn filter_registration<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter_map(move |(_, e)| (e.registration.as_deref() == Some(label)).then_some(e))
    }

    /// Returns an iterator over transformation events only.
    pub fn transformations(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter_map(|(_, e)| e.kind.is_transformation().then_some(e))
    }

    /// Returns an iterator over diagnostic events only.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter_map(|(_, e)| e.kind.is_diagnostic().then_some(e))
    }

    /// Returns an iterator over warning events.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Warning)
    }

    /// Returns an iterator over error events.
    pub fn errors(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Error)
    }

    /// Counts events grouped by kind.
    #[must_use]
    pub fn count_by_kind(&self) -> HashMap<EventKind, usize> {
        let mut counts = HashMap::new();
        for (_, event) in &self.events {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Returns the number of transformation events.
    #[must_use]
    pub fn transformation_count(&self) -> usize {
        self.events
            .iter()
            .filter(|(_, e)| e.kind.is_transformation())
            .count()
    }

    /// Returns the number of distinct methods with transformation events.
    #[must_use]
    pub fn methods_affected(&self) -> usize {
        self.events
            .iter()
            .filter(|(_, e)| e.kind.is_transformation())
            .filter_map(|(_, e)| Some((e.class.as_deref()?, e.method.as_deref()?)))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Generates a human-readable summary of all events.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let counts = self.count_by_kind();

        // Only show transformation counts in summary
        let mut parts: Vec<String> = counts
            .iter()
            .filter(|(k, _)| k.is_transformation())
            .map(|(kind, count)| format!("{} {}", count, kind.description()))
            .collect();

        if parts.is_empty() {
            return format!("{} events", self.len());
        }

        parts.sort();
        parts.join(", ")
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = Box<dyn Iterator<Item = &'a Event> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(!log.has(EventKind::ConstantReplaced));
        assert_eq!(log.summary(), "no events");
    }

    #[test]
    fn test_record_event() {
        let log = EventLog::new();

        log.record(EventKind::ConstantReplaced)
            .class("a/B")
            .at("run()V", 4)
            .registration("a/B#run")
            .message("8 -> 2147483647");

        assert_eq!(log.len(), 1);
        let event = log.iter().next().unwrap();
        assert_eq!(event.class.as_deref(), Some("a/B"));
        assert_eq!(event.method.as_deref(), Some("run()V"));
        assert_eq!(event.location, Some(4));
        assert_eq!(event.to_string(), "[constant replaced] a/B.run()V 8 -> 2147483647");
        assert_eq!(log.filter_registration("a/B#run").count(), 1);
    }

    #[test]
    fn test_default_message() {
        let log = EventLog::new();
        log.record(EventKind::MethodStubbed).class("a/B").method("f()Z");
        assert_eq!(log.iter().next().unwrap().message, "method stubbed");
    }

    #[test]
    fn test_info_warn_error() {
        let log = EventLog::new();

        log.info("informational message");
        log.warn("warning message");
        log.error("error message");

        assert_eq!(log.count_kind(EventKind::Info), 1);
        assert_eq!(log.warnings().count(), 1);
        assert_eq!(log.errors().count(), 1);
        assert_eq!(log.diagnostics().count(), 3);
        assert_eq!(log.transformation_count(), 0);
        assert_eq!(log.summary(), "3 events");
    }

    #[test]
    fn test_methods_affected_and_summary() {
        let log = EventLog::new();
        log.record(EventKind::ConstantReplaced).class("a/B").method("f()V");
        log.record(EventKind::ConstantReplaced).class("a/B").method("f()V");
        log.record(EventKind::ExitInjected).class("a/B").method("<init>()V");
        log.record(EventKind::MethodMatched).class("a/B").method("g()V");

        assert_eq!(log.methods_affected(), 2);
        assert_eq!(log.summary(), "1 exit injected, 2 constant replaced");
    }

    #[test]
    fn test_concurrent_append() {
        let log = EventLog::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        log.info("tick");
                    }
                });
            }
        });
        assert_eq!(log.len(), 400);
    }

    #[test]
    fn test_clone_and_merge() {
        let log = EventLog::new();
        log.warn("first");
        let copy = log.clone();
        copy.merge(&log);
        assert_eq!(copy.len(), 2);
        assert_eq!(log.len(), 1);
    }
}
