use std::{fmt, sync::Arc};

use crate::{
    assembly::{opcodes, Fragment, FragmentBuilder, Instruction, Label, MethodRef},
    classfile::{ClassRecord, Constant, MethodRecord, Type},
    events::EventKind,
    matcher::MemberMatcher,
    transform::TransformContext,
    Error, Result,
};

/// Closure producing a fragment from the state of the method being edited.
///
/// The builder handed to the closure already knows how many slots the fragment may consume at
/// its splice point (the call arguments for advice placed before a call, the return value for
/// advice placed after it, nothing elsewhere).
pub type LazyFragment =
    Arc<dyn Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync>;

/// Where the instructions of a fragment come from.
#[derive(Clone)]
pub enum FragmentSource {
    /// Fixed instructions, known when the registration is built
    Static(Fragment),
    /// Built at application time
    Lazy(LazyFragment),
}

impl FragmentSource {
    /// Wraps a closure building the fragment at application time.
    pub fn lazy<F>(build: F) -> Self
    where
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        FragmentSource::Lazy(Arc::new(build))
    }

    /// Produces the fragment for one splice point.
    ///
    /// # Errors
    ///
    /// Propagates errors from the closure and from [`FragmentBuilder::build`].
    pub fn resolve(&self, context: &TransformContext<'_>, available: u16) -> Result<Fragment> {
        match self {
            FragmentSource::Static(fragment) => Ok(fragment.clone()),
            FragmentSource::Lazy(build) => {
                let mut builder = FragmentBuilder::consuming(available);
                build(context, &mut builder)?;
                builder.build()
            }
        }
    }
}

impl From<Fragment> for FragmentSource {
    fn from(fragment: Fragment) -> Self {
        FragmentSource::Static(fragment)
    }
}

impl From<Vec<Instruction>> for FragmentSource {
    fn from(instructions: Vec<Instruction>) -> Self {
        FragmentSource::Static(Fragment::new(instructions))
    }
}

impl fmt::Debug for FragmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentSource::Static(fragment) => f
                .debug_tuple("Static")
                .field(&fragment.instructions().len())
                .finish(),
            FragmentSource::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// One edit of a method body.
#[derive(Debug, Clone)]
pub enum TransformOp {
    /// Replaces every push of `from` with a push of `to`
    ReplaceConstant {
        /// Constant to look for
        from: Constant,
        /// Replacement of the same category
        to: Constant,
    },
    /// Substring replacement inside every string literal
    ReplaceString {
        /// Substring to look for
        from: String,
        /// Replacement text
        to: String,
    },
    /// Replaces the body with an immediate return of `value`, or of the default value
    Stub {
        /// Value to return, `None` for `0`/`null`/`false`/`void`
        value: Option<Constant>,
    },
    /// Replaces the body with the fragment
    Overwrite(FragmentSource),
    /// Inserts fragments around every call matching `matcher`
    CallAdvice {
        /// Selects the calls
        matcher: MemberMatcher,
        /// Inserted before the call, may consume its arguments
        before: Option<FragmentSource>,
        /// Inserted after the call, may consume its result
        after: Option<FragmentSource>,
    },
    /// Removes every call matching `matcher`, optionally substituting a fragment
    ReplaceCall {
        /// Selects the calls
        matcher: MemberMatcher,
        /// Substitute; without one the consumed arguments are popped
        replacement: Option<FragmentSource>,
    },
    /// Inserts the fragment before every return instruction
    MethodExit(FragmentSource),
}

/// Outcome of applying one [`TransformOp`].
#[derive(Debug, Clone)]
pub struct Applied {
    /// Event describing the edit
    pub kind: EventKind,
    /// Number of sites edited
    pub sites: usize,
    /// Human-readable detail
    pub detail: String,
}

impl TransformOp {
    /// Creates a [`TransformOp::ReplaceConstant`], rejecting category changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConstantTypeMismatch`] if `from` and `to` are of different kinds.
    pub fn replace_constant(from: impl Into<Constant>, to: impl Into<Constant>) -> Result<Self> {
        let (from, to) = (from.into(), to.into());
        if from.kind() != to.kind() {
            return Err(Error::ConstantTypeMismatch {
                from: from.kind(),
                to: to.kind(),
            });
        }
        Ok(TransformOp::ReplaceConstant { from, to })
    }

    /// Short name of the operation.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TransformOp::ReplaceConstant { .. } => "replaceConstant",
            TransformOp::ReplaceString { .. } => "replaceString",
            TransformOp::Stub { .. } => "stub",
            TransformOp::Overwrite(_) => "overwrite",
            TransformOp::CallAdvice { .. } => "callAdvice",
            TransformOp::ReplaceCall { .. } => "replaceCall",
            TransformOp::MethodExit(_) => "methodExit",
        }
    }

    /// Applies the operation to `method`, which must be a working copy: on error it may be
    /// left half edited.
    ///
    /// # Errors
    ///
    /// - [`Error::InstructionNotFound`] if a call, return or fragment target is missing
    /// - [`Error::StackImbalance`] if a fragment's effect differs from its declaration
    /// - [`Error::ConstantTypeMismatch`] for a category-changing replacement
    pub fn apply(
        &self,
        class: &ClassRecord,
        method: &mut MethodRecord,
        registration: &str,
    ) -> Result<Applied> {
        match self {
            TransformOp::ReplaceConstant { from, to } => replace_constant(method, from, to),
            TransformOp::ReplaceString { from, to } => Ok(replace_string(method, from, to)),
            TransformOp::Stub { value } => stub(method, value.as_ref()),
            TransformOp::Overwrite(source) => {
                let fragment =
                    source.resolve(&TransformContext::new(class, method, registration), 0)?;
                method.instructions = fragment.relabeled(0);
                method.try_catch.clear();
                Ok(Applied {
                    kind: EventKind::BodyOverwritten,
                    sites: 1,
                    detail: format!("{} instructions", method.instructions.len()),
                })
            }
            TransformOp::CallAdvice {
                matcher,
                before,
                after,
            } => call_advice(
                class,
                method,
                registration,
                matcher,
                before.as_ref(),
                after.as_ref(),
            ),
            TransformOp::ReplaceCall {
                matcher,
                replacement,
            } => replace_call(class, method, registration, matcher, replacement.as_ref()),
            TransformOp::MethodExit(source) => method_exit(class, method, registration, source),
        }
    }
}

fn replace_constant(method: &mut MethodRecord, from: &Constant, to: &Constant) -> Result<Applied> {
    if from.kind() != to.kind() {
        return Err(Error::ConstantTypeMismatch {
            from: from.kind(),
            to: to.kind(),
        });
    }
    if from == to {
        return Ok(Applied {
            kind: EventKind::ConstantReplaced,
            sites: 0,
            detail: format!("{from} is unchanged"),
        });
    }

    let mut sites = 0;
    for insn in &mut method.instructions {
        if insn.constant_value().as_ref() == Some(from) {
            *insn = Instruction::load_constant(to);
            sites += 1;
        }
    }
    Ok(Applied {
        kind: EventKind::ConstantReplaced,
        sites,
        detail: format!("{from} -> {to}"),
    })
}

fn replace_string(method: &mut MethodRecord, from: &str, to: &str) -> Applied {
    let mut sites = 0;
    if from != to && !from.is_empty() {
        for insn in &mut method.instructions {
            if let Instruction::Ldc(Constant::String(value)) = insn {
                if value.contains(from) {
                    *value = value.replace(from, to);
                    sites += 1;
                }
            }
        }
    }
    Applied {
        kind: EventKind::ConstantReplaced,
        sites,
        detail: format!(
            "\"{}\" -> \"{}\" in string literals",
            from.escape_debug(),
            to.escape_debug()
        ),
    }
}

fn default_value(ty: &Type) -> Option<Instruction> {
    match ty {
        Type::Void => None,
        Type::Long => Some(Instruction::Simple(opcodes::LCONST_0)),
        Type::Float => Some(Instruction::Simple(opcodes::FCONST_0)),
        Type::Double => Some(Instruction::Simple(opcodes::DCONST_0)),
        Type::Object(_) | Type::Array(_) => Some(Instruction::Simple(opcodes::ACONST_NULL)),
        Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => {
            Some(Instruction::Simple(opcodes::ICONST_0))
        }
    }
}

fn stub(method: &mut MethodRecord, value: Option<&Constant>) -> Result<Applied> {
    let ty = method.return_type.clone();
    let push = match value {
        Some(constant) if ty.accepts(constant) => Some(Instruction::load_constant(constant)),
        Some(constant) => {
            return Err(malformed_error!(
                "{} cannot return {}",
                method.signature(),
                constant
            ))
        }
        None => default_value(&ty),
    };

    method.instructions = push
        .into_iter()
        .chain(std::iter::once(Instruction::Simple(ty.return_opcode())))
        .collect();
    method.try_catch.clear();

    let detail = match value {
        Some(constant) => format!("returns {constant}"),
        None if ty == Type::Void => "returns immediately".to_string(),
        None => format!("returns default {ty}"),
    };
    Ok(Applied {
        kind: EventKind::MethodStubbed,
        sites: 1,
        detail,
    })
}

/// Hands out label numbers above every label already used by the method.
struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    fn new(instructions: &[Instruction]) -> Self {
        let next = instructions
            .iter()
            .flat_map(|insn| match insn {
                Instruction::Label(label) | Instruction::LineNumber { start: label, .. } => {
                    vec![*label]
                }
                other => other.targets(),
            })
            .map(|Label(n)| n + 1)
            .max()
            .unwrap_or(0);
        LabelAllocator { next }
    }

    /// Relabels `fragment` into a fresh range.
    fn splice(&mut self, fragment: &Fragment) -> Vec<Instruction> {
        let offset = self.next;
        let used = fragment
            .instructions()
            .iter()
            .filter_map(|insn| match insn {
                Instruction::Label(Label(n)) => Some(n + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        self.next += used;
        fragment.relabeled(offset)
    }
}

/// Checks the computed effect against the declared one.
fn check_delta(method: &MethodRecord, fragment: &Fragment, site: &str) -> Result<()> {
    let effect = fragment.net_effect()?;
    if effect != fragment.declared_delta() {
        return Err(Error::StackImbalance {
            method: method.signature(),
            message: format!(
                "fragment {site} has net effect {effect}, declared {}",
                fragment.declared_delta()
            ),
        });
    }
    Ok(())
}

fn matching_calls(method: &MethodRecord, matcher: &MemberMatcher) -> Vec<(usize, MethodRef)> {
    method
        .instructions
        .iter()
        .enumerate()
        .filter_map(|(index, insn)| insn.as_method().map(|call| (index, call)))
        .filter(|(_, call)| matcher.matches(*call))
        .map(|(index, call)| (index, call.clone()))
        .collect()
}

fn call_advice(
    class: &ClassRecord,
    method: &mut MethodRecord,
    registration: &str,
    matcher: &MemberMatcher,
    before: Option<&FragmentSource>,
    after: Option<&FragmentSource>,
) -> Result<Applied> {
    let calls = matching_calls(method, matcher);
    if calls.is_empty() {
        return Err(Error::InstructionNotFound {
            registration: registration.to_string(),
            target: format!("call ({matcher})"),
        });
    }

    // fragments see the body before any advice of this operation is inserted
    let mut inserts: Vec<(usize, Option<Fragment>, Option<Fragment>)> = Vec::new();
    {
        let context = TransformContext::new(class, method, registration);
        for (index, call) in &calls {
            let before = before
                .map(|source| source.resolve(&context, call.consumed_slots()?))
                .transpose()?;
            let after = after
                .map(|source| source.resolve(&context, call.produced_slots()?))
                .transpose()?;
            if let Some(fragment) = &before {
                check_delta(method, fragment, &format!("before {call}"))?;
            }
            if let Some(fragment) = &after {
                check_delta(method, fragment, &format!("after {call}"))?;
            }
            inserts.push((*index, before, after));
        }
    }

    let mut labels = LabelAllocator::new(&method.instructions);
    let original = std::mem::take(&mut method.instructions);
    let mut pending = inserts.into_iter().peekable();
    for (index, insn) in original.into_iter().enumerate() {
        match pending.next_if(|(site, _, _)| *site == index) {
            Some((_, before, after)) => {
                if let Some(fragment) = before {
                    method.instructions.extend(labels.splice(&fragment));
                }
                method.instructions.push(insn);
                if let Some(fragment) = after {
                    method.instructions.extend(labels.splice(&fragment));
                }
            }
            None => method.instructions.push(insn),
        }
    }

    Ok(Applied {
        kind: EventKind::AdviceInserted,
        sites: calls.len(),
        detail: format!("around {}", calls[0].1),
    })
}

/// Pops the receiver and arguments a call would have consumed.
fn discard_arguments(call: &MethodRef) -> Result<Vec<Instruction>> {
    let descriptor = crate::classfile::MethodDescriptor::parse(&call.descriptor)?;
    let mut pops: Vec<Instruction> = descriptor
        .arguments
        .iter()
        .rev()
        .map(|ty| {
            Instruction::Simple(if ty.size() == 2 {
                opcodes::POP2
            } else {
                opcodes::POP
            })
        })
        .collect();
    if !call.is_static() {
        pops.push(Instruction::Simple(opcodes::POP));
    }
    Ok(pops)
}

fn replace_call(
    class: &ClassRecord,
    method: &mut MethodRecord,
    registration: &str,
    matcher: &MemberMatcher,
    replacement: Option<&FragmentSource>,
) -> Result<Applied> {
    let calls = matching_calls(method, matcher);
    if calls.is_empty() {
        return Err(Error::InstructionNotFound {
            registration: registration.to_string(),
            target: format!("call ({matcher})"),
        });
    }

    // a replacement owns the whole effect of the call, so no delta check here
    let mut substitutes: Vec<(usize, Fragment)> = Vec::new();
    {
        let context = TransformContext::new(class, method, registration);
        for (index, call) in &calls {
            let fragment = match replacement {
                Some(source) => source.resolve(&context, call.consumed_slots()?)?,
                None => Fragment::new(discard_arguments(call)?),
            };
            substitutes.push((*index, fragment));
        }
    }

    let mut labels = LabelAllocator::new(&method.instructions);
    let original = std::mem::take(&mut method.instructions);
    let mut pending = substitutes.into_iter().peekable();
    for (index, insn) in original.into_iter().enumerate() {
        match pending.next_if(|(site, _)| *site == index) {
            Some((_, fragment)) => method.instructions.extend(labels.splice(&fragment)),
            None => method.instructions.push(insn),
        }
    }

    Ok(Applied {
        kind: EventKind::CallReplaced,
        sites: calls.len(),
        detail: format!("{}", calls[0].1),
    })
}

fn method_exit(
    class: &ClassRecord,
    method: &mut MethodRecord,
    registration: &str,
    source: &FragmentSource,
) -> Result<Applied> {
    let exits: Vec<usize> = method
        .instructions
        .iter()
        .enumerate()
        .filter(|(_, insn)| insn.is_return())
        .map(|(index, _)| index)
        .collect();
    if exits.is_empty() {
        return Err(Error::InstructionNotFound {
            registration: registration.to_string(),
            target: "return instruction".to_string(),
        });
    }

    let fragment = source.resolve(&TransformContext::new(class, method, registration), 0)?;
    check_delta(method, &fragment, "at method exit")?;

    let mut labels = LabelAllocator::new(&method.instructions);
    let original = std::mem::take(&mut method.instructions);
    for insn in original {
        if insn.is_return() {
            method.instructions.extend(labels.splice(&fragment));
        }
        method.instructions.push(insn);
    }

    Ok(Applied {
        kind: EventKind::ExitInjected,
        sites: exits.len(),
        detail: format!("{} instructions per exit", fragment.instructions().len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::analyze_stack,
        classfile::{AccessFlags, ClassBuilder, ConstantKind},
    };

    fn host() -> ClassRecord {
        ClassBuilder::new("a/Host").build().unwrap()
    }

    fn method(descriptor: &str, instructions: Vec<Instruction>) -> MethodRecord {
        MethodRecord::new("m", descriptor, AccessFlags::PUBLIC, instructions).unwrap()
    }

    #[test]
    fn test_replace_constant_rejects_kind_change() {
        let result = TransformOp::replace_constant(8, 8i64);
        assert!(matches!(
            result,
            Err(Error::ConstantTypeMismatch {
                from: ConstantKind::Int,
                to: ConstantKind::Long
            })
        ));
    }

    #[test]
    fn test_replace_constant_short_forms() {
        let mut m = method(
            "()I",
            vec![
                Instruction::Int {
                    opcode: opcodes::BIPUSH,
                    operand: 8,
                },
                Instruction::Simple(opcodes::IRETURN),
            ],
        );
        let op = TransformOp::replace_constant(8, i32::MAX).unwrap();
        let applied = op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(applied.sites, 1);
        assert_eq!(m.instructions[0], Instruction::Ldc(Constant::Int(i32::MAX)));
    }

    #[test]
    fn test_replace_constant_identity_is_untouched() {
        let body = vec![
            Instruction::Simple(opcodes::ICONST_1),
            Instruction::Simple(opcodes::IRETURN),
        ];
        let mut m = method("()I", body.clone());
        let op = TransformOp::replace_constant(1, 1).unwrap();
        assert_eq!(op.apply(&host(), &mut m, "r").unwrap().sites, 0);
        assert_eq!(m.instructions, body);
    }

    #[test]
    fn test_replace_string_substring() {
        let mut m = method(
            "()Ljava/lang/String;",
            vec![
                Instruction::Ldc("\u{1} FPS".into()),
                Instruction::Simple(opcodes::ARETURN),
            ],
        );
        let op = TransformOp::ReplaceString {
            from: "FPS".into(),
            to: "CPS".into(),
        };
        op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(m.instructions[0], Instruction::Ldc("\u{1} CPS".into()));
    }

    #[test]
    fn test_stub_defaults() {
        let mut m = method(
            "()Z",
            vec![
                Instruction::var(opcodes::ALOAD, 0),
                Instruction::Simple(opcodes::POP),
                Instruction::Simple(opcodes::ICONST_0),
                Instruction::Simple(opcodes::IRETURN),
            ],
        );
        TransformOp::Stub {
            value: Some(true.into()),
        }
        .apply(&host(), &mut m, "r")
        .unwrap();
        assert_eq!(
            m.instructions,
            vec![
                Instruction::Simple(opcodes::ICONST_1),
                Instruction::Simple(opcodes::IRETURN)
            ]
        );

        let mut v = method("()V", vec![Instruction::Simple(opcodes::RETURN)]);
        TransformOp::Stub { value: None }
            .apply(&host(), &mut v, "r")
            .unwrap();
        assert_eq!(v.instructions, vec![Instruction::Simple(opcodes::RETURN)]);

        let mut wrong = method("()V", vec![Instruction::Simple(opcodes::RETURN)]);
        assert!(TransformOp::Stub {
            value: Some(1.into())
        }
        .apply(&host(), &mut wrong, "r")
        .is_err());
    }

    #[test]
    fn test_call_advice_before() {
        let mut m = method(
            "()Ljava/net/URI;",
            vec![
                Instruction::Ldc("https://example.invalid".into()),
                Instruction::invoke_static(
                    "java/net/URI",
                    "create",
                    "(Ljava/lang/String;)Ljava/net/URI;",
                ),
                Instruction::Simple(opcodes::ARETURN),
            ],
        );
        let op = TransformOp::CallAdvice {
            matcher: MemberMatcher::build(|call| {
                call.owner("java/net/URI").named("create");
            }),
            before: Some(FragmentSource::lazy(|_, f| {
                f.insn(opcodes::POP)?.load_constant("wss://local")?;
                Ok(())
            })),
            after: None,
        };
        let applied = op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(applied.sites, 1);
        assert_eq!(m.instructions[1], Instruction::Simple(opcodes::POP));
        assert_eq!(m.instructions[2], Instruction::Ldc("wss://local".into()));
        assert!(analyze_stack(&m).is_ok());
    }

    #[test]
    fn test_call_advice_rejects_wrong_delta() {
        let mut m = method(
            "()V",
            vec![
                Instruction::invoke_static("a/B", "c", "()V"),
                Instruction::Simple(opcodes::RETURN),
            ],
        );
        let op = TransformOp::CallAdvice {
            matcher: MemberMatcher::build(|call| {
                call.named("c");
            }),
            before: None,
            after: Some(vec![Instruction::Simple(opcodes::ICONST_0)].into()),
        };
        assert!(matches!(
            op.apply(&host(), &mut m, "r"),
            Err(Error::StackImbalance { .. })
        ));
    }

    #[test]
    fn test_call_advice_after_with_branches() {
        let mut m = method(
            "()I",
            vec![
                Instruction::invoke_static("a/B", "d", "()I"),
                Instruction::Simple(opcodes::IRETURN),
            ],
        );
        // normalizes the returned int to 0 or 1
        let op = TransformOp::CallAdvice {
            matcher: MemberMatcher::build(|call| {
                call.named("d");
            }),
            before: None,
            after: Some(FragmentSource::lazy(|_, f| {
                let zero = f.new_label();
                let end = f.new_label();
                f.jump(opcodes::IFEQ, zero)?
                    .insn(opcodes::ICONST_1)?
                    .jump(opcodes::GOTO, end)?
                    .mark(zero)?
                    .insn(opcodes::ICONST_0)?
                    .mark(end)?;
                Ok(())
            })),
        };
        let applied = op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(applied.sites, 1);
        assert_eq!(m.instructions.last(), Some(&Instruction::Simple(opcodes::IRETURN)));
        assert!(analyze_stack(&m).is_ok());
    }

    #[test]
    fn test_call_advice_missing_call() {
        let mut m = method("()V", vec![Instruction::Simple(opcodes::RETURN)]);
        let op = TransformOp::CallAdvice {
            matcher: MemberMatcher::build(|call| {
                call.named("absent");
            }),
            before: Some(Fragment::default().into()),
            after: None,
        };
        match op.apply(&host(), &mut m, "websocket") {
            Err(Error::InstructionNotFound { registration, .. }) => {
                assert_eq!(registration, "websocket")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_replace_call_discards_arguments() {
        let mut m = method(
            "()V",
            vec![
                Instruction::var(opcodes::ALOAD, 0),
                Instruction::Simple(opcodes::LCONST_0),
                Instruction::Simple(opcodes::ICONST_1),
                Instruction::invoke_virtual("a/B", "log", "(JI)V"),
                Instruction::Simple(opcodes::RETURN),
            ],
        );
        let op = TransformOp::ReplaceCall {
            matcher: MemberMatcher::build(|call| {
                call.named("log");
            }),
            replacement: None,
        };
        op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(
            &m.instructions[3..6],
            &[
                Instruction::Simple(opcodes::POP),
                Instruction::Simple(opcodes::POP2),
                Instruction::Simple(opcodes::POP),
            ]
        );
        assert!(analyze_stack(&m).is_ok());
    }

    #[test]
    fn test_method_exit_every_return() {
        let mut m = method(
            "(Z)I",
            vec![
                Instruction::var(opcodes::ILOAD, 1),
                Instruction::Jump {
                    opcode: opcodes::IFEQ,
                    target: Label(0),
                },
                Instruction::Simple(opcodes::ICONST_1),
                Instruction::Simple(opcodes::IRETURN),
                Instruction::Label(Label(0)),
                Instruction::Simple(opcodes::ICONST_0),
                Instruction::Simple(opcodes::IRETURN),
            ],
        );
        let op = TransformOp::MethodExit(FragmentSource::lazy(|_, f| {
            f.invoke_static("a/Hooks", "exit", "()V")?;
            Ok(())
        }));
        let applied = op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(applied.sites, 2);
        let hooks = m
            .instructions
            .iter()
            .filter(|insn| insn.as_method().is_some_and(|call| call.name == "exit"))
            .count();
        assert_eq!(hooks, 2);
        assert!(analyze_stack(&m).is_ok());
    }

    #[test]
    fn test_method_exit_with_branches() {
        let mut m = method(
            "(Z)V",
            vec![
                Instruction::var(opcodes::ILOAD, 1),
                Instruction::Jump {
                    opcode: opcodes::IFEQ,
                    target: Label(0),
                },
                Instruction::Simple(opcodes::RETURN),
                Instruction::Label(Label(0)),
                Instruction::Simple(opcodes::RETURN),
            ],
        );
        // pushes 1 or 2 on separate paths and hands it to the hook
        let op = TransformOp::MethodExit(FragmentSource::lazy(|_, f| {
            let two = f.new_label();
            let end = f.new_label();
            f.insn(opcodes::ICONST_0)?
                .jump(opcodes::IFEQ, two)?
                .insn(opcodes::ICONST_1)?
                .jump(opcodes::GOTO, end)?
                .mark(two)?
                .insn(opcodes::ICONST_2)?
                .mark(end)?
                .invoke_static("a/Hooks", "exit", "(I)V")?;
            Ok(())
        }));
        let applied = op.apply(&host(), &mut m, "r").unwrap();
        assert_eq!(applied.sites, 2);
        let hooks = m
            .instructions
            .iter()
            .filter(|insn| insn.as_method().is_some_and(|call| call.name == "exit"))
            .count();
        assert_eq!(hooks, 2);
        assert!(analyze_stack(&m).is_ok());
    }

    #[test]
    fn test_spliced_labels_do_not_collide() {
        let mut m = method(
            "()V",
            vec![
                Instruction::Label(Label(3)),
                Instruction::invoke_static("a/B", "c", "()V"),
                Instruction::invoke_static("a/B", "c", "()V"),
                Instruction::Simple(opcodes::RETURN),
            ],
        );
        let advice = FragmentSource::lazy(|_, f| {
            let skip = f.new_label();
            f.insn(opcodes::ICONST_0)?
                .jump(opcodes::IFEQ, skip)?
                .mark(skip)?;
            Ok(())
        });
        let op = TransformOp::CallAdvice {
            matcher: MemberMatcher::build(|call| {
                call.named("c");
            }),
            before: Some(advice),
            after: None,
        };
        op.apply(&host(), &mut m, "r").unwrap();
        let labels: Vec<Label> = m
            .instructions
            .iter()
            .filter_map(|insn| match insn {
                Instruction::Label(label) => Some(*label),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec![Label(3), Label(4), Label(5)]);
        assert!(analyze_stack(&m).is_ok());
    }
}
