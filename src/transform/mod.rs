//! Method body transformations.
//!
//! A transform block is an ordered list of [`TransformOp`]s attached to a method registration.
//! When the scanner binds the registration to a method it applies the block to a working copy
//! of the method, validates the result and only then replaces the original. A block either
//! commits completely or leaves the method exactly as it was.
//!
//! Validation runs the stack analysis of [`crate::assembly::analyze_stack`] over the edited
//! body, provided the original body was analysable, and recomputes `max_stack` and
//! `max_locals` from the edited instructions.
//!
//! # Key Components
//!
//! - [`TransformOp`] - A single edit
//! - [`FragmentSource`] - Static or lazily built instructions spliced by an edit
//! - [`Transform`] - A finished block, applied by the scanner
//! - [`TransformBuilder`] - The DSL used inside registration closures
//! - [`TransformContext`] - What lazily built fragments can see

mod context;
mod op;

use std::sync::Arc;

use tracing::{debug, warn};

pub use context::TransformContext;
pub use op::{Applied, FragmentSource, LazyFragment, TransformOp};

use crate::{
    assembly::{analyze_stack, opcodes, FragmentBuilder, Instruction},
    classfile::{ClassRecord, Constant, MethodRecord},
    events::{EventKind, EventLog},
    matcher::MemberMatcher,
    module::{Module, ModuleId, ModuleRegistry},
    Error, Result,
};

/// A finished transform block.
#[derive(Debug, Clone)]
pub struct Transform {
    ops: Vec<TransformOp>,
    compute_frames: bool,
}

/// What a committed block did.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// Per-operation results, in application order
    pub applied: Vec<Applied>,
    /// Whether the method body differs from what it was before the block
    pub changed: bool,
}

impl Transform {
    /// Creates a block from operations.
    #[must_use]
    pub fn new(ops: Vec<TransformOp>) -> Self {
        Transform {
            ops,
            compute_frames: true,
        }
    }

    /// The operations of this block.
    #[must_use]
    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    /// Returns `true` if the block has nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether the host should recompute stack map frames for the edited class.
    #[must_use]
    pub fn compute_frames(&self) -> bool {
        self.compute_frames
    }

    /// Applies the block to `method` atomically and records events in `log`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an operation, or [`Error::StackImbalance`] if the
    /// edited body fails stack analysis. `method` is untouched in both cases.
    pub fn apply(
        &self,
        class: &ClassRecord,
        method: &mut MethodRecord,
        registration: &str,
        log: &EventLog,
    ) -> Result<TransformOutcome> {
        let mut working = method.clone();
        let mut applied = Vec::with_capacity(self.ops.len());
        for op in &self.ops {
            applied.push(op.apply(class, &mut working, registration)?);
        }

        let changed =
            working.instructions != method.instructions || working.try_catch != method.try_catch;
        if changed {
            finalize(method, &mut working)?;
            *method = working;
        }

        let signature = method.signature();
        for (op, result) in self.ops.iter().zip(&applied) {
            if result.sites == 0 {
                log.record(EventKind::Warning)
                    .class(class.name.clone())
                    .method(signature.clone())
                    .registration(registration)
                    .message(format!("{} had no effect: {}", op.name(), result.detail));
            } else {
                log.record(result.kind)
                    .class(class.name.clone())
                    .method(signature.clone())
                    .registration(registration)
                    .message(format!("{} ({} sites)", result.detail, result.sites));
            }
        }

        Ok(TransformOutcome { applied, changed })
    }
}

/// Validates the edited body and recomputes its limits.
fn finalize(original: &MethodRecord, edited: &mut MethodRecord) -> Result<()> {
    match analyze_stack(original) {
        Ok(_) => {
            let analysis = analyze_stack(edited)?;
            edited.max_stack = analysis.max_stack;
        }
        Err(error) => {
            // nothing to compare against; keep the declared limit
            debug!(
                method = %original.signature(),
                %error,
                "original body is not analysable, skipping stack validation"
            );
        }
    }
    edited.max_locals = edited.max_locals.max(required_locals(&edited.instructions));
    Ok(())
}

fn required_locals(instructions: &[Instruction]) -> u16 {
    instructions
        .iter()
        .filter_map(|insn| match insn {
            Instruction::Var { opcode, index } => {
                let wide = matches!(
                    *opcode,
                    opcodes::LLOAD | opcodes::DLOAD | opcodes::LSTORE | opcodes::DSTORE
                );
                Some(index + if wide { 2 } else { 1 })
            }
            Instruction::Iinc { index, .. } => Some(index + 1),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

/// Collects the operations of a transform block.
///
/// Builder methods never fail. Operations that cannot be built, such as a constant replacement
/// changing the constant category, are left out and reported as issues when the registration
/// is finished. Module-scoped sections added with [`TransformBuilder::with_module`] are rolled
/// back as a whole if any part of them fails.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use classpatch::{assembly::opcodes, module::ModuleRegistry, transform::TransformBuilder};
///
/// let mut transform = TransformBuilder::new(Arc::new(ModuleRegistry::new()));
/// transform
///     .replace_string("\u{1} FPS", "\u{1} frames")
///     .advice_after(
///         |call| {
///             call.named("bridge$getDebugFPS");
///         },
///         |_, fragment| {
///             fragment
///                 .insn(opcodes::I2F)?
///                 .load_constant(2.0f32)?
///                 .insn(opcodes::FMUL)?
///                 .insn(opcodes::F2I)?;
///             Ok(())
///         },
///     );
/// let (block, issues) = transform.finish();
/// assert_eq!(block.ops().len(), 2);
/// assert!(issues.is_empty());
/// ```
pub struct TransformBuilder {
    registry: Arc<ModuleRegistry>,
    ops: Vec<TransformOp>,
    compute_frames: bool,
    issues: Vec<Error>,
}

impl TransformBuilder {
    /// Creates an empty block that consults `registry` for module-scoped sections.
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        TransformBuilder {
            registry,
            ops: Vec::new(),
            compute_frames: true,
            issues: Vec::new(),
        }
    }

    /// Appends an operation.
    pub fn op(&mut self, op: TransformOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Replaces every push of `from` with `to`.
    pub fn replace_constant(
        &mut self,
        from: impl Into<Constant>,
        to: impl Into<Constant>,
    ) -> &mut Self {
        match TransformOp::replace_constant(from, to) {
            Ok(op) => self.op(op),
            Err(error) => {
                self.issues.push(error);
                self
            }
        }
    }

    /// Replaces `from` with `to` inside every string literal.
    pub fn replace_string(&mut self, from: &str, to: &str) -> &mut Self {
        self.op(TransformOp::ReplaceString {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Replaces the body with an immediate return of the default value.
    pub fn stub(&mut self) -> &mut Self {
        self.op(TransformOp::Stub { value: None })
    }

    /// Replaces the body with an immediate return of `value`.
    pub fn fixed_value(&mut self, value: impl Into<Constant>) -> &mut Self {
        self.op(TransformOp::Stub {
            value: Some(value.into()),
        })
    }

    /// Replaces the body with a fragment built at application time.
    pub fn overwrite<F>(&mut self, build: F) -> &mut Self
    where
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.op(TransformOp::Overwrite(FragmentSource::lazy(build)))
    }

    /// Replaces the body with fixed instructions.
    pub fn overwrite_with(&mut self, body: impl Into<FragmentSource>) -> &mut Self {
        self.op(TransformOp::Overwrite(body.into()))
    }

    /// Inserts fragments around every call selected by `matcher`.
    pub fn call_advice<M>(
        &mut self,
        matcher: M,
        before: Option<FragmentSource>,
        after: Option<FragmentSource>,
    ) -> &mut Self
    where
        M: FnOnce(&mut MemberMatcher),
    {
        self.op(TransformOp::CallAdvice {
            matcher: MemberMatcher::build(matcher),
            before,
            after,
        })
    }

    /// Inserts a fragment before every selected call; it may consume the call's arguments.
    pub fn advice_before<M, F>(&mut self, matcher: M, build: F) -> &mut Self
    where
        M: FnOnce(&mut MemberMatcher),
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.call_advice(matcher, Some(FragmentSource::lazy(build)), None)
    }

    /// Inserts a fragment after every selected call; it may consume the call's result.
    pub fn advice_after<M, F>(&mut self, matcher: M, build: F) -> &mut Self
    where
        M: FnOnce(&mut MemberMatcher),
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.call_advice(matcher, None, Some(FragmentSource::lazy(build)))
    }

    /// Removes every selected call, popping the arguments it would have consumed.
    pub fn replace_call<M>(&mut self, matcher: M) -> &mut Self
    where
        M: FnOnce(&mut MemberMatcher),
    {
        self.op(TransformOp::ReplaceCall {
            matcher: MemberMatcher::build(matcher),
            replacement: None,
        })
    }

    /// Substitutes a fragment for every selected call.
    pub fn replace_call_with<M, F>(&mut self, matcher: M, build: F) -> &mut Self
    where
        M: FnOnce(&mut MemberMatcher),
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.op(TransformOp::ReplaceCall {
            matcher: MemberMatcher::build(matcher),
            replacement: Some(FragmentSource::lazy(build)),
        })
    }

    /// Inserts a fragment before every return instruction.
    pub fn method_exit<F>(&mut self, build: F) -> &mut Self
    where
        F: Fn(&TransformContext<'_>, &mut FragmentBuilder) -> Result<()> + Send + Sync + 'static,
    {
        self.op(TransformOp::MethodExit(FragmentSource::lazy(build)))
    }

    /// Tells the host not to recompute stack map frames for this class.
    pub fn disable_frame_computing(&mut self) -> &mut Self {
        self.compute_frames = false;
        self
    }

    /// Runs `section` only if module `id` is enabled.
    ///
    /// If `section` fails, or any operation it adds cannot be built, everything it added is
    /// removed again and the failure is kept as an issue.
    pub fn with_module<F>(&mut self, id: ModuleId, section: F) -> &mut Self
    where
        F: FnOnce(&Module, &mut TransformBuilder) -> Result<()>,
    {
        let registry = Arc::clone(&self.registry);
        if !registry.is_enabled(id) {
            return self;
        }

        let (ops, frames, issues) = (self.ops.len(), self.compute_frames, self.issues.len());
        let result = section(registry.module(id), self);
        if let Some(error) = module_failure(id, result, &mut self.issues, issues) {
            warn!(module = %id, %error, "module section rolled back");
            self.ops.truncate(ops);
            self.compute_frames = frames;
            self.issues.push(error);
        }
        self
    }

    /// Returns `true` if no operation was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The module registry sections are checked against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Finishes the block, returning it with every issue met while building.
    #[must_use]
    pub fn finish(self) -> (Transform, Vec<Error>) {
        (
            Transform {
                ops: self.ops,
                compute_frames: self.compute_frames,
            },
            self.issues,
        )
    }
}

/// Folds the outcome of a module-scoped section into a single error, if it failed.
///
/// Issues recorded since `mark` are drained from `issues` and summarised.
pub(crate) fn module_failure(
    id: ModuleId,
    result: Result<()>,
    issues: &mut Vec<Error>,
    mark: usize,
) -> Option<Error> {
    let raised: Vec<Error> = issues.drain(mark..).collect();
    match (result, raised.is_empty()) {
        (Ok(()), true) => None,
        (Err(error @ Error::ModuleConfig { .. }), true) => Some(error),
        (Err(error), true) => Some(Error::ModuleConfig {
            module: id,
            message: error.to_string(),
        }),
        (result, false) => {
            let mut messages: Vec<String> = raised.iter().map(ToString::to_string).collect();
            if let Err(error) = result {
                messages.insert(0, error.to_string());
            }
            Some(Error::ModuleConfig {
                module: id,
                message: messages.join("; "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classfile::{AccessFlags, ClassBuilder},
        test::factories::profile_manager_class,
    };

    fn registry() -> Arc<ModuleRegistry> {
        let mut registry = ModuleRegistry::new();
        registry
            .enable(ModuleId::FpsSpoof)
            .set_option(ModuleId::FpsSpoof, "multiplier", 2.0);
        Arc::new(registry)
    }

    #[test]
    fn test_builder_collects_issues() {
        let mut builder = TransformBuilder::new(registry());
        builder.replace_constant(1, 1.0f32).replace_string("a", "b");
        let (block, issues) = builder.finish();
        assert_eq!(block.ops().len(), 1);
        assert!(matches!(issues[0], Error::ConstantTypeMismatch { .. }));
    }

    #[test]
    fn test_with_module_disabled_adds_nothing() {
        let mut builder = TransformBuilder::new(registry());
        builder.with_module(ModuleId::Privacy, |_, t| {
            t.stub();
            Ok(())
        });
        assert!(builder.is_empty());
    }

    #[test]
    fn test_with_module_rolls_back() {
        let mut builder = TransformBuilder::new(registry());
        builder.stub();
        builder.with_module(ModuleId::FpsSpoof, |module, t| {
            t.disable_frame_computing().replace_string("x", "y");
            module.text("missing")?;
            Ok(())
        });
        let (block, issues) = builder.finish();
        assert_eq!(block.ops().len(), 1);
        assert!(block.compute_frames());
        assert!(matches!(
            issues[0],
            Error::ModuleConfig {
                module: ModuleId::FpsSpoof,
                ..
            }
        ));
    }

    #[test]
    fn test_apply_is_atomic() {
        let class = profile_manager_class();
        let mut method = class.method("handleNewProfile").unwrap().clone();
        let before = method.instructions.clone();

        let block = Transform::new(vec![
            TransformOp::replace_constant(8, i32::MAX).unwrap(),
            TransformOp::ReplaceCall {
                matcher: MemberMatcher::build(|call| {
                    call.named("absent");
                }),
                replacement: None,
            },
        ]);
        let log = EventLog::new();
        assert!(matches!(
            block.apply(&class, &mut method, "profiles", &log),
            Err(Error::InstructionNotFound { .. })
        ));
        assert_eq!(method.instructions, before);
        assert!(log.is_empty());
    }

    #[test]
    fn test_apply_rejects_unbalanced_result() {
        let class = ClassBuilder::new("a/B").build().unwrap();
        let mut method = MethodRecord::new(
            "c",
            "()I",
            AccessFlags::PUBLIC,
            vec![
                Instruction::invoke_static("a/B", "d", "()I"),
                Instruction::Simple(opcodes::IRETURN),
            ],
        )
        .unwrap();
        let block = Transform::new(vec![TransformOp::ReplaceCall {
            matcher: MemberMatcher::build(|call| {
                call.named("d");
            }),
            replacement: None,
        }]);
        assert!(matches!(
            block.apply(&class, &mut method, "r", &EventLog::new()),
            Err(Error::StackImbalance { .. })
        ));
        assert_eq!(method.instructions.len(), 2);
    }

    #[test]
    fn test_apply_records_events_and_limits() {
        let class = profile_manager_class();
        let mut method = class.method("handleNewProfile").unwrap().clone();
        let block = Transform::new(vec![
            TransformOp::replace_constant(8, i32::MAX).unwrap(),
            TransformOp::replace_constant(99, 100).unwrap(),
        ]);
        let log = EventLog::new();
        let outcome = block.apply(&class, &mut method, "profiles", &log).unwrap();
        assert!(outcome.changed);
        assert!(method
            .constants()
            .any(|constant| constant == Constant::Int(i32::MAX)));
        assert_eq!(log.count_kind(EventKind::ConstantReplaced), 1);
        assert_eq!(log.count_kind(EventKind::Warning), 1);
        assert!(method.max_stack >= 2);
    }

    #[test]
    fn test_required_locals() {
        let body = vec![
            Instruction::var(opcodes::LLOAD, 3),
            Instruction::Iinc { index: 1, delta: 1 },
        ];
        assert_eq!(required_locals(&body), 5);
    }
}
