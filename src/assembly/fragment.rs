//! Instruction fragments and their builder.
//!
//! A [`Fragment`] is a short instruction sequence spliced into a method by a transform: the
//! advice around a call, the replacement of a call, the code injected before every return or a
//! complete new body. Fragments carry the net stack effect their author intends
//! (`declared_delta`); the transform engine compares it with the effect computed from the
//! instructions before splicing. For built fragments that effect is the height at which control
//! leaves the fragment, following every branch.
//!
//! [`FragmentBuilder`] tracks the stack height while instructions are appended, the same way an
//! assembler tracks `max_stack`, and records the height at every label so that diverging
//! branches are caught when the fragment is built rather than when the host verifies the class.
//!
//! # Examples
//!
//! ```rust
//! use classpatch::{assembly::{opcodes, FragmentBuilder}, classfile::Constant};
//!
//! // Multiplies the int on top of the stack by 3.0 and converts it back.
//! let fragment = FragmentBuilder::consuming(1)
//!     .insn(opcodes::I2F)?
//!     .load_constant(Constant::Float(3.0))?
//!     .insn(opcodes::FMUL)?
//!     .insn(opcodes::F2I)?
//!     .build()?;
//!
//! assert_eq!(fragment.net_effect()?, 0);
//! assert_eq!(fragment.max_stack(), 1);
//! # Ok::<(), classpatch::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{net_stack_effect, opcodes, FieldRef, FlowType, Instruction, Label, MethodRef},
    classfile::{Constant, Type},
    Error, Result,
};

/// An instruction sequence to be spliced into a method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    instructions: Vec<Instruction>,
    declared_delta: i32,
    max_stack: u16,
    exit_depth: Option<i32>,
}

impl Fragment {
    /// Wraps a static instruction list with a declared net effect of zero.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Fragment {
            instructions,
            declared_delta: 0,
            max_stack: 0,
            exit_depth: None,
        }
    }

    /// Sets the net stack effect the fragment is meant to have.
    #[must_use]
    pub fn with_delta(mut self, declared_delta: i32) -> Self {
        self.declared_delta = declared_delta;
        self
    }

    /// The instructions of this fragment.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns `true` if the fragment contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The net stack effect the author declared.
    #[must_use]
    pub fn declared_delta(&self) -> i32 {
        self.declared_delta
    }

    /// Highest stack height above the splice point reached by the fragment, if built with a
    /// [`FragmentBuilder`]; `0` for static fragments.
    #[must_use]
    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    /// Net stack effect of the fragment.
    ///
    /// Built fragments report the height their builder tracked at the fall-through exit, which
    /// is the same on every path. Static fragments are summed instruction by instruction, so
    /// they must be straight-line code.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for a static fragment containing branches and the
    /// errors of [`Instruction::stack_behavior`] for malformed instructions.
    pub fn net_effect(&self) -> Result<i32> {
        if let Some(depth) = self.exit_depth {
            return Ok(depth);
        }
        if self.instructions.iter().any(|insn| !insn.targets().is_empty()) {
            return Err(malformed_error!(
                "static fragment contains branches, build it with a FragmentBuilder"
            ));
        }
        net_stack_effect(&self.instructions)
    }

    /// Returns the instructions with every label shifted by `offset`.
    ///
    /// Fragments number their labels from zero; the transform engine shifts them past the
    /// highest label of the method they are spliced into.
    #[must_use]
    pub fn relabeled(&self, offset: u32) -> Vec<Instruction> {
        let shift = |label: &Label| Label(label.0 + offset);
        self.instructions
            .iter()
            .map(|insn| match insn {
                Instruction::Label(label) => Instruction::Label(shift(label)),
                Instruction::Jump { opcode, target } => Instruction::Jump {
                    opcode: *opcode,
                    target: shift(target),
                },
                Instruction::TableSwitch {
                    min,
                    max,
                    default,
                    targets,
                } => Instruction::TableSwitch {
                    min: *min,
                    max: *max,
                    default: shift(default),
                    targets: targets.iter().map(shift).collect(),
                },
                Instruction::LookupSwitch {
                    default,
                    keys,
                    targets,
                } => Instruction::LookupSwitch {
                    default: shift(default),
                    keys: keys.clone(),
                    targets: targets.iter().map(shift).collect(),
                },
                Instruction::LineNumber { line, start } => Instruction::LineNumber {
                    line: *line,
                    start: shift(start),
                },
                other => other.clone(),
            })
            .collect()
    }
}

impl From<Vec<Instruction>> for Fragment {
    fn from(instructions: Vec<Instruction>) -> Self {
        Fragment::new(instructions)
    }
}

/// Fluent builder for [`Fragment`]s with stack height tracking.
///
/// Heights are relative to the splice point. A builder created with
/// [`FragmentBuilder::consuming`] may pop that many slots owned by the surrounding code; popping
/// more is reported as a [`crate::Error::StackImbalance`].
#[derive(Debug, Clone, Default)]
pub struct FragmentBuilder {
    instructions: Vec<Instruction>,
    available: i32,
    current_depth: i32,
    max_depth: i32,
    declared_delta: i32,
    label_depths: HashMap<Label, i32>,
    placed: Vec<Label>,
    next_label: u32,
    unreachable: bool,
}

impl FragmentBuilder {
    /// Creates a builder that may not touch values of the surrounding code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that may consume up to `slots` values of the surrounding code.
    #[must_use]
    pub fn consuming(slots: u16) -> Self {
        FragmentBuilder {
            available: i32::from(slots),
            ..Self::default()
        }
    }

    /// Declares the net stack effect the fragment is meant to have.
    pub fn delta(&mut self, declared_delta: i32) -> &mut Self {
        self.declared_delta = declared_delta;
        self
    }

    /// Current stack height relative to the splice point.
    #[must_use]
    pub fn current_depth(&self) -> i32 {
        self.current_depth
    }

    /// Allocates a label local to this fragment.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Places `label` at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the label was already placed and
    /// [`crate::Error::StackImbalance`] if it is reached with different stack heights.
    pub fn mark(&mut self, label: Label) -> Result<&mut Self> {
        if self.placed.contains(&label) {
            return Err(malformed_error!("{} placed twice", label));
        }
        self.placed.push(label);

        if self.unreachable {
            // only reachable by jumps, resume at the height they recorded
            if let Some(depth) = self.label_depths.get(&label) {
                self.current_depth = *depth;
                self.unreachable = false;
            }
        } else {
            self.record_label_depth(label)?;
        }
        self.instructions.push(Instruction::Label(label));
        Ok(self)
    }

    /// Appends an operand-less instruction.
    ///
    /// # Errors
    ///
    /// Returns an error if `opcode` takes operands or the stack underflows.
    pub fn insn(&mut self, opcode: u8) -> Result<&mut Self> {
        self.emit(Instruction::Simple(opcode))
    }

    /// Appends an arbitrary instruction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StackImbalance`] on underflow or diverging label heights and
    /// the errors of [`Instruction::stack_behavior`].
    pub fn emit(&mut self, instruction: Instruction) -> Result<&mut Self> {
        let behavior = instruction.stack_behavior()?;
        let flow = instruction.flow_type();

        if !self.unreachable {
            self.current_depth -= i32::from(behavior.pops);
            if self.current_depth < -self.available {
                return Err(Error::StackImbalance {
                    method: "fragment".to_string(),
                    message: format!(
                        "{instruction} underflows the stack ({} slots available)",
                        self.available
                    ),
                });
            }
            self.current_depth += i32::from(behavior.pushes);
            self.max_depth = self.max_depth.max(self.current_depth);

            for target in instruction.targets() {
                self.record_label_depth(target)?;
            }
        }

        self.unreachable = matches!(
            flow,
            FlowType::UnconditionalBranch | FlowType::Switch | FlowType::Return | FlowType::Throw
        );
        self.instructions.push(instruction);
        Ok(self)
    }

    /// Loads `this` (local slot `0`).
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn load_this(&mut self) -> Result<&mut Self> {
        self.emit(Instruction::var(opcodes::ALOAD, 0))
    }

    /// Loads local `index` holding a value of type `ty`.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn load(&mut self, ty: &Type, index: u16) -> Result<&mut Self> {
        self.emit(Instruction::var(ty.load_opcode(), index))
    }

    /// Stores the value on top of the stack into local `index`.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn store(&mut self, ty: &Type, index: u16) -> Result<&mut Self> {
        self.emit(Instruction::var(ty.store_opcode(), index))
    }

    /// Pushes `constant` using its shortest encoding.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn load_constant(&mut self, constant: impl Into<Constant>) -> Result<&mut Self> {
        self.emit(Instruction::load_constant(&constant.into()))
    }

    /// Accesses a field.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn field(&mut self, field: FieldRef) -> Result<&mut Self> {
        self.emit(Instruction::Field(field))
    }

    /// Reads an instance field of `this`-like receivers on the stack.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn get_field(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<&mut Self> {
        self.field(FieldRef::new(opcodes::GETFIELD, owner, name, descriptor))
    }

    /// Reads a static field.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn get_static(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<&mut Self> {
        self.field(FieldRef::new(opcodes::GETSTATIC, owner, name, descriptor))
    }

    /// Invokes a method.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn invoke(&mut self, method: MethodRef) -> Result<&mut Self> {
        self.emit(Instruction::Method(method))
    }

    /// Invokes a virtual method.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn invoke_virtual(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<&mut Self> {
        self.emit(Instruction::invoke_virtual(owner, name, descriptor))
    }

    /// Invokes a static method.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn invoke_static(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<&mut Self> {
        self.emit(Instruction::invoke_static(owner, name, descriptor))
    }

    /// Invokes an interface method.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn invoke_interface(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<&mut Self> {
        self.emit(Instruction::invoke_interface(owner, name, descriptor))
    }

    /// Discards a value of type `ty` (`pop` or `pop2`).
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn pop(&mut self, ty: &Type) -> Result<&mut Self> {
        match ty.size() {
            0 => Ok(self),
            2 => self.insn(opcodes::POP2),
            _ => self.insn(opcodes::POP),
        }
    }

    /// Casts the reference on top of the stack.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn cast(&mut self, internal_name: &str) -> Result<&mut Self> {
        self.emit(Instruction::type_insn(opcodes::CHECKCAST, internal_name))
    }

    /// Branches to `target`.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn jump(&mut self, opcode: u8, target: Label) -> Result<&mut Self> {
        self.emit(Instruction::Jump { opcode, target })
    }

    /// Returns a value of type `ty` from the method.
    ///
    /// # Errors
    ///
    /// See [`FragmentBuilder::emit`].
    pub fn return_value(&mut self, ty: &Type) -> Result<&mut Self> {
        self.insn(ty.return_opcode())
    }

    /// Finishes the fragment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a jump targets a label that was never placed.
    pub fn build(&mut self) -> Result<Fragment> {
        if let Some(label) = self
            .label_depths
            .keys()
            .find(|label| !self.placed.contains(label))
        {
            return Err(malformed_error!("{} is used but never placed", label));
        }

        // a fragment ending in a return or jump never falls through to the splice point
        let exit_depth = if self.unreachable {
            self.declared_delta
        } else {
            self.current_depth
        };
        Ok(Fragment {
            instructions: std::mem::take(&mut self.instructions),
            declared_delta: self.declared_delta,
            max_stack: u16::try_from(self.max_depth)
                .map_err(|_| malformed_error!("fragment stack height exceeds u16 range"))?,
            exit_depth: Some(exit_depth),
        })
    }

    fn record_label_depth(&mut self, label: Label) -> Result<()> {
        match self.label_depths.get(&label) {
            Some(depth) if *depth != self.current_depth => Err(Error::StackImbalance {
                method: "fragment".to_string(),
                message: format!(
                    "{label} reached with heights {depth} and {}",
                    self.current_depth
                ),
            }),
            Some(_) => Ok(()),
            None => {
                self.label_depths.insert(label, self.current_depth);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underflow_without_consumed_slots() {
        let mut builder = FragmentBuilder::new();
        assert!(matches!(
            builder.insn(opcodes::POP),
            Err(Error::StackImbalance { .. })
        ));

        let mut builder = FragmentBuilder::consuming(1);
        assert!(builder.insn(opcodes::POP).is_ok());
        assert_eq!(builder.current_depth(), -1);
    }

    #[test]
    fn test_branching_fragment() {
        let mut builder = FragmentBuilder::new();
        let connected = builder.new_label();
        builder
            .load_this()
            .unwrap()
            .get_field("a/Rpc", "client", "La/Client;")
            .unwrap()
            .invoke_virtual("a/Client", "getStatus", "()La/Status;")
            .unwrap()
            .get_static("a/Status", "CONNECTED", "La/Status;")
            .unwrap()
            .jump(opcodes::IF_ACMPEQ, connected)
            .unwrap()
            .insn(opcodes::RETURN)
            .unwrap()
            .mark(connected)
            .unwrap()
            .insn(opcodes::RETURN)
            .unwrap();
        let fragment = builder.build().unwrap();
        assert_eq!(fragment.max_stack(), 2);
        assert_eq!(fragment.instructions().len(), 8);
    }

    #[test]
    fn test_diverging_label_heights() {
        let mut builder = FragmentBuilder::new();
        let target = builder.new_label();
        builder.insn(opcodes::ICONST_0).unwrap();
        builder.jump(opcodes::IFEQ, target).unwrap();
        builder.insn(opcodes::ICONST_1).unwrap();
        assert!(matches!(
            builder.mark(target),
            Err(Error::StackImbalance { .. })
        ));
    }

    #[test]
    fn test_unplaced_label() {
        let mut builder = FragmentBuilder::new();
        let target = builder.new_label();
        builder.jump(opcodes::GOTO, target).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_net_effect_follows_branches() {
        // consumes an int and pushes 1 or 0 in its place
        let mut builder = FragmentBuilder::consuming(1);
        let zero = builder.new_label();
        let end = builder.new_label();
        builder
            .jump(opcodes::IFEQ, zero)
            .unwrap()
            .insn(opcodes::ICONST_1)
            .unwrap()
            .jump(opcodes::GOTO, end)
            .unwrap()
            .mark(zero)
            .unwrap()
            .insn(opcodes::ICONST_0)
            .unwrap()
            .mark(end)
            .unwrap();
        let fragment = builder.build().unwrap();

        assert_eq!(fragment.net_effect().unwrap(), 0);
        assert_eq!(net_stack_effect(fragment.instructions()).unwrap(), 1);
    }

    #[test]
    fn test_static_fragment_with_branch_rejected() {
        let fragment = Fragment::new(vec![
            Instruction::Simple(opcodes::ICONST_0),
            Instruction::Jump {
                opcode: opcodes::IFEQ,
                target: Label(0),
            },
            Instruction::Label(Label(0)),
        ]);
        assert!(matches!(
            fragment.net_effect(),
            Err(Error::Malformed { .. })
        ));

        let straight = Fragment::new(vec![
            Instruction::Simple(opcodes::ICONST_0),
            Instruction::Simple(opcodes::POP),
        ]);
        assert_eq!(straight.net_effect().unwrap(), 0);
    }

    #[test]
    fn test_relabeled() {
        let fragment = Fragment::new(vec![
            Instruction::Jump {
                opcode: opcodes::GOTO,
                target: Label(0),
            },
            Instruction::Label(Label(0)),
        ]);
        let shifted = fragment.relabeled(10);
        assert_eq!(shifted[1], Instruction::Label(Label(10)));
        assert_eq!(
            shifted[0],
            Instruction::Jump {
                opcode: opcodes::GOTO,
                target: Label(10)
            }
        );
    }
}
