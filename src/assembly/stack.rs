//! Static operand stack analysis of a single method body.
//!
//! Every edit the scanner commits must leave the method with a consistent operand stack: at
//! each instruction the stack height must be the same on every path reaching it, and no
//! instruction may pop more slots than are present. [`analyze_stack`] checks this with a
//! worklist pass over the control flow graph implied by jumps, switches and exception handlers,
//! and computes the resulting `max_stack`.
//!
//! Only heights are tracked, not types; verification beyond that is left to the JVM.
//! Subroutines (`jsr`/`ret`) are rejected, class files using them predate Java 6 and are not
//! edited by this crate.

use std::collections::HashMap;

use crate::{
    assembly::{FlowType, Instruction, Label},
    classfile::MethodRecord,
    Error, Result,
};

/// Result of [`analyze_stack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackAnalysis {
    /// Highest stack height reached, in slots
    pub max_stack: u16,
    /// Stack height before each instruction, `None` for unreachable instructions
    pub depths: Vec<Option<u16>>,
}

impl StackAnalysis {
    /// Stack height before the instruction at `index`, `None` if unreachable.
    #[must_use]
    pub fn depth_at(&self, index: usize) -> Option<u16> {
        self.depths.get(index).copied().flatten()
    }
}

/// Computes stack heights for every reachable instruction of `method`.
///
/// Execution starts at index `0` with an empty stack; every exception handler starts with the
/// caught exception as its only stack entry.
///
/// # Errors
///
/// - [`crate::Error::StackImbalance`] on underflow, on diverging heights at a merge point and
///   on returns that leave a value of the wrong size
/// - [`crate::Error::Malformed`] on unknown labels, subroutines and code that runs off the end
///   of the body
///
/// # Examples
///
/// ```rust
/// use classpatch::{
///     assembly::{analyze_stack, opcodes, Instruction},
///     classfile::{AccessFlags, MethodRecord},
/// };
///
/// let method = MethodRecord::new(
///     "scale",
///     "(F)F",
///     AccessFlags::STATIC,
///     vec![
///         Instruction::var(opcodes::FLOAD, 0),
///         Instruction::Ldc(2.5f32.into()),
///         Instruction::Simple(opcodes::FMUL),
///         Instruction::Simple(opcodes::FRETURN),
///     ],
/// )?;
///
/// assert_eq!(analyze_stack(&method)?.max_stack, 2);
/// # Ok::<(), classpatch::Error>(())
/// ```
pub fn analyze_stack(method: &MethodRecord) -> Result<StackAnalysis> {
    let instructions = &method.instructions;
    let labels = label_positions(instructions);
    let resolve = |label: &Label| {
        labels
            .get(label)
            .copied()
            .ok_or_else(|| malformed_error!("{} references unknown label {}", method.signature(), label))
    };
    let imbalance = |message: String| Error::StackImbalance {
        method: method.signature(),
        message,
    };

    let mut depths: Vec<Option<u16>> = vec![None; instructions.len()];
    let mut worklist: Vec<(usize, u16)> = Vec::new();
    if !instructions.is_empty() {
        worklist.push((0, 0));
    }
    for block in &method.try_catch {
        worklist.push((resolve(&block.handler)?, 1));
    }

    let return_size = method.return_type.size();
    let mut max_stack = 0u16;

    while let Some((index, depth)) = worklist.pop() {
        match depths[index] {
            Some(known) if known == depth => continue,
            Some(known) => {
                return Err(imbalance(format!(
                    "height {known} and {depth} meet at instruction {index} ({})",
                    instructions[index]
                )))
            }
            None => depths[index] = Some(depth),
        }

        let insn = &instructions[index];
        let behavior = insn.stack_behavior()?;
        if behavior.pops > depth {
            return Err(imbalance(format!(
                "{insn} at {index} pops {} slots with {depth} on the stack",
                behavior.pops
            )));
        }
        let after = depth - behavior.pops + behavior.pushes;
        max_stack = max_stack.max(after).max(depth);

        let fall_through = |worklist: &mut Vec<(usize, u16)>| {
            if index + 1 < instructions.len() {
                worklist.push((index + 1, after));
                Ok(())
            } else {
                Err(malformed_error!(
                    "{} falls off the end of its code",
                    method.signature()
                ))
            }
        };

        match insn.flow_type() {
            FlowType::Sequential | FlowType::Call | FlowType::Pseudo => {
                fall_through(&mut worklist)?;
            }
            FlowType::ConditionalBranch => {
                for target in insn.targets() {
                    worklist.push((resolve(&target)?, after));
                }
                fall_through(&mut worklist)?;
            }
            FlowType::UnconditionalBranch | FlowType::Switch => {
                for target in insn.targets() {
                    worklist.push((resolve(&target)?, after));
                }
            }
            FlowType::Return => {
                if behavior.pops != return_size {
                    return Err(imbalance(format!(
                        "{insn} at {index} does not match return type {}",
                        method.return_type
                    )));
                }
            }
            FlowType::Throw => {}
            FlowType::Subroutine => {
                return Err(malformed_error!(
                    "{} uses subroutines, which are not supported",
                    method.signature()
                ))
            }
        }
    }

    Ok(StackAnalysis { max_stack, depths })
}

/// Net stack effect of a straight-line fragment, in slots.
///
/// Fragments spliced into the middle of a method may consume values already on the stack, so
/// the running height is allowed to go negative. Branches are not followed, so the result is
/// only meaningful for code without jumps; [`crate::assembly::FragmentBuilder`] tracks the
/// height along every path for fragments that branch.
///
/// # Errors
///
/// Returns the error of [`Instruction::stack_behavior`] for malformed instructions.
pub fn net_stack_effect(instructions: &[Instruction]) -> Result<i32> {
    instructions.iter().try_fold(0i32, |net, insn| {
        Ok(net + insn.stack_behavior()?.net_effect())
    })
}

fn label_positions(instructions: &[Instruction]) -> HashMap<Label, usize> {
    instructions
        .iter()
        .enumerate()
        .filter_map(|(index, insn)| match insn {
            Instruction::Label(label) => Some((*label, index)),
            _ => None,
        })
        .collect()
}
