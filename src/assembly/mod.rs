//! JVM instruction model, navigation and stack analysis.
//!
//! Everything the transform engine needs to reason about a method body lives here: the typed
//! [`Instruction`] tree, the opcode tables, a cursor for relative searches, the fragment
//! builder used to write injected code and the stack height analysis that guards every commit.
//!
//! # Key Components
//!
//! - [`Instruction`] - One instruction or pseudo-instruction of a method body
//! - [`opcodes`] - Opcode constants and mnemonics
//! - [`InstructionCursor`] - Next/previous searches within an instruction sequence
//! - [`Fragment`] / [`FragmentBuilder`] - Code to be spliced into a method
//! - [`analyze_stack`] - Operand stack height analysis of a whole method

mod cursor;
mod fragment;
mod instruction;
pub mod opcodes;
mod stack;

pub use cursor::InstructionCursor;
pub use fragment::{Fragment, FragmentBuilder};
pub use instruction::{FieldRef, FlowType, Instruction, Label, MethodRef, StackBehavior};
pub use stack::{analyze_stack, net_stack_effect, StackAnalysis};
