//! Navigation over a method's instruction sequence.
//!
//! Transforms rarely edit the instruction they searched for. More often they anchor on
//! something recognisable (a string literal, a call) and then look a few instructions ahead or
//! behind for the instruction they actually need, such as the `putfield` storing the result of
//! a constructor call. [`InstructionCursor`] provides those relative searches.
//!
//! # Examples
//!
//! ```rust
//! use classpatch::{
//!     assembly::{opcodes, Instruction, InstructionCursor},
//!     classfile::Constant,
//! };
//!
//! let code = vec![
//!     Instruction::Ldc(Constant::from("store")),
//!     Instruction::invoke_special("a/Button", "<init>", "(Ljava/lang/String;)V"),
//!     Instruction::field(opcodes::PUTFIELD, "a/Menu", "store", "La/Button;"),
//! ];
//!
//! let mut cursor = InstructionCursor::new(&code);
//! cursor.find_string("store").unwrap();
//! let (index, _) = cursor
//!     .next(|insn| insn.opcode() == Some(opcodes::PUTFIELD))
//!     .unwrap();
//! assert_eq!(index, 2);
//! ```

use crate::{
    assembly::{FieldRef, Instruction, MethodRef},
    classfile::Constant,
};

/// A position within an instruction slice plus relative search operations.
///
/// A fresh cursor sits before the first instruction, so [`InstructionCursor::next`] considers
/// index `0`. Every successful search moves the cursor onto the found instruction; failed
/// searches leave it where it was.
#[derive(Debug, Clone, Copy)]
pub struct InstructionCursor<'a> {
    instructions: &'a [Instruction],
    position: Option<usize>,
}

impl<'a> InstructionCursor<'a> {
    /// Creates a cursor positioned before the first instruction.
    #[must_use]
    pub fn new(instructions: &'a [Instruction]) -> Self {
        InstructionCursor {
            instructions,
            position: None,
        }
    }

    /// Creates a cursor positioned on `index`.
    #[must_use]
    pub fn at(instructions: &'a [Instruction], index: usize) -> Self {
        InstructionCursor {
            instructions,
            position: Some(index.min(instructions.len())),
        }
    }

    /// Current index, `None` before the first search.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Instruction under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&'a Instruction> {
        self.position.and_then(|index| self.instructions.get(index))
    }

    /// Constant loaded by the instruction under the cursor.
    #[must_use]
    pub fn constant(&self) -> Option<Constant> {
        self.current().and_then(Instruction::constant_value)
    }

    /// Finds the next instruction after the cursor satisfying `condition` and moves onto it.
    pub fn next<F>(&mut self, condition: F) -> Option<(usize, &'a Instruction)>
    where
        F: Fn(&Instruction) -> bool,
    {
        let instructions = self.instructions;
        let start = self.position.map_or(0, |index| index + 1);
        let found = instructions
            .iter()
            .enumerate()
            .skip(start)
            .find(|&(_, insn)| condition(insn));
        if let Some((index, _)) = found {
            self.position = Some(index);
        }
        found
    }

    /// Finds the closest instruction before the cursor satisfying `condition` and moves onto
    /// it. A cursor that has not been positioned yet searches from the end.
    pub fn previous<F>(&mut self, condition: F) -> Option<(usize, &'a Instruction)>
    where
        F: Fn(&Instruction) -> bool,
    {
        let instructions = self.instructions;
        let end = self
            .position
            .unwrap_or(instructions.len())
            .min(instructions.len());
        let found = instructions[..end]
            .iter()
            .enumerate()
            .rev()
            .find(|&(_, insn)| condition(insn));
        if let Some((index, _)) = found {
            self.position = Some(index);
        }
        found
    }

    /// Next real instruction, skipping labels and line numbers.
    pub fn next_instruction(&mut self) -> Option<(usize, &'a Instruction)> {
        self.next(|insn| !insn.is_pseudo())
    }

    /// Previous real instruction, skipping labels and line numbers.
    pub fn previous_instruction(&mut self) -> Option<(usize, &'a Instruction)> {
        self.previous(|insn| !insn.is_pseudo())
    }

    /// Next load of `constant`, including short push forms.
    pub fn find_constant(&mut self, constant: &Constant) -> Option<usize> {
        self.next(|insn| insn.constant_value().as_ref() == Some(constant))
            .map(|(index, _)| index)
    }

    /// Next `ldc` of exactly `value`.
    pub fn find_string(&mut self, value: &str) -> Option<usize> {
        self.next(|insn| matches!(insn, Instruction::Ldc(Constant::String(s)) if s == value))
            .map(|(index, _)| index)
    }

    /// Next call whose target satisfies `condition`.
    pub fn find_call<F>(&mut self, condition: F) -> Option<(usize, &'a MethodRef)>
    where
        F: Fn(&MethodRef) -> bool,
    {
        self.next(|insn| insn.as_method().is_some_and(&condition))
            .and_then(|(index, insn)| insn.as_method().map(|method| (index, method)))
    }

    /// Next field access whose reference satisfies `condition`.
    pub fn find_field<F>(&mut self, condition: F) -> Option<(usize, &'a FieldRef)>
    where
        F: Fn(&FieldRef) -> bool,
    {
        self.next(|insn| insn.as_field().is_some_and(&condition))
            .and_then(|(index, insn)| insn.as_field().map(|field| (index, field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{opcodes, Label};

    fn code() -> Vec<Instruction> {
        vec![
            Instruction::Label(Label(0)),
            Instruction::var(opcodes::ALOAD, 0),
            Instruction::Ldc(Constant::from("singleplayer")),
            Instruction::Simple(opcodes::POP),
            Instruction::Ldc(Constant::from("store")),
            Instruction::invoke_special("a/Button", "<init>", "(Ljava/lang/String;)V"),
            Instruction::field(opcodes::PUTFIELD, "a/Menu", "store", "La/Button;"),
            Instruction::Int {
                opcode: opcodes::BIPUSH,
                operand: 8,
            },
            Instruction::Label(Label(1)),
            Instruction::Simple(opcodes::RETURN),
        ]
    }

    #[test]
    fn test_next_moves_forward() {
        let code = code();
        let mut cursor = InstructionCursor::new(&code);
        assert_eq!(cursor.find_string("store"), Some(4));
        let (index, field) = cursor.find_field(|field| field.name == "store").unwrap();
        assert_eq!(index, 6);
        assert_eq!(field.descriptor, "La/Button;");
        assert_eq!(cursor.position(), Some(6));

        // no further strings, cursor stays put
        assert_eq!(cursor.find_string("store"), None);
        assert_eq!(cursor.position(), Some(6));
    }

    #[test]
    fn test_previous_moves_backward() {
        let code = code();
        let mut cursor = InstructionCursor::at(&code, 6);
        let (index, _) = cursor
            .previous(|insn| matches!(insn, Instruction::Ldc(_)))
            .unwrap();
        assert_eq!(index, 4);
        let (index, _) = cursor.previous_instruction().unwrap();
        assert_eq!(index, 3);
    }

    #[test]
    fn test_unpositioned_previous_searches_from_end() {
        let code = code();
        let mut cursor = InstructionCursor::new(&code);
        let (index, _) = cursor.previous_instruction().unwrap();
        assert_eq!(index, 9);
    }

    #[test]
    fn test_constant_at_cursor() {
        let code = code();
        let mut cursor = InstructionCursor::new(&code);
        assert_eq!(cursor.find_constant(&Constant::Int(8)), Some(7));
        assert_eq!(cursor.constant(), Some(Constant::Int(8)));
        assert!(cursor.next_instruction().is_some());
        assert_eq!(cursor.constant(), None);
    }
}
