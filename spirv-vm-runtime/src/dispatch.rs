//! # Dispatch Tables
//!
//! Handlers are plain function pointers indexed by opcode. A handler gets the
//! decoded instruction with a cursor bounded to its operands and must consume
//! every operand word; the driver checks this after each dispatch.

use spirv_vm_spec::{Id, Op, SpirvError, Word, WordCursor};

use crate::error::{Result, RuntimeError};
use crate::record::ExtSet;
use crate::state::VMState;
use crate::vm::Context;

/// Handler for one opcode
pub type OpHandler = fn(&Context, &mut VMState<'_>, &mut Instruction<'_>) -> Result<()>;

/// Handler for one extended instruction
///
/// The instruction cursor is positioned at the first operand ID.
pub type ExtHandler =
    fn(&Context, &mut VMState<'_>, &ExtCall, &mut Instruction<'_>) -> Result<()>;

/// Result slot of an `OpExtInst`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtCall {
    pub result_type: Id,
    pub result_id: Id,
}

/// One decoded instruction
#[derive(Clone, Debug)]
pub struct Instruction<'a> {
    pub opcode: u16,
    /// Word offset of the instruction header within the module
    pub offset: usize,
    /// Number of words, header included
    pub word_count: u16,
    operands: WordCursor<'a>,
}

impl<'a> Instruction<'a> {
    pub fn new(opcode: u16, offset: usize, word_count: u16, operands: WordCursor<'a>) -> Self {
        Self {
            opcode,
            offset,
            word_count,
            operands,
        }
    }

    pub fn op(&self) -> Option<Op> {
        Op::from_u16(self.opcode)
    }

    /// Offset of the next instruction
    pub fn end(&self) -> usize {
        self.offset + self.word_count as usize
    }

    fn missing(&self) -> SpirvError {
        SpirvError::malformed(self.offset, self.opcode, "missing operand")
    }

    /// Malformed-instruction error located at this instruction
    pub fn malformed(&self, reason: impl Into<String>) -> RuntimeError {
        SpirvError::malformed(self.offset, self.opcode, reason).into()
    }

    pub fn word(&mut self) -> Result<Word> {
        let err = self.missing();
        self.operands.read_word().map_err(|_| err.into())
    }

    /// Alias of [`Instruction::word`] that reads as an ID operand
    pub fn id(&mut self) -> Result<Id> {
        self.word()
    }

    pub fn optional(&mut self) -> Option<Word> {
        self.operands.read_optional()
    }

    pub fn words(&mut self, n: usize) -> Result<&'a [Word]> {
        let err = self.missing();
        self.operands.read_words(n).map_err(|_| err.into())
    }

    pub fn string(&mut self) -> Result<String> {
        Ok(self.operands.read_literal_string()?)
    }

    pub fn rest(&mut self) -> &'a [Word] {
        self.operands.read_rest()
    }

    /// Consume every remaining operand without looking at it
    pub fn drain(&mut self) {
        self.operands.read_rest();
    }

    pub fn remaining(&self) -> usize {
        self.operands.remaining()
    }
}

/// Opcode-indexed handler table
#[derive(Clone, Debug)]
pub struct DispatchTable {
    name: &'static str,
    handlers: Vec<Option<OpHandler>>,
}

impl DispatchTable {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, op: Op, handler: OpHandler) -> &mut Self {
        let index = op.to_u16() as usize;
        if self.handlers.len() <= index {
            self.handlers.resize(index + 1, None);
        }
        self.handlers[index] = Some(handler);
        self
    }

    pub fn get(&self, opcode: u16) -> Option<OpHandler> {
        self.handlers.get(opcode as usize).copied().flatten()
    }

    pub fn contains(&self, opcode: u16) -> bool {
        self.get(opcode).is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Opcodes with a registered handler
    pub fn ops(&self) -> impl Iterator<Item = Op> + '_ {
        self.handlers
            .iter()
            .enumerate()
            .filter(|(_, handler)| handler.is_some())
            .filter_map(|(opcode, _)| Op::from_u16(opcode as u16))
    }
}

/// Extended instruction handlers, keyed by imported set
#[derive(Clone, Debug, Default)]
pub struct ExtendedTable {
    glsl_std_450: Vec<Option<ExtHandler>>,
}

impl ExtendedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_glsl(&mut self, instruction: u32, handler: ExtHandler) -> &mut Self {
        let index = instruction as usize;
        if self.glsl_std_450.len() <= index {
            self.glsl_std_450.resize(index + 1, None);
        }
        self.glsl_std_450[index] = Some(handler);
        self
    }

    pub fn get(&self, set: &ExtSet, instruction: u32) -> Option<ExtHandler> {
        match set {
            ExtSet::GlslStd450 => self
                .glsl_std_450
                .get(instruction as usize)
                .copied()
                .flatten(),
            ExtSet::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_vm_spec::encode_header;

    fn noop(_: &Context, _: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
        inst.drain();
        Ok(())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = DispatchTable::new("test");
        table.register(Op::Label, noop).register(Op::Nop, noop);
        assert!(table.contains(Op::Label.to_u16()));
        assert!(table.contains(0));
        assert!(!table.contains(Op::Return.to_u16()));
        assert!(!table.contains(0xFFFF));
        assert_eq!(table.ops().collect::<Vec<_>>(), vec![Op::Nop, Op::Label]);
    }

    #[test]
    fn test_instruction_operands() {
        let words = [encode_header(Op::Name.to_u16(), 3), 4, 0x0000_6F66];
        let mut cursor = WordCursor::new(&words);
        let (header, offset, operands) = cursor.next_instruction().unwrap();
        let mut inst = Instruction::new(header.opcode, offset, header.word_count, operands);

        assert_eq!(inst.op(), Some(Op::Name));
        assert_eq!(inst.end(), 3);
        assert_eq!(inst.id().unwrap(), 4);
        assert_eq!(inst.string().unwrap(), "fo");
        assert_eq!(inst.remaining(), 0);
        assert!(matches!(
            inst.word(),
            Err(crate::error::RuntimeError::Spirv(SpirvError::MalformedInstruction {
                offset: 0,
                ..
            }))
        ));
    }

    #[test]
    fn test_extended_lookup() {
        fn ext(_: &Context, _: &mut VMState<'_>, _: &ExtCall, _: &mut Instruction<'_>) -> Result<()> {
            Ok(())
        }
        let mut table = ExtendedTable::new();
        table.register_glsl(43, ext);
        assert!(table.get(&ExtSet::GlslStd450, 43).is_some());
        assert!(table.get(&ExtSet::GlslStd450, 44).is_none());
        assert!(table.get(&ExtSet::Other("OpenCL.std".into()), 43).is_none());
    }
}
