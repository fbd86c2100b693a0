//! Instruction decoding
//!
//! Splits each instruction's operand words by the opcode's grammar. A small
//! amount of module context is carried along so that constants can be
//! printed in their type's form and extended instructions by name.

use std::collections::{HashMap, HashSet};

use spirv_vm_spec::{
    glsl, EnumKind, Grammar, Id, InstructionHeader, Op, OperandKind, SpirvError, Word, WordCursor,
};

use crate::error::{DisassemblerError, Result};

/// Scalar type of an `OpConstant`, as far as the decoder knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Float(u32),
    Int { width: u32, signed: bool },
}

/// One decoded operand
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedOperand {
    Id(Id),
    Literal(Word),
    Str(String),
    Enum(EnumKind, Word),
    /// Extended instruction number; `glsl` when the set is GLSL.std.450
    ExtInst { glsl: bool, instruction: Word },
    /// `OpConstant` value words with the result type, if it is a known scalar
    Constant { scalar: Option<Scalar>, words: Vec<Word> },
}

/// One decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInstruction {
    /// Word offset of the header within the module
    pub offset: usize,
    pub opcode: u16,
    /// `None` for opcodes outside the supported set
    pub op: Option<Op>,
    pub result: Option<Id>,
    /// Operands in binary order, result ID excluded
    pub operands: Vec<DecodedOperand>,
}

/// Decoder with the module context seen so far
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    scalars: HashMap<Id, Scalar>,
    glsl_sets: HashSet<Id>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one instruction from its operand cursor
    pub fn decode(
        &mut self,
        header: InstructionHeader,
        offset: usize,
        mut words: WordCursor<'_>,
    ) -> Result<DecodedInstruction> {
        let Some(op) = Op::from_u16(header.opcode) else {
            let operands = words.read_rest().iter().copied().map(DecodedOperand::Literal).collect();
            return Ok(DecodedInstruction {
                offset,
                opcode: header.opcode,
                op: None,
                result: None,
                operands,
            });
        };

        let grammar = Grammar::of(op);
        let mut inst = DecodedInstruction {
            offset,
            opcode: header.opcode,
            op: Some(op),
            result: None,
            operands: Vec::new(),
        };
        let mut result_type = None;

        for &kind in grammar.fixed {
            if words.is_empty() {
                return Err(DisassemblerError::MissingOperand {
                    offset,
                    opcode: op.name(),
                    expected: format!("{kind:?}"),
                });
            }
            match kind {
                OperandKind::IdResult => inst.result = Some(words.read_word()?),
                OperandKind::IdResultType => {
                    let id = words.read_word()?;
                    result_type = Some(id);
                    inst.operands.push(DecodedOperand::Id(id));
                }
                _ => {
                    let operand = self.operand(kind, &mut words, &inst, result_type)?;
                    inst.operands.push(operand);
                }
            }
        }
        for &kind in grammar.optional {
            if words.is_empty() {
                break;
            }
            let operand = self.operand(kind, &mut words, &inst, result_type)?;
            inst.operands.push(operand);
        }
        if let Some(kind) = grammar.variadic {
            while !words.is_empty() {
                let operand = self.operand(kind, &mut words, &inst, result_type)?;
                inst.operands.push(operand);
            }
        }
        // Words past the grammar are kept so nothing is silently dropped
        inst.operands
            .extend(words.read_rest().iter().copied().map(DecodedOperand::Literal));

        self.record(&inst);
        Ok(inst)
    }

    fn operand(
        &self,
        kind: OperandKind,
        words: &mut WordCursor<'_>,
        inst: &DecodedInstruction,
        result_type: Option<Id>,
    ) -> std::result::Result<DecodedOperand, SpirvError> {
        Ok(match kind {
            OperandKind::IdResultType | OperandKind::IdResult | OperandKind::IdRef => {
                DecodedOperand::Id(words.read_word()?)
            }
            OperandKind::LiteralInteger => DecodedOperand::Literal(words.read_word()?),
            OperandKind::LiteralString => DecodedOperand::Str(words.read_literal_string()?),
            OperandKind::Enum(kind) => DecodedOperand::Enum(kind, words.read_word()?),
            OperandKind::LiteralExtInst => {
                let glsl = matches!(
                    inst.operands.last(),
                    Some(DecodedOperand::Id(set)) if self.glsl_sets.contains(set)
                );
                DecodedOperand::ExtInst {
                    glsl,
                    instruction: words.read_word()?,
                }
            }
            OperandKind::LiteralContextDependent => DecodedOperand::Constant {
                scalar: result_type.and_then(|id| self.scalars.get(&id).copied()),
                words: words.read_rest().to_vec(),
            },
        })
    }

    fn record(&mut self, inst: &DecodedInstruction) {
        let (Some(op), Some(result)) = (inst.op, inst.result) else {
            return;
        };
        match (op, inst.operands.as_slice()) {
            (Op::TypeFloat, [DecodedOperand::Literal(width)]) => {
                self.scalars.insert(result, Scalar::Float(*width));
            }
            (Op::TypeInt, [DecodedOperand::Literal(width), DecodedOperand::Literal(signed)]) => {
                self.scalars.insert(
                    result,
                    Scalar::Int {
                        width: *width,
                        signed: *signed != 0,
                    },
                );
            }
            (Op::ExtInstImport, [DecodedOperand::Str(name)]) if name == glsl::SET_NAME => {
                self.glsl_sets.insert(result);
            }
            _ => {}
        }
    }
}

/// Decode every instruction of a word stream starting at `base`
pub fn decode(words: &[Word], base: usize) -> Result<Vec<DecodedInstruction>> {
    let mut decoder = Decoder::new();
    let mut cursor = WordCursor::with_base(words, base);
    let mut out = Vec::new();
    while !cursor.is_empty() {
        let (header, offset, operands) = cursor.next_instruction()?;
        out.push(decoder.decode(header, offset, operands)?);
    }
    Ok(out)
}
