//! Statement encoding
//!
//! Operands are encoded by walking the opcode's [`Grammar`]; the same table
//! drives the disassembler, so the two agree on every word.

use std::collections::HashMap;

use spirv_vm_spec::{
    encode_header, encode_string, GlslStd450, Grammar, Id, Op, OperandKind, Word,
    MAX_BOUND,
};

use crate::error::{AssemblerError, Result};
use crate::parser::{Operand, Statement};

/// Assigns numbers to `%name` IDs
///
/// Numeric IDs keep their number. Named IDs are numbered in order of first
/// appearance, starting above the largest numeric ID.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    ids: HashMap<String, Id>,
    bound: Id,
}

impl IdAllocator {
    pub fn new(statements: &[Statement]) -> Result<Self> {
        let names = statements.iter().flat_map(|stmt| {
            let operand_ids = stmt.operands.iter().filter_map(|operand| match operand {
                Operand::Id(name) => Some(name),
                _ => None,
            });
            stmt.result.iter().chain(operand_ids).map(move |name| (stmt.line, name))
        });

        let mut numeric = HashMap::new();
        let mut named = Vec::new();
        for (line, name) in names {
            if numeric.contains_key(name) || named.contains(name) {
                continue;
            }
            if name.bytes().all(|b| b.is_ascii_digit()) {
                match name.parse::<Id>() {
                    Ok(id) if id != 0 && id < MAX_BOUND => numeric.insert(name.clone(), id),
                    _ => return Err(AssemblerError::InvalidId { line, id: name.clone() }),
                };
            } else {
                named.push(name.clone());
            }
        }

        let mut next = numeric.values().copied().max().unwrap_or(0) + 1;
        let mut ids = numeric;
        for name in named {
            ids.insert(name, next);
            next += 1;
        }
        Ok(Self { ids, bound: next })
    }

    /// One past the largest assigned ID
    pub fn bound(&self) -> Id {
        self.bound
    }

    pub fn get(&self, name: &str) -> Option<Id> {
        self.ids.get(name).copied()
    }
}

/// How `OpConstant` literals of a type are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    Float(u32),
    Int(u32),
}

/// Encodes statements one by one, tracking scalar types for constants
#[derive(Debug, Clone)]
pub struct Encoder {
    ids: IdAllocator,
    scalars: HashMap<Id, ScalarType>,
}

impl Encoder {
    pub fn new(statements: &[Statement]) -> Result<Self> {
        Ok(Self {
            ids: IdAllocator::new(statements)?,
            scalars: HashMap::new(),
        })
    }

    pub fn bound(&self) -> Id {
        self.ids.bound()
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Encode one statement, header word included
    pub fn encode(&mut self, stmt: &Statement) -> Result<Vec<Word>> {
        let grammar = Grammar::of(stmt.op);
        let opcode = stmt.op.name();
        let line = stmt.line;
        match (&stmt.result, grammar.has_result()) {
            (None, true) => return Err(AssemblerError::MissingResult { line, opcode }),
            (Some(_), false) => return Err(AssemblerError::UnexpectedResult { line, opcode }),
            _ => {}
        }

        let mut words: Vec<Word> = vec![0];
        let mut operands = stmt.operands.iter();
        let mut result_type = None;

        for &kind in grammar.fixed {
            match (kind, &stmt.result) {
                (OperandKind::IdResult, Some(result)) => words.push(self.id(line, result)?),
                _ => {
                    let operand = operands.next().ok_or_else(|| AssemblerError::MissingOperand {
                        line,
                        opcode,
                        expected: describe_kind(kind),
                    })?;
                    self.operand(line, kind, operand, result_type, &mut words)?;
                    if kind == OperandKind::IdResultType {
                        result_type = words.last().copied();
                    }
                }
            }
        }
        for &kind in grammar.optional {
            match operands.next() {
                Some(operand) => self.operand(line, kind, operand, result_type, &mut words)?,
                None => break,
            }
        }
        if let Some(kind) = grammar.variadic {
            for operand in operands.by_ref() {
                self.operand(line, kind, operand, result_type, &mut words)?;
            }
        }
        if let Some(extra) = operands.next() {
            return Err(AssemblerError::TooManyOperands {
                line,
                opcode,
                operand: extra.describe(),
            });
        }

        let word_count = u16::try_from(words.len()).map_err(|_| {
            AssemblerError::InstructionTooLong {
                line,
                opcode,
                words: words.len(),
            }
        })?;
        words[0] = encode_header(stmt.op.to_u16(), word_count);
        self.record_scalar(stmt.op, &words);
        Ok(words)
    }

    fn id(&self, line: usize, name: &str) -> Result<Id> {
        self.ids.get(name).ok_or_else(|| AssemblerError::InvalidId {
            line,
            id: name.to_string(),
        })
    }

    fn operand(
        &self,
        line: usize,
        kind: OperandKind,
        operand: &Operand,
        result_type: Option<Id>,
        words: &mut Vec<Word>,
    ) -> Result<()> {
        let unexpected = || AssemblerError::UnexpectedOperand {
            line,
            expected: describe_kind(kind),
            found: operand.describe(),
        };
        match kind {
            OperandKind::IdResultType | OperandKind::IdRef | OperandKind::IdResult => {
                let Operand::Id(name) = operand else {
                    return Err(unexpected());
                };
                words.push(self.id(line, name)?);
            }
            OperandKind::LiteralInteger => {
                words.push(literal_u32(line, operand).ok_or_else(unexpected)??)
            }
            OperandKind::LiteralString => {
                let Operand::Str(text) = operand else {
                    return Err(unexpected());
                };
                words.extend(encode_string(text));
            }
            OperandKind::LiteralExtInst => match operand {
                Operand::Word(name) => {
                    let instruction = GlslStd450::from_name(name).ok_or_else(|| {
                        AssemblerError::UnknownEnumerant {
                            line,
                            kind: "GLSL.std.450".to_string(),
                            name: name.clone(),
                        }
                    })?;
                    words.push(instruction.to_u32());
                }
                _ => words.push(literal_u32(line, operand).ok_or_else(unexpected)??),
            },
            OperandKind::Enum(enum_kind) => match operand {
                Operand::Word(name) => {
                    let value = enum_kind.value_of(name).ok_or_else(|| {
                        AssemblerError::UnknownEnumerant {
                            line,
                            kind: enum_kind.name().to_string(),
                            name: name.clone(),
                        }
                    })?;
                    words.push(value);
                }
                _ => words.push(literal_u32(line, operand).ok_or_else(unexpected)??),
            },
            OperandKind::LiteralContextDependent => {
                let scalar = result_type.and_then(|id| self.scalars.get(&id).copied());
                words.extend(constant_words(line, scalar, operand)?);
            }
        }
        Ok(())
    }

    fn record_scalar(&mut self, op: Op, words: &[Word]) {
        match (op, words) {
            (Op::TypeFloat, &[_, id, width, ..]) => {
                self.scalars.insert(id, ScalarType::Float(width));
            }
            (Op::TypeInt, &[_, id, width, ..]) => {
                self.scalars.insert(id, ScalarType::Int(width));
            }
            _ => {}
        }
    }
}

fn describe_kind(kind: OperandKind) -> String {
    match kind {
        OperandKind::IdResultType => "result type ID".to_string(),
        OperandKind::IdResult => "result ID".to_string(),
        OperandKind::IdRef => "ID".to_string(),
        OperandKind::LiteralInteger => "integer literal".to_string(),
        OperandKind::LiteralString => "string literal".to_string(),
        OperandKind::LiteralContextDependent => "constant literal".to_string(),
        OperandKind::LiteralExtInst => "extended instruction".to_string(),
        OperandKind::Enum(kind) => format!("{} enumerant", kind.name()),
    }
}

/// One-word integer literal; `None` if the operand is not an integer at all
fn literal_u32(line: usize, operand: &Operand) -> Option<Result<Word>> {
    let out_of_range = || AssemblerError::InvalidLiteral {
        line,
        literal: operand.describe(),
        reason: "does not fit in 32 bits".to_string(),
    };
    match *operand {
        Operand::Integer(v) if v < 0 => {
            Some(i32::try_from(v).map(|v| v as u32).map_err(|_| out_of_range()))
        }
        Operand::Integer(v) => Some(u32::try_from(v).map_err(|_| out_of_range())),
        Operand::Bits(v) => Some(u32::try_from(v).map_err(|_| out_of_range())),
        _ => None,
    }
}

/// Encode an `OpConstant` value for its result type
///
/// 64-bit values take two words, low-order word first. Hex literals are raw
/// bits for any type.
fn constant_words(
    line: usize,
    scalar: Option<ScalarType>,
    operand: &Operand,
) -> Result<Vec<Word>> {
    let invalid = |reason: &str| AssemblerError::InvalidLiteral {
        line,
        literal: operand.describe(),
        reason: reason.to_string(),
    };
    let split = |bits: u64| vec![bits as u32, (bits >> 32) as u32];

    match (scalar, operand) {
        (Some(ScalarType::Float(64)), Operand::Float(text)) => text
            .parse::<f64>()
            .map(|v| split(v.to_bits()))
            .map_err(|_| invalid("not a 64-bit float")),
        (Some(ScalarType::Float(64)), Operand::Integer(v)) => Ok(split((*v as f64).to_bits())),
        (Some(ScalarType::Float(32)) | None, Operand::Float(text)) => text
            .parse::<f32>()
            .map(|v| vec![v.to_bits()])
            .map_err(|_| invalid("not a 32-bit float")),
        (Some(ScalarType::Float(32)), Operand::Integer(v)) => Ok(vec![(*v as f32).to_bits()]),
        (Some(ScalarType::Float(_)), Operand::Integer(_) | Operand::Float(_)) => {
            Err(invalid("write this float width as hex bits"))
        }
        (Some(ScalarType::Float(64) | ScalarType::Int(64)), Operand::Bits(bits)) => {
            Ok(split(*bits))
        }
        (Some(ScalarType::Int(64)), Operand::Integer(v)) => Ok(split(*v as u64)),
        (Some(ScalarType::Int(_)), Operand::Float(_)) => {
            Err(invalid("integer type needs an integer"))
        }
        (_, Operand::Integer(_) | Operand::Bits(_)) => match literal_u32(line, operand) {
            Some(word) => Ok(vec![word?]),
            None => Err(invalid("not a number")),
        },
        _ => Err(invalid("not a number")),
    }
}
