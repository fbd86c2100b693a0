//! Assembler errors

use spirv_vm_spec::SpirvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown instruction at line {line}: {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("Unknown {kind} enumerant at line {line}: {name}")]
    UnknownEnumerant {
        line: usize,
        kind: String,
        name: String,
    },

    #[error("{opcode} at line {line} is missing its {expected} operand")]
    MissingOperand {
        line: usize,
        opcode: &'static str,
        expected: String,
    },

    #[error("{opcode} at line {line} has an extra operand: {operand}")]
    TooManyOperands {
        line: usize,
        opcode: &'static str,
        operand: String,
    },

    #[error("{opcode} at line {line} needs a result ID")]
    MissingResult { line: usize, opcode: &'static str },

    #[error("{opcode} at line {line} does not produce a result")]
    UnexpectedResult { line: usize, opcode: &'static str },

    #[error("Expected {expected} at line {line}, found {found}")]
    UnexpectedOperand {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid literal {literal} at line {line}: {reason}")]
    InvalidLiteral {
        line: usize,
        literal: String,
        reason: String,
    },

    #[error("Invalid ID %{id} at line {line}")]
    InvalidId { line: usize, id: String },

    #[error("{opcode} at line {line} is {words} words long")]
    InstructionTooLong {
        line: usize,
        opcode: &'static str,
        words: usize,
    },

    #[error("Assembled module is invalid: {0}")]
    Module(#[from] SpirvError),
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
