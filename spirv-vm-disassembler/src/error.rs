//! Disassembler errors

use spirv_vm_spec::SpirvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisassemblerError {
    #[error("{opcode} at word {offset} is missing its {expected} operand")]
    MissingOperand {
        offset: usize,
        opcode: &'static str,
        expected: String,
    },

    #[error("Invalid module: {0}")]
    Module(#[from] SpirvError),
}

pub type Result<T> = std::result::Result<T, DisassemblerError>;
