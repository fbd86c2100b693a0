//! # Error Types for the SPIR-V wire format

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpirvError {
    // Module format errors
    #[error("Invalid module magic: expected 0x07230203, got {0:#010x}")]
    BadMagic(u32),

    #[error("Truncated module: {len} bytes is not a whole number of words of at least a 5-word header")]
    TruncatedFile { len: usize },

    #[error("Invalid bound {0}: must be in 1..=4194304")]
    InvalidBound(u32),

    // Stream errors
    #[error("Unexpected end of stream at word {offset}")]
    EndOfStream { offset: usize },

    #[error("Malformed instruction {opcode} at word {offset}: {reason}")]
    MalformedInstruction {
        offset: usize,
        opcode: u16,
        reason: String,
    },

    #[error("Literal string at word {offset} is not NUL-terminated")]
    UnterminatedString { offset: usize },

    #[error("Literal string at word {offset} is not valid UTF-8")]
    InvalidString { offset: usize },
}

impl SpirvError {
    /// Build a malformed-instruction error
    pub fn malformed(offset: usize, opcode: u16, reason: impl Into<String>) -> Self {
        SpirvError::MalformedInstruction {
            offset,
            opcode,
            reason: reason.into(),
        }
    }

    /// Check if this error was raised while loading the module header
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            SpirvError::BadMagic(_) | SpirvError::TruncatedFile { .. } | SpirvError::InvalidBound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpirvError>;
