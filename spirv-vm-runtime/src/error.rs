//! Runtime error types for the SPIR-V VM

use spirv_vm_spec::{Id, SpirvError, StorageClass};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    Spirv(#[from] SpirvError),

    // Result table errors
    #[error("ID {id} is out of range (bound {bound})")]
    IdOutOfRange { id: Id, bound: u32 },

    #[error("ID {id} is used before it is defined")]
    UndefinedId { id: Id },

    #[error("ID {id} is already a {existing}, cannot redefine it as a {requested}")]
    IdRedefined {
        id: Id,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("ID {id}: expected {expected}, found {found}")]
    TypeMismatch {
        id: Id,
        expected: String,
        found: String,
    },

    #[error("Type {id} is too large: {size} bytes")]
    TypeTooLarge { id: Id, size: usize },

    #[error("Unsupported float width {width} for ID {id}")]
    UnsupportedFloatWidth { id: Id, width: u32 },

    #[error("ID {id} has more than {max} decorations")]
    TooManyDecorations { id: Id, max: usize },

    #[error("Function {id} has no OpFunctionEnd")]
    UnterminatedFunction { id: Id },

    // Dispatch errors
    #[error("Unsupported opcode {opcode} at word {offset}")]
    UnsupportedOpcode { opcode: u16, offset: usize },

    #[error("Unsupported extended instruction {instruction} of set \"{set}\" at word {offset}")]
    UnsupportedExtInst {
        set: String,
        instruction: u32,
        offset: usize,
    },

    // Call errors
    #[error("Entry point \"{name}\" not found")]
    EntryPointNotFound { name: String },

    #[error("Execution limit exceeded: {limit} instructions")]
    ExecutionLimitExceeded { limit: u64 },

    // Interface errors
    #[error("Location {location} is out of range (max {max})")]
    LocationOutOfRange { location: u32, max: usize },

    #[error("Interface variable {id} has no Location decoration")]
    MissingLocation { id: Id },

    #[error("No input data bound at location {location}")]
    MissingInput { location: u32 },

    #[error("Input at location {location} is too short: expected {expected} bytes, got {actual}")]
    InputTooShort {
        location: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot store through {id}: {storage} storage is read-only")]
    ReadOnlyStorage { id: Id, storage: StorageClass },

    #[error("No output data written at location {location}")]
    NoOutputData { location: u32 },
}

impl RuntimeError {
    /// Check if this error stops setup or execution
    ///
    /// Unsupported instructions are skipped unless the VM runs with
    /// `strict_opcodes`.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RuntimeError::UnsupportedOpcode { .. } | RuntimeError::UnsupportedExtInst { .. }
        )
    }

    pub(crate) fn mismatch(id: Id, expected: impl Into<String>, found: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            id,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
