//! # SPIR-V VM Disassembler
//!
//! Disassemble SPIR-V modules into the textual form accepted by
//! `spirv-vm-assembler`.
//!
//! IDs are printed by number, so assembling a listing reproduces the
//! module's instruction words. Opcodes outside the supported set are listed
//! as comments with their raw operand words.
//!
//! ## Example
//!
//! ```rust
//! use spirv_vm_disassembler::disassemble_words;
//! use spirv_vm_spec::{encode_header, ModuleHeader, Op};
//!
//! let mut words = ModuleHeader::new(2, 0).to_words().to_vec();
//! words.extend([encode_header(Op::TypeVoid.to_u16(), 2), 1]);
//!
//! let asm = disassemble_words(&words).unwrap();
//! assert!(asm.contains("%1 = OpTypeVoid"));
//! ```

pub mod decoder;
pub mod disassembler;
pub mod error;
pub mod formatter;

pub use decoder::{decode, DecodedInstruction, DecodedOperand, Decoder, Scalar};
pub use disassembler::{disassemble, disassemble_words};
pub use error::{DisassemblerError, Result};
pub use formatter::{format, format_operand};
