//! SPIR-V Assembler
//!
//! Assemble the textual form printed by `spirv-dis` into SPIR-V modules.
//!
//! IDs are written `%name` or `%12`; numeric IDs keep their number and named
//! ones are numbered above them. Enumerants are spelled by name, `;` starts
//! a comment and `OpConstant` literals are encoded for their result type.
//!
//! ## Example
//!
//! ```rust
//! use spirv_vm_assembler::assemble;
//!
//! let source = r#"
//!            OpCapability Shader
//!            OpMemoryModel Logical GLSL450
//!     %void = OpTypeVoid
//! "#;
//!
//! let module = assemble(source).unwrap();
//! assert_eq!(module.bound(), 2);
//! ```

pub mod assembler;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod parser;

pub use assembler::{assemble, assemble_words, GENERATOR};
pub use encoder::{Encoder, IdAllocator};
pub use error::{AssemblerError, Result};
pub use parser::{parse, Operand, Statement};
