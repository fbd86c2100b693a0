//! # SPIR-V VM Specification
//!
//! Wire-level definitions shared by the SPIR-V VM crates.
//!
//! ## Contents
//! - Opcode numbering and operand grammar for the supported instruction subset
//! - Enumerants (storage classes, execution models, decorations, ...)
//! - The word cursor used to walk an instruction stream
//! - Module header parsing and loading from raw bytes
//! - The GLSL.std.450 extended instruction numbering

/// Declares a `u32`-valued SPIR-V enumerant set with numeric and textual
/// conversions. Variant names are the assembly spellings.
macro_rules! spirv_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal,)* }) => {
        $(#[$meta])*
        #[allow(non_camel_case_types)]
        #[repr(u32)]
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $($variant = $value,)*
        }

        impl $name {
            /// Every enumerant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $($value => Some($name::$variant),)*
                    _ => None,
                }
            }

            #[inline]
            pub const fn to_u32(self) -> u32 {
                self as u32
            }

            /// Assembly spelling
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant),)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub mod decoration;
pub mod encoding;
pub mod enums;
pub mod error;
pub mod glsl;
pub mod grammar;
pub mod module;
pub mod opcode;

pub use decoration::{literals_for, Decoration};
pub use encoding::{encode_header, encode_string, InstructionHeader, WordCursor};
pub use enums::{
    AddressingModel, Capability, ExecutionMode, ExecutionModel, FunctionControl, MemoryModel,
    SourceLanguage, StorageClass,
};
pub use error::{Result, SpirvError};
pub use glsl::GlslStd450;
pub use grammar::{EnumKind, Grammar, OperandKind};
pub use module::{Module, ModuleHeader, SourceInfo};
pub use opcode::Op;

/// Magic number opening every SPIR-V module
pub const MAGIC: u32 = 0x0723_0203;

/// Magic number as seen when a module was written with the opposite byte order
pub const MAGIC_SWAPPED: u32 = 0x0302_2307;

/// Header length in words (magic, version, generator, bound, schema)
pub const HEADER_WORDS: usize = 5;

/// Largest bound the loader accepts (SPIR-V universal limit on IDs)
pub const MAX_BOUND: u32 = 0x0040_0000;

/// Result ID
pub type Id = u32;

/// Instruction stream word
pub type Word = u32;
