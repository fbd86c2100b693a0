//! # SPIR-V Opcode Definitions
//!
//! Opcode values for the instruction subset the VM understands. Numbering
//! follows the Khronos SPIR-V specification; any other opcode decodes to
//! `None` and is treated as unsupported by the runtime.
//!
//! ## Families
//! - Debug/metadata: Nop, Source*, Name, MemberName, String, Line, NoLine, ModuleProcessed
//! - Mode setting: Capability, Extension, ExtInstImport, MemoryModel, EntryPoint, ExecutionMode
//! - Annotation: Decorate, MemberDecorate
//! - Type declaration: TypeVoid .. TypeFunction
//! - Constant creation: ConstantTrue, ConstantFalse, Constant, ConstantComposite
//! - Function structure: Function, FunctionParameter, FunctionEnd, Label, Return
//! - Memory: Variable, Load, Store
//! - Composite and arithmetic: CompositeConstruct, CompositeExtract, FNegate .. Dot, ExtInst

use serde::{Deserialize, Serialize};

macro_rules! opcodes {
    ($($(#[$doc:meta])* $variant:ident = $value:literal,)*) => {
        /// Instruction opcode (low 16 bits of the first instruction word)
        #[repr(u16)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Op {
            $($(#[$doc])* $variant = $value,)*
        }

        impl Op {
            /// Every opcode known to the VM, in numeric order
            pub const ALL: &'static [Op] = &[$(Op::$variant,)*];

            /// Try to convert from the raw opcode number
            pub fn from_u16(value: u16) -> Option<Self> {
                match value {
                    $($value => Some(Op::$variant),)*
                    _ => None,
                }
            }

            /// Mnemonic as written in SPIR-V assembly (e.g. `OpTypeFloat`)
            pub const fn name(self) -> &'static str {
                match self {
                    $(Op::$variant => concat!("Op", stringify!($variant)),)*
                }
            }
        }
    };
}

opcodes! {
    /// No operation
    Nop = 0,
    /// Source language and version
    Source = 3,
    /// Source extension string
    SourceExtension = 4,
    /// Debug name for an ID
    Name = 5,
    /// Debug name for a struct member
    MemberName = 6,
    /// Debug string
    String = 7,
    /// Source line information
    Line = 8,
    /// Extension declaration
    Extension = 10,
    /// Import an extended instruction set
    ExtInstImport = 11,
    /// Execute an extended instruction
    ExtInst = 12,
    /// Addressing and memory model
    MemoryModel = 14,
    /// Entry point declaration
    EntryPoint = 15,
    /// Execution mode of an entry point
    ExecutionMode = 16,
    /// Capability declaration
    Capability = 17,
    /// void
    TypeVoid = 19,
    /// bool
    TypeBool = 20,
    /// Integer of a given width and signedness
    TypeInt = 21,
    /// Float of a given width
    TypeFloat = 22,
    /// Vector of scalar components
    TypeVector = 23,
    /// Matrix of vector columns
    TypeMatrix = 24,
    /// Fixed-length array
    TypeArray = 28,
    /// Structure
    TypeStruct = 30,
    /// Pointer into a storage class
    TypePointer = 32,
    /// Function signature
    TypeFunction = 33,
    /// Boolean true constant
    ConstantTrue = 41,
    /// Boolean false constant
    ConstantFalse = 42,
    /// Scalar constant
    Constant = 43,
    /// Composite constant
    ConstantComposite = 44,
    /// Function definition header
    Function = 54,
    /// Function parameter declaration
    FunctionParameter = 55,
    /// End of function body
    FunctionEnd = 56,
    /// Variable declaration
    Variable = 59,
    /// Load through a pointer
    Load = 61,
    /// Store through a pointer
    Store = 62,
    /// Decoration of an ID
    Decorate = 71,
    /// Decoration of a struct member
    MemberDecorate = 72,
    /// Build a composite from constituents
    CompositeConstruct = 80,
    /// Extract a part of a composite
    CompositeExtract = 81,
    /// Float negation
    FNegate = 127,
    /// Float addition
    FAdd = 129,
    /// Float subtraction
    FSub = 131,
    /// Float multiplication
    FMul = 133,
    /// Float division
    FDiv = 136,
    /// Scale a float vector
    VectorTimesScalar = 142,
    /// Dot product of two float vectors
    Dot = 148,
    /// Block label
    Label = 248,
    /// Return from a void function
    Return = 253,
    /// End of line information
    NoLine = 317,
    /// Processing step record
    ModuleProcessed = 330,
}

impl Op {
    /// Convert to the raw opcode number
    #[inline]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Look up an opcode by its assembly mnemonic
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Check if this opcode only carries debug or bookkeeping information
    #[inline]
    pub const fn is_metadata(self) -> bool {
        matches!(
            self,
            Op::Nop
                | Op::SourceExtension
                | Op::MemberName
                | Op::String
                | Op::Line
                | Op::NoLine
                | Op::Extension
                | Op::ModuleProcessed
                | Op::MemberDecorate
        )
    }

    /// Check if this opcode declares a type
    #[inline]
    pub const fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Op::TypeVoid
                | Op::TypeBool
                | Op::TypeInt
                | Op::TypeFloat
                | Op::TypeVector
                | Op::TypeMatrix
                | Op::TypeArray
                | Op::TypeStruct
                | Op::TypePointer
                | Op::TypeFunction
        )
    }

    /// Check if this opcode creates a constant
    #[inline]
    pub const fn is_constant(self) -> bool {
        matches!(
            self,
            Op::ConstantTrue | Op::ConstantFalse | Op::Constant | Op::ConstantComposite
        )
    }

    /// Check if this opcode is component-wise float arithmetic
    #[inline]
    pub const fn is_float_arithmetic(self) -> bool {
        matches!(
            self,
            Op::FNegate | Op::FAdd | Op::FSub | Op::FMul | Op::FDiv | Op::VectorTimesScalar | Op::Dot
        )
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
