//! # Operand Grammar
//!
//! Operand layout of every supported opcode, shared by the assembler and
//! the disassembler so that both agree on how each word is spelled.
//!
//! An instruction's operands are read as the `fixed` kinds in order, then
//! each `optional` kind while words remain, then `variadic` repeatedly until
//! the instruction ends.

use crate::enums::{
    AddressingModel, Capability, ExecutionMode, ExecutionModel, FunctionControl, MemoryModel,
    SourceLanguage, StorageClass,
};
use crate::{Decoration, Op};

/// Enumerant family an operand word belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumKind {
    StorageClass,
    ExecutionModel,
    AddressingModel,
    MemoryModel,
    Capability,
    ExecutionMode,
    SourceLanguage,
    FunctionControl,
    Decoration,
}

impl EnumKind {
    pub fn name(self) -> &'static str {
        match self {
            EnumKind::StorageClass => "StorageClass",
            EnumKind::ExecutionModel => "ExecutionModel",
            EnumKind::AddressingModel => "AddressingModel",
            EnumKind::MemoryModel => "MemoryModel",
            EnumKind::Capability => "Capability",
            EnumKind::ExecutionMode => "ExecutionMode",
            EnumKind::SourceLanguage => "SourceLanguage",
            EnumKind::FunctionControl => "FunctionControl",
            EnumKind::Decoration => "Decoration",
        }
    }

    /// Spell a raw value, if it names a known enumerant
    pub fn name_of(self, value: u32) -> Option<String> {
        let name = match self {
            EnumKind::StorageClass => StorageClass::from_u32(value).map(StorageClass::name),
            EnumKind::ExecutionModel => ExecutionModel::from_u32(value).map(ExecutionModel::name),
            EnumKind::AddressingModel => {
                AddressingModel::from_u32(value).map(AddressingModel::name)
            }
            EnumKind::MemoryModel => MemoryModel::from_u32(value).map(MemoryModel::name),
            EnumKind::Capability => Capability::from_u32(value).map(Capability::name),
            EnumKind::ExecutionMode => ExecutionMode::from_u32(value).map(ExecutionMode::name),
            EnumKind::SourceLanguage => SourceLanguage::from_u32(value).map(SourceLanguage::name),
            EnumKind::Decoration => Decoration::from_u32(value).map(Decoration::name),
            EnumKind::FunctionControl => return Some(FunctionControl::format_mask(value)),
        };
        name.map(str::to_string)
    }

    /// Resolve an enumerant spelling to its value
    pub fn value_of(self, name: &str) -> Option<u32> {
        match self {
            EnumKind::StorageClass => StorageClass::from_name(name).map(StorageClass::to_u32),
            EnumKind::ExecutionModel => ExecutionModel::from_name(name).map(ExecutionModel::to_u32),
            EnumKind::AddressingModel => {
                AddressingModel::from_name(name).map(AddressingModel::to_u32)
            }
            EnumKind::MemoryModel => MemoryModel::from_name(name).map(MemoryModel::to_u32),
            EnumKind::Capability => Capability::from_name(name).map(Capability::to_u32),
            EnumKind::ExecutionMode => ExecutionMode::from_name(name).map(ExecutionMode::to_u32),
            EnumKind::SourceLanguage => SourceLanguage::from_name(name).map(SourceLanguage::to_u32),
            EnumKind::Decoration => Decoration::from_name(name).map(Decoration::to_u32),
            EnumKind::FunctionControl => FunctionControl::parse_mask(name),
        }
    }
}

/// Meaning of one operand slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Type of the instruction's result
    IdResultType,
    /// The ID this instruction defines
    IdResult,
    /// Reference to another ID
    IdRef,
    /// One-word unsigned literal
    LiteralInteger,
    /// Packed NUL-terminated string
    LiteralString,
    /// Literal whose width and meaning follow the result type (one or two words)
    LiteralContextDependent,
    /// Instruction number within an imported extended set
    LiteralExtInst,
    /// Enumerant word
    Enum(EnumKind),
}

/// Operand layout of one opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub fixed: &'static [OperandKind],
    pub optional: &'static [OperandKind],
    pub variadic: Option<OperandKind>,
}

impl Grammar {
    const fn new(fixed: &'static [OperandKind]) -> Self {
        Self {
            fixed,
            optional: &[],
            variadic: None,
        }
    }

    const fn with_optional(mut self, optional: &'static [OperandKind]) -> Self {
        self.optional = optional;
        self
    }

    const fn with_variadic(mut self, kind: OperandKind) -> Self {
        self.variadic = Some(kind);
        self
    }

    /// Check if the instruction defines a result ID
    pub fn has_result(&self) -> bool {
        self.fixed.contains(&OperandKind::IdResult)
    }

    /// Check if the instruction carries a result type
    pub fn has_result_type(&self) -> bool {
        self.fixed.contains(&OperandKind::IdResultType)
    }

    /// Operand layout for `op`
    pub const fn of(op: Op) -> Grammar {
        use OperandKind::*;

        const RESULT: &[OperandKind] = &[IdResult];
        const TYPED_RESULT: &[OperandKind] = &[IdResultType, IdResult];
        const UNARY: &[OperandKind] = &[IdResultType, IdResult, IdRef];
        const BINARY: &[OperandKind] = &[IdResultType, IdResult, IdRef, IdRef];

        match op {
            Op::Nop | Op::FunctionEnd | Op::Return | Op::NoLine => Grammar::new(&[]),
            Op::Source => Grammar::new(&[Enum(EnumKind::SourceLanguage), LiteralInteger])
                .with_optional(&[IdRef, LiteralString]),
            Op::SourceExtension | Op::Extension | Op::ModuleProcessed => {
                Grammar::new(&[LiteralString])
            }
            Op::Name => Grammar::new(&[IdRef, LiteralString]),
            Op::MemberName => Grammar::new(&[IdRef, LiteralInteger, LiteralString]),
            Op::String | Op::ExtInstImport => Grammar::new(&[IdResult, LiteralString]),
            Op::Line => Grammar::new(&[IdRef, LiteralInteger, LiteralInteger]),
            Op::ExtInst => {
                Grammar::new(&[IdResultType, IdResult, IdRef, LiteralExtInst]).with_variadic(IdRef)
            }
            Op::MemoryModel => Grammar::new(&[
                Enum(EnumKind::AddressingModel),
                Enum(EnumKind::MemoryModel),
            ]),
            Op::EntryPoint => {
                Grammar::new(&[Enum(EnumKind::ExecutionModel), IdRef, LiteralString])
                    .with_variadic(IdRef)
            }
            Op::ExecutionMode => Grammar::new(&[IdRef, Enum(EnumKind::ExecutionMode)])
                .with_variadic(LiteralInteger),
            Op::Capability => Grammar::new(&[Enum(EnumKind::Capability)]),
            Op::TypeVoid | Op::TypeBool | Op::Label => Grammar::new(RESULT),
            Op::TypeInt => Grammar::new(&[IdResult, LiteralInteger, LiteralInteger]),
            Op::TypeFloat => Grammar::new(&[IdResult, LiteralInteger]),
            Op::TypeVector | Op::TypeMatrix => Grammar::new(&[IdResult, IdRef, LiteralInteger]),
            Op::TypeArray => Grammar::new(&[IdResult, IdRef, IdRef]),
            Op::TypeStruct => Grammar::new(RESULT).with_variadic(IdRef),
            Op::TypePointer => Grammar::new(&[IdResult, Enum(EnumKind::StorageClass), IdRef]),
            Op::TypeFunction => Grammar::new(&[IdResult, IdRef]).with_variadic(IdRef),
            Op::ConstantTrue | Op::ConstantFalse | Op::FunctionParameter => {
                Grammar::new(TYPED_RESULT)
            }
            Op::Constant => Grammar::new(&[IdResultType, IdResult, LiteralContextDependent]),
            Op::ConstantComposite | Op::CompositeConstruct => {
                Grammar::new(TYPED_RESULT).with_variadic(IdRef)
            }
            Op::Function => Grammar::new(&[
                IdResultType,
                IdResult,
                Enum(EnumKind::FunctionControl),
                IdRef,
            ]),
            Op::Variable => Grammar::new(&[IdResultType, IdResult, Enum(EnumKind::StorageClass)])
                .with_optional(&[IdRef]),
            Op::Load => Grammar::new(UNARY).with_optional(&[LiteralInteger]),
            Op::Store => Grammar::new(&[IdRef, IdRef]).with_optional(&[LiteralInteger]),
            Op::Decorate => Grammar::new(&[IdRef, Enum(EnumKind::Decoration)])
                .with_variadic(LiteralInteger),
            Op::MemberDecorate => {
                Grammar::new(&[IdRef, LiteralInteger, Enum(EnumKind::Decoration)])
                    .with_variadic(LiteralInteger)
            }
            Op::CompositeExtract => Grammar::new(UNARY).with_variadic(LiteralInteger),
            Op::FNegate => Grammar::new(UNARY),
            Op::FAdd | Op::FSub | Op::FMul | Op::FDiv | Op::VectorTimesScalar | Op::Dot => {
                Grammar::new(BINARY)
            }
        }
    }
}
