//! # Type System
//!
//! Type records built by the `OpType*` instructions. Aggregate types resolve
//! their members eagerly, so byte sizes and member offsets never need another
//! table lookup.

use spirv_vm_spec::{Id, StorageClass};

/// Largest type, in bytes, the VM will lay out
pub const MAX_TYPE_SIZE: usize = 1 << 20;

/// Storage size of `OpTypeBool` values
pub const BOOL_SIZE: usize = 4;

/// Storage size of pointer values
pub const POINTER_SIZE: usize = 8;

/// Coarse classification of a type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataKind {
    Void,
    Bool,
    Int,
    Float,
    Pointer,
    Vector,
    Matrix,
    Array,
    Struct,
    Function,
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One member of an aggregate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    pub type_id: Id,
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeData {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { members: Box<[Member]> },
    Matrix { members: Box<[Member]> },
    Array { element: Member, length: u32 },
    Struct { members: Box<[Member]> },
    Pointer { storage: StorageClass, pointee: Id },
    Function { return_type: Id, parameters: Box<[Id]> },
}

impl TypeData {
    pub fn data_kind(&self) -> DataKind {
        match self {
            TypeData::Void => DataKind::Void,
            TypeData::Bool => DataKind::Bool,
            TypeData::Int { .. } => DataKind::Int,
            TypeData::Float { .. } => DataKind::Float,
            TypeData::Vector { .. } => DataKind::Vector,
            TypeData::Matrix { .. } => DataKind::Matrix,
            TypeData::Array { .. } => DataKind::Array,
            TypeData::Struct { .. } => DataKind::Struct,
            TypeData::Pointer { .. } => DataKind::Pointer,
            TypeData::Function { .. } => DataKind::Function,
        }
    }

    /// Number of members; scalars count as one, void and functions as none
    pub fn element_count(&self) -> usize {
        match self {
            TypeData::Void | TypeData::Function { .. } => 0,
            TypeData::Bool | TypeData::Int { .. } | TypeData::Float { .. } => 1,
            TypeData::Pointer { .. } => 1,
            TypeData::Vector { members }
            | TypeData::Matrix { members }
            | TypeData::Struct { members } => members.len(),
            TypeData::Array { length, .. } => *length as usize,
        }
    }

    /// Storage size of a value of this type
    pub fn size_in_bytes(&self) -> usize {
        match self {
            TypeData::Void | TypeData::Function { .. } => 0,
            TypeData::Bool => BOOL_SIZE,
            TypeData::Int { width, .. } | TypeData::Float { width } => scalar_size(*width),
            TypeData::Pointer { .. } => POINTER_SIZE,
            TypeData::Vector { members }
            | TypeData::Matrix { members }
            | TypeData::Struct { members } => members.iter().map(|m| m.size).sum(),
            TypeData::Array { element, length } => element.size * *length as usize,
        }
    }

    /// Member at `index` and its byte offset within the value
    pub fn member(&self, index: u32) -> Option<(Member, usize)> {
        let index = index as usize;
        match self {
            TypeData::Vector { members }
            | TypeData::Matrix { members }
            | TypeData::Struct { members } => {
                let member = *members.get(index)?;
                let offset = members[..index].iter().map(|m| m.size).sum();
                Some((member, offset))
            }
            TypeData::Array { element, length } if index < *length as usize => {
                Some((*element, element.size * index))
            }
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            TypeData::Bool | TypeData::Int { .. } | TypeData::Float { .. }
        )
    }
}

/// Byte size of a scalar of `width` bits, rounded up to whole bytes
#[inline]
pub const fn scalar_size(width: u32) -> usize {
    (width as usize + 7) / 8
}
