//! # Result Table
//!
//! Records indexed by ID. Every access is bounds-checked against the module
//! bound, and typed accessors fail with `UndefinedId` or `TypeMismatch`
//! instead of handing back the wrong payload.
//!
//! Slots are boxed and filled on first write, so an unused ID costs one
//! pointer however large the header's bound is.

use spirv_vm_spec::Id;

use crate::error::{Result, RuntimeError};
use crate::record::{ConstantData, ResultKind, ResultRecord, VariableData};
use crate::types::{DataKind, TypeData};

/// Record read back for IDs nothing has written to
static UNSET: ResultRecord = ResultRecord {
    name: None,
    decorations: Vec::new(),
    kind: ResultKind::Unset,
};

#[derive(Clone, Debug)]
pub struct ResultTable {
    records: Vec<Option<Box<ResultRecord>>>,
}

impl ResultTable {
    /// Table of `bound` unset records
    pub fn new(bound: u32) -> Self {
        Self {
            records: vec![None; bound as usize],
        }
    }

    pub fn bound(&self) -> u32 {
        self.records.len() as u32
    }

    /// Number of records that have been written to
    pub fn materialized(&self) -> usize {
        self.records.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn get(&self, id: Id) -> Result<&ResultRecord> {
        let bound = self.bound();
        let slot = self
            .records
            .get(id as usize)
            .ok_or(RuntimeError::IdOutOfRange { id, bound })?;
        Ok(slot.as_deref().unwrap_or(&UNSET))
    }

    pub fn get_mut(&mut self, id: Id) -> Result<&mut ResultRecord> {
        let bound = self.bound();
        let slot = self
            .records
            .get_mut(id as usize)
            .ok_or(RuntimeError::IdOutOfRange { id, bound })?;
        Ok(&mut **slot.get_or_insert_with(Box::default))
    }

    /// Give an unset record its kind
    pub fn define(&mut self, id: Id, kind: ResultKind) -> Result<()> {
        let record = self.get_mut(id)?;
        if !record.is_unset() {
            return Err(RuntimeError::IdRedefined {
                id,
                existing: record.kind.name(),
                requested: kind.name(),
            });
        }
        record.kind = kind;
        Ok(())
    }

    /// Define a record, replacing an earlier definition of the same kind
    ///
    /// Used for results produced while executing, which are recomputed on
    /// every call.
    pub fn replace(&mut self, id: Id, kind: ResultKind) -> Result<()> {
        let record = self.get_mut(id)?;
        let compatible = record.is_unset()
            || std::mem::discriminant(&record.kind) == std::mem::discriminant(&kind);
        if !compatible {
            return Err(RuntimeError::IdRedefined {
                id,
                existing: record.kind.name(),
                requested: kind.name(),
            });
        }
        record.kind = kind;
        Ok(())
    }

    fn defined(&self, id: Id) -> Result<&ResultKind> {
        let record = self.get(id)?;
        if record.is_unset() {
            return Err(RuntimeError::UndefinedId { id });
        }
        Ok(&record.kind)
    }

    pub fn type_of(&self, id: Id) -> Result<&TypeData> {
        match self.defined(id)? {
            ResultKind::Type(ty) => Ok(ty),
            other => Err(RuntimeError::mismatch(id, "Type", other.name())),
        }
    }

    /// Folded value of a constant or of an executed instruction
    pub fn value(&self, id: Id) -> Result<&ConstantData> {
        match self.defined(id)? {
            ResultKind::Constant(constant) => Ok(constant),
            other => Err(RuntimeError::mismatch(id, "Constant", other.name())),
        }
    }

    pub fn variable(&self, id: Id) -> Result<&VariableData> {
        match self.defined(id)? {
            ResultKind::Variable(variable) => Ok(variable),
            other => Err(RuntimeError::mismatch(id, "Variable", other.name())),
        }
    }

    pub fn variable_mut(&mut self, id: Id) -> Result<&mut VariableData> {
        let record = self.get_mut(id)?;
        match &mut record.kind {
            ResultKind::Variable(variable) => Ok(variable),
            ResultKind::Unset => Err(RuntimeError::UndefinedId { id }),
            other => Err(RuntimeError::mismatch(id, "Variable", other.name())),
        }
    }

    /// Byte size of a type
    pub fn size_of(&self, type_id: Id) -> Result<usize> {
        Ok(self.type_of(type_id)?.size_in_bytes())
    }

    /// Width of a float scalar type or of the components of a float vector
    pub fn float_width(&self, type_id: Id) -> Result<u32> {
        match self.type_of(type_id)? {
            TypeData::Float { width } => Ok(*width),
            TypeData::Vector { members } => match members.first() {
                Some(member) => match self.type_of(member.type_id)? {
                    TypeData::Float { width } => Ok(*width),
                    other => Err(RuntimeError::mismatch(
                        type_id,
                        "float vector",
                        format!("{} vector", other.data_kind()),
                    )),
                },
                None => Err(RuntimeError::mismatch(type_id, "float vector", "empty vector")),
            },
            other => Err(RuntimeError::mismatch(
                type_id,
                "float scalar or vector",
                other.data_kind().to_string(),
            )),
        }
    }

    /// Read an integer constant, as used for array lengths
    pub fn integer_constant(&self, id: Id) -> Result<u64> {
        let constant = self.value(id)?;
        match self.type_of(constant.type_id)? {
            TypeData::Int { .. } => {
                let mut buf = [0u8; 8];
                let len = constant.bytes.len().min(8);
                buf[..len].copy_from_slice(&constant.bytes[..len]);
                Ok(u64::from_le_bytes(buf))
            }
            other => Err(RuntimeError::mismatch(
                id,
                "integer constant",
                format!("{} constant", other.data_kind()),
            )),
        }
    }

    /// Check that `type_id` names a type of `kind`
    pub fn expect_kind(&self, type_id: Id, kind: DataKind) -> Result<&TypeData> {
        let ty = self.type_of(type_id)?;
        if ty.data_kind() != kind {
            return Err(RuntimeError::mismatch(
                type_id,
                kind.to_string(),
                ty.data_kind().to_string(),
            ));
        }
        Ok(ty)
    }

    /// Linear, byte-exact search for an entry point by any of its names
    pub fn find_entry_point(&self, name: &str) -> Option<Id> {
        self.records
            .iter()
            .position(|slot| match slot.as_deref().map(|record| &record.kind) {
                Some(ResultKind::EntryPoint(entry)) => entry.has_name(name),
                _ => false,
            })
            .map(|index| index as Id)
    }

    /// Every ID below the bound with its record
    pub fn iter(&self) -> impl Iterator<Item = (Id, &ResultRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, slot)| (index as Id, slot.as_deref().unwrap_or(&UNSET)))
    }
}
