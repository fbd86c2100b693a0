//! # Result Records
//!
//! One record per ID. The kind is fixed by the defining instruction; names
//! and decorations may be attached before or after it.

use spirv_vm_spec::{glsl, Decoration, ExecutionModel, Id, StorageClass};

use crate::types::TypeData;

/// A decoration and its literal operands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecorationEntry {
    pub kind: u32,
    pub literals: [u32; 2],
}

impl DecorationEntry {
    /// First literal, for single-literal decorations such as `Location`
    pub fn value(&self) -> u32 {
        self.literals[0]
    }
}

/// Imported extended instruction set
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtSet {
    GlslStd450,
    Other(Box<str>),
}

impl ExtSet {
    pub fn from_name(name: &str) -> Self {
        if name == glsl::SET_NAME {
            ExtSet::GlslStd450
        } else {
            ExtSet::Other(name.into())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExtSet::GlslStd450 => glsl::SET_NAME,
            ExtSet::Other(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionData {
    pub return_type: Id,
    pub function_type: Id,
    pub control: u32,
    /// Offset of the first instruction after `OpFunction`
    pub body_start: usize,
    /// Offset of this function's own `OpFunctionEnd`, once seen
    pub body_end: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPointData {
    /// One execution model per `OpEntryPoint` naming this function
    pub models: Vec<ExecutionModel>,
    /// Entry names, in declaration order
    pub names: Vec<Box<str>>,
    /// Execution modes with their literal operands
    pub modes: Vec<(u32, Box<[u32]>)>,
    /// Union of the interface IDs of every declaration
    pub interface: Vec<Id>,
    pub function: Option<FunctionData>,
}

impl EntryPointData {
    pub fn new(model: ExecutionModel, name: &str, interface: &[Id]) -> Self {
        EntryPointData {
            models: vec![model],
            names: vec![name.into()],
            modes: Vec::new(),
            interface: interface.to_vec(),
            function: None,
        }
    }

    /// Record a further `OpEntryPoint` for the same function
    pub fn augment(&mut self, model: ExecutionModel, name: &str, interface: &[Id]) {
        if !self.models.contains(&model) {
            self.models.push(model);
        }
        if !self.has_name(name) {
            self.names.push(name.into());
        }
        for &id in interface {
            if !self.interface.contains(&id) {
                self.interface.push(id);
            }
        }
    }

    /// Byte-exact name match
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.as_bytes() == name.as_bytes())
    }
}

/// Folded value: a declared constant or the result of an executed instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantData {
    pub type_id: Id,
    pub bytes: Box<[u8]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableData {
    pub type_id: Id,
    pub storage: StorageClass,
    pub pointee: Id,
    pub initializer: Option<Id>,
    /// Backing storage sized by the pointee type
    pub data: Box<[u8]>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResultKind {
    #[default]
    Unset,
    EntryPoint(EntryPointData),
    Type(TypeData),
    Constant(ConstantData),
    Variable(VariableData),
    Function(FunctionData),
    BlockLabel { offset: usize },
    ExtInstSet(ExtSet),
}

impl ResultKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResultKind::Unset => "Unset",
            ResultKind::EntryPoint(_) => "EntryPoint",
            ResultKind::Type(_) => "Type",
            ResultKind::Constant(_) => "Constant",
            ResultKind::Variable(_) => "Variable",
            ResultKind::Function(_) => "Function",
            ResultKind::BlockLabel { .. } => "BlockLabel",
            ResultKind::ExtInstSet(_) => "ExtInstSet",
        }
    }

    /// Function data of a function or of an entry point whose body was seen
    pub fn function(&self) -> Option<&FunctionData> {
        match self {
            ResultKind::Function(function) => Some(function),
            ResultKind::EntryPoint(entry) => entry.function.as_ref(),
            _ => None,
        }
    }

    pub fn function_mut(&mut self) -> Option<&mut FunctionData> {
        match self {
            ResultKind::Function(function) => Some(function),
            ResultKind::EntryPoint(entry) => entry.function.as_mut(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultRecord {
    pub name: Option<Box<str>>,
    pub decorations: Vec<DecorationEntry>,
    pub kind: ResultKind,
}

impl ResultRecord {
    pub fn is_unset(&self) -> bool {
        matches!(self.kind, ResultKind::Unset)
    }

    /// Attach a debug name
    ///
    /// An identical name is kept as is; a different one replaces the buffer.
    /// Returns `true` when a new buffer was allocated.
    pub fn set_name(&mut self, name: &str) -> bool {
        if self.name.as_deref().map(str::as_bytes) == Some(name.as_bytes()) {
            return false;
        }
        self.name = Some(name.into());
        true
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// First decoration of raw kind `kind`
    pub fn decoration(&self, kind: u32) -> Option<&DecorationEntry> {
        self.decorations.iter().find(|d| d.kind == kind)
    }

    pub fn location(&self) -> Option<u32> {
        self.decoration(Decoration::Location.to_u32())
            .map(DecorationEntry::value)
    }
}
