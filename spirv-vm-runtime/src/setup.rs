//! # Setup Handlers
//!
//! Run once per state over the whole module: debug names, decorations,
//! types, constants, module-scope variables, entry points and function
//! boundaries. Instructions inside function bodies that belong to the
//! execution table are left for call time.

use spirv_vm_spec::{literals_for, Capability, Decoration, ExecutionModel, Id, Op, StorageClass};

use crate::dispatch::{DispatchTable, Instruction};
use crate::error::{Result, RuntimeError};
use crate::record::{
    ConstantData, DecorationEntry, EntryPointData, ExtSet, FunctionData, ResultKind,
    VariableData,
};
use crate::state::VMState;
use crate::types::{scalar_size, DataKind, Member, TypeData, MAX_TYPE_SIZE};
use crate::vm::Context;

pub(crate) fn register(table: &mut DispatchTable) {
    table
        // Debug and bookkeeping
        .register(Op::Nop, drain)
        .register(Op::Source, drain)
        .register(Op::SourceExtension, drain)
        .register(Op::MemberName, drain)
        .register(Op::String, drain)
        .register(Op::Line, drain)
        .register(Op::NoLine, drain)
        .register(Op::Extension, drain)
        .register(Op::ModuleProcessed, drain)
        .register(Op::MemberDecorate, drain)
        .register(Op::Name, op_name)
        // Mode setting
        .register(Op::Capability, op_capability)
        .register(Op::MemoryModel, drain)
        .register(Op::ExtInstImport, op_ext_inst_import)
        .register(Op::EntryPoint, op_entry_point)
        .register(Op::ExecutionMode, op_execution_mode)
        .register(Op::Decorate, op_decorate)
        // Types
        .register(Op::TypeVoid, op_type_void)
        .register(Op::TypeBool, op_type_bool)
        .register(Op::TypeInt, op_type_int)
        .register(Op::TypeFloat, op_type_float)
        .register(Op::TypeVector, op_type_vector)
        .register(Op::TypeMatrix, op_type_matrix)
        .register(Op::TypeArray, op_type_array)
        .register(Op::TypeStruct, op_type_struct)
        .register(Op::TypePointer, op_type_pointer)
        .register(Op::TypeFunction, op_type_function)
        // Constants
        .register(Op::ConstantTrue, op_constant_bool)
        .register(Op::ConstantFalse, op_constant_bool)
        .register(Op::Constant, op_constant)
        .register(Op::ConstantComposite, op_constant_composite)
        // Functions and module-scope storage
        .register(Op::Variable, op_variable)
        .register(Op::Function, op_function)
        .register(Op::FunctionParameter, op_function_parameter)
        .register(Op::FunctionEnd, op_function_end)
        .register(Op::Label, op_label);
}

/// Consume an instruction that carries nothing the VM needs
pub(crate) fn drain(_: &Context, _: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    inst.drain();
    Ok(())
}

// ============================================================================
// Debug and Mode Setting
// ============================================================================

fn op_name(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let target = inst.id()?;
    let name = inst.string()?;
    if state.table.get_mut(target)?.set_name(&name) {
        state.stats.name_allocations += 1;
    }
    tracing::trace!("name {} = {:?}", target, name);
    Ok(())
}

fn op_capability(_: &Context, _: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let capability = inst.word()?;
    let name = Capability::from_u32(capability)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| capability.to_string());
    tracing::debug!("capability {}", name);
    Ok(())
}

fn op_ext_inst_import(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let id = inst.id()?;
    let name = inst.string()?;
    let set = ExtSet::from_name(&name);
    if let ExtSet::Other(_) = set {
        tracing::warn!("extended instruction set {:?} is not implemented", name);
    }
    tracing::debug!("ext inst import {} = {:?}", id, name);
    state.table.define(id, ResultKind::ExtInstSet(set))
}

fn op_entry_point(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let model_word = inst.word()?;
    let model = ExecutionModel::from_u32(model_word)
        .ok_or_else(|| inst.malformed(format!("unknown execution model {model_word}")))?;
    let function = inst.id()?;
    let name = inst.string()?;
    let interface = inst.rest();
    for &id in interface {
        state.table.get(id)?;
    }

    let record = state.table.get_mut(function)?;
    match &mut record.kind {
        // One function may be entered under several models or names
        ResultKind::EntryPoint(entry) => entry.augment(model, &name, interface),
        kind @ (ResultKind::Unset | ResultKind::Function(_)) => {
            let mut entry = EntryPointData::new(model, &name, interface);
            if let ResultKind::Function(data) = std::mem::take(kind) {
                entry.function = Some(data);
            }
            *kind = ResultKind::EntryPoint(entry);
        }
        other => {
            return Err(RuntimeError::IdRedefined {
                id: function,
                existing: other.name(),
                requested: "EntryPoint",
            })
        }
    }
    if record.set_name(&name) {
        state.stats.name_allocations += 1;
    }
    tracing::debug!("entry point {:?} {} ({})", name, function, model);
    Ok(())
}

fn op_execution_mode(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let target = inst.id()?;
    let mode = inst.word()?;
    let literals: Box<[u32]> = inst.rest().into();
    let record = state.table.get_mut(target)?;
    match &mut record.kind {
        ResultKind::EntryPoint(entry) => {
            entry.modes.push((mode, literals));
            Ok(())
        }
        ResultKind::Unset => Err(RuntimeError::UndefinedId { id: target }),
        other => Err(RuntimeError::mismatch(target, "EntryPoint", other.name())),
    }
}

fn op_decorate(ctx: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let target = inst.id()?;
    let kind = inst.word()?;
    let mut literals = [0u32; 2];
    if kind == Decoration::LinkageAttributes.to_u32() {
        // Name string then linkage type; the first word of the name is kept
        let name = inst.string()?;
        let mut first = [0u8; 4];
        let len = name.len().min(4);
        first[..len].copy_from_slice(&name.as_bytes()[..len]);
        literals[0] = u32::from_le_bytes(first);
        literals[1] = inst.word()?;
    } else {
        for literal in literals.iter_mut().take(literals_for(kind)) {
            *literal = inst.word()?;
        }
    }

    let max = ctx.config().max_decorations;
    let record = state.table.get_mut(target)?;
    if record.decorations.len() >= max {
        return Err(RuntimeError::TooManyDecorations { id: target, max });
    }
    record.decorations.push(DecorationEntry { kind, literals });
    Ok(())
}

// ============================================================================
// Types
// ============================================================================

fn define_type(state: &mut VMState<'_>, id: Id, ty: TypeData) -> Result<()> {
    let size = ty.size_in_bytes();
    if size > MAX_TYPE_SIZE {
        return Err(RuntimeError::TypeTooLarge { id, size });
    }
    tracing::debug!("type {} = {} ({} bytes)", id, ty.data_kind(), size);
    state.table.define(id, ResultKind::Type(ty))
}

fn op_type_void(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    define_type(state, id, TypeData::Void)
}

fn op_type_bool(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    define_type(state, id, TypeData::Bool)
}

fn op_type_int(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let width = inst.word()?;
    let signedness = inst.word()?;
    if !matches!(width, 8 | 16 | 32 | 64) {
        return Err(inst.malformed(format!("unsupported integer width {width}")));
    }
    let ty = TypeData::Int {
        width,
        signed: signedness != 0,
    };
    define_type(state, id, ty)
}

fn op_type_float(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let width = inst.word()?;
    if !matches!(width, 16 | 32 | 64) {
        return Err(inst.malformed(format!("unsupported float width {width}")));
    }
    define_type(state, id, TypeData::Float { width })
}

/// `count` copies of `type_id`, resolved to their size
fn repeated_members(state: &VMState<'_>, type_id: Id, count: u32) -> Result<Box<[Member]>> {
    let size = state.table.size_of(type_id)?;
    Ok(vec![Member { type_id, size }; count as usize].into_boxed_slice())
}

fn op_type_vector(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let component = inst.id()?;
    let count = inst.word()?;
    if !(2..=16).contains(&count) {
        return Err(inst.malformed(format!("vector of {count} components")));
    }
    let component_type = state.table.type_of(component)?;
    if !component_type.is_scalar() {
        return Err(RuntimeError::mismatch(
            component,
            "scalar component type",
            component_type.data_kind().to_string(),
        ));
    }
    let members = repeated_members(state, component, count)?;
    define_type(state, id, TypeData::Vector { members })
}

fn op_type_matrix(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let column = inst.id()?;
    let count = inst.word()?;
    if !(2..=4).contains(&count) {
        return Err(inst.malformed(format!("matrix of {count} columns")));
    }
    state.table.expect_kind(column, DataKind::Vector)?;
    let members = repeated_members(state, column, count)?;
    define_type(state, id, TypeData::Matrix { members })
}

fn op_type_array(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let element = inst.id()?;
    let length_id = inst.id()?;
    let length = state.table.integer_constant(length_id)?;
    if length == 0 {
        return Err(inst.malformed("array of length 0"));
    }
    let size = state.table.size_of(element)?;
    let total = u128::from(length) * size as u128;
    if total > MAX_TYPE_SIZE as u128 {
        return Err(RuntimeError::TypeTooLarge {
            id,
            size: usize::try_from(total).unwrap_or(usize::MAX),
        });
    }
    let ty = TypeData::Array {
        element: Member {
            type_id: element,
            size,
        },
        length: length as u32,
    };
    define_type(state, id, ty)
}

fn op_type_struct(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let members = inst
        .rest()
        .iter()
        .map(|&type_id| {
            state
                .table
                .size_of(type_id)
                .map(|size| Member { type_id, size })
        })
        .collect::<Result<Box<[Member]>>>()?;
    define_type(state, id, TypeData::Struct { members })
}

fn op_type_pointer(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    let storage_word = inst.word()?;
    let storage = StorageClass::from_u32(storage_word)
        .ok_or_else(|| inst.malformed(format!("unknown storage class {storage_word}")))?;
    let pointee = inst.id()?;
    state.table.get(pointee)?;
    define_type(state, id, TypeData::Pointer { storage, pointee })
}

fn op_type_function(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let id = inst.id()?;
    let return_type = inst.id()?;
    state.table.type_of(return_type)?;
    let parameters: Box<[Id]> = inst.rest().into();
    for &parameter in parameters.iter() {
        state.table.type_of(parameter)?;
    }
    define_type(
        state,
        id,
        TypeData::Function {
            return_type,
            parameters,
        },
    )
}

// ============================================================================
// Constants
// ============================================================================

fn define_constant(state: &mut VMState<'_>, id: Id, type_id: Id, bytes: Box<[u8]>) -> Result<()> {
    tracing::debug!("constant {} = {:02x?}", id, bytes);
    state
        .table
        .define(id, ResultKind::Constant(ConstantData { type_id, bytes }))
}

fn op_constant_bool(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let type_id = inst.id()?;
    let id = inst.id()?;
    state.table.expect_kind(type_id, DataKind::Bool)?;
    let value = u32::from(inst.op() == Some(Op::ConstantTrue));
    define_constant(state, id, type_id, Box::new(value.to_le_bytes()))
}

/// Raw bits of a scalar constant: one word for types up to 32 bits, two
/// words (low-order first) for 64-bit types
fn op_constant(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let type_id = inst.id()?;
    let id = inst.id()?;
    let size = match state.table.type_of(type_id)? {
        TypeData::Int { width, .. } | TypeData::Float { width } => scalar_size(*width),
        other => {
            return Err(RuntimeError::mismatch(
                type_id,
                "integer or float type",
                other.data_kind().to_string(),
            ))
        }
    };
    let words = inst.words((size + 3) / 4)?;
    let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    bytes.truncate(size);
    define_constant(state, id, type_id, bytes.into_boxed_slice())
}

/// Concatenate the payloads of `constituents`, checked against `type_id`
pub(crate) fn fold_composite(
    state: &VMState<'_>,
    result: Id,
    type_id: Id,
    constituents: &[Id],
) -> Result<Box<[u8]>> {
    let expected = state.table.size_of(type_id)?;
    let mut bytes = Vec::with_capacity(expected);
    for &constituent in constituents {
        bytes.extend_from_slice(&state.table.value(constituent)?.bytes);
    }
    if bytes.len() != expected {
        return Err(RuntimeError::mismatch(
            result,
            format!("{expected} bytes of constituents"),
            format!("{} bytes", bytes.len()),
        ));
    }
    Ok(bytes.into_boxed_slice())
}

fn op_constant_composite(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let type_id = inst.id()?;
    let id = inst.id()?;
    let constituents = inst.rest();
    let bytes = fold_composite(state, id, type_id, constituents)?;
    define_constant(state, id, type_id, bytes)
}

// ============================================================================
// Variables and Functions
// ============================================================================

/// Build a variable from an `OpVariable` instruction
///
/// The backing buffer is zero-filled or copied from the initializer.
pub(crate) fn create_variable(state: &VMState<'_>, inst: &mut Instruction<'_>) -> Result<(Id, ResultKind)> {
    let type_id = inst.id()?;
    let id = inst.id()?;
    let storage_word = inst.word()?;
    let initializer = inst.optional();
    let storage = StorageClass::from_u32(storage_word)
        .ok_or_else(|| inst.malformed(format!("unknown storage class {storage_word}")))?;

    let pointee = match state.table.type_of(type_id)? {
        TypeData::Pointer {
            storage: pointer_storage,
            pointee,
        } => {
            if *pointer_storage != storage {
                return Err(RuntimeError::mismatch(
                    id,
                    format!("{pointer_storage} variable"),
                    format!("{storage} variable"),
                ));
            }
            *pointee
        }
        other => {
            return Err(RuntimeError::mismatch(
                type_id,
                "Pointer",
                other.data_kind().to_string(),
            ))
        }
    };

    let size = state.table.size_of(pointee)?;
    let data: Box<[u8]> = match initializer {
        Some(init) => {
            let value = state.table.value(init)?;
            if value.bytes.len() != size {
                return Err(RuntimeError::mismatch(
                    init,
                    format!("{size}-byte initializer"),
                    format!("{} bytes", value.bytes.len()),
                ));
            }
            value.bytes.clone()
        }
        None => vec![0u8; size].into_boxed_slice(),
    };

    let kind = ResultKind::Variable(VariableData {
        type_id,
        storage,
        pointee,
        initializer,
        data,
    });
    Ok((id, kind))
}

fn op_variable(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    // Function-scope variables are created each time the function runs
    if state.current_function.is_some() {
        inst.drain();
        return Ok(());
    }
    let (id, kind) = create_variable(state, inst)?;
    tracing::debug!("variable {} ({})", id, kind.name());
    state.table.define(id, kind)
}

fn op_function(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let return_type = inst.id()?;
    let id = inst.id()?;
    let control = inst.word()?;
    let function_type = inst.id()?;
    if let Some(open) = state.current_function {
        return Err(inst.malformed(format!("function {id} starts inside function {open}")));
    }
    state.table.type_of(return_type)?;
    state.table.expect_kind(function_type, DataKind::Function)?;

    let data = FunctionData {
        return_type,
        function_type,
        control,
        body_start: inst.end(),
        body_end: None,
    };
    let record = state.table.get_mut(id)?;
    match &mut record.kind {
        ResultKind::EntryPoint(entry) if entry.function.is_none() => entry.function = Some(data),
        kind @ ResultKind::Unset => *kind = ResultKind::Function(data),
        other => {
            return Err(RuntimeError::IdRedefined {
                id,
                existing: other.name(),
                requested: "Function",
            })
        }
    }
    state.current_function = Some(id);
    tracing::debug!("function {} body starts at word {}", id, inst.end());
    Ok(())
}

fn op_function_parameter(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let type_id = inst.id()?;
    let id = inst.id()?;
    if state.current_function.is_none() {
        return Err(inst.malformed("parameter outside a function"));
    }
    let size = state.table.size_of(type_id)?;
    define_constant(state, id, type_id, vec![0u8; size].into_boxed_slice())
}

fn op_function_end(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let id = state
        .current_function
        .take()
        .ok_or_else(|| inst.malformed("OpFunctionEnd outside a function"))?;
    if let Some(function) = state.table.get_mut(id)?.kind.function_mut() {
        function.body_end = Some(inst.offset);
    }
    tracing::debug!("function {} ends at word {}", id, inst.offset);
    Ok(())
}

fn op_label(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let id = inst.id()?;
    if state.current_function.is_none() {
        return Err(inst.malformed("label outside a function"));
    }
    state
        .table
        .define(id, ResultKind::BlockLabel { offset: inst.offset })
}
