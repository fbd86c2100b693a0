//! Execution handlers
//!
//! Runtime instructions of a function body. Every result is stored as a
//! value record and replaced wholesale on the next call.

use spirv_vm_spec::{Id, Op, StorageClass};

use crate::dispatch::{DispatchTable, ExtCall, Instruction};
use crate::error::{Result, RuntimeError};
use crate::record::{ConstantData, ResultKind};
use crate::setup::{create_variable, drain, fold_composite};
use crate::state::VMState;
use crate::table::ResultTable;
use crate::value::{self, by_width, Float};
use crate::vm::Context;

pub(crate) fn register(table: &mut DispatchTable) {
    table
        .register(Op::Nop, drain)
        .register(Op::Line, drain)
        .register(Op::NoLine, drain)
        .register(Op::FunctionParameter, drain)
        .register(Op::Label, op_label)
        .register(Op::Return, op_return)
        .register(Op::Variable, op_variable)
        .register(Op::Load, op_load)
        .register(Op::Store, op_store)
        .register(Op::CompositeConstruct, op_composite_construct)
        .register(Op::CompositeExtract, op_composite_extract)
        .register(Op::FNegate, op_fnegate)
        .register(Op::FAdd, op_fadd)
        .register(Op::FSub, op_fsub)
        .register(Op::FMul, op_fmul)
        .register(Op::FDiv, op_fdiv)
        .register(Op::VectorTimesScalar, op_vector_times_scalar)
        .register(Op::Dot, op_dot)
        .register(Op::ExtInst, op_ext_inst);
}

/// Store a computed value after checking it against its result type
pub(crate) fn store_value(
    state: &mut VMState<'_>,
    id: Id,
    type_id: Id,
    bytes: Option<Box<[u8]>>,
) -> Result<()> {
    let bytes = bytes.ok_or_else(|| {
        RuntimeError::mismatch(id, "operands shaped like the result", "mismatched operands")
    })?;
    let expected = state.table.size_of(type_id)?;
    if bytes.len() != expected {
        return Err(RuntimeError::mismatch(
            id,
            format!("{expected}-byte result"),
            format!("{} bytes", bytes.len()),
        ));
    }
    tracing::trace!("%{} = {:02x?}", id, bytes);
    state
        .table
        .replace(id, ResultKind::Constant(ConstantData { type_id, bytes }))
}

/// Location decoration of an interface variable
fn interface_location(table: &ResultTable, id: Id) -> Result<u32> {
    table
        .get(id)?
        .location()
        .ok_or(RuntimeError::MissingLocation { id })
}

fn op_label(_: &Context, _: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    inst.id()?;
    Ok(())
}

fn op_return(_: &Context, _: &mut VMState<'_>, _: &mut Instruction<'_>) -> Result<()> {
    Ok(())
}

fn op_variable(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let (id, kind) = create_variable(state, inst)?;
    state.table.replace(id, kind)
}

// ============================================================================
// Memory
// ============================================================================

fn op_load(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let pointer = inst.id()?;
    inst.optional();

    let expected = state.table.size_of(result_type)?;
    let variable = state.table.variable(pointer)?;
    let bytes: Box<[u8]> = if variable.storage == StorageClass::Input {
        let location = interface_location(&state.table, pointer)?;
        let input = state.slots.input(location)?;
        if input.len() < expected {
            return Err(RuntimeError::InputTooShort {
                location,
                expected,
                actual: input.len(),
            });
        }
        input[..expected].into()
    } else {
        if variable.data.len() != expected {
            return Err(RuntimeError::mismatch(
                pointer,
                format!("pointer to {expected} bytes"),
                format!("pointer to {} bytes", variable.data.len()),
            ));
        }
        variable.data.clone()
    };
    store_value(state, result, result_type, Some(bytes))
}

fn op_store(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let pointer = inst.id()?;
    let object = inst.id()?;
    inst.optional();

    let value = state.table.value(object)?.bytes.clone();
    let location = state.table.get(pointer)?.location();
    let variable = state.table.variable_mut(pointer)?;
    if !variable.storage.is_writable() {
        return Err(RuntimeError::ReadOnlyStorage {
            id: pointer,
            storage: variable.storage,
        });
    }
    if variable.data.len() != value.len() {
        return Err(RuntimeError::mismatch(
            object,
            format!("{}-byte value", variable.data.len()),
            format!("{} bytes", value.len()),
        ));
    }
    variable.data.copy_from_slice(&value);

    if variable.storage == StorageClass::Output {
        if let Some(location) = location {
            state.slots.write_output(location, &value)?;
        }
    }
    Ok(())
}

// ============================================================================
// Composites
// ============================================================================

fn op_composite_construct(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let bytes = fold_composite(state, result, result_type, inst.rest())?;
    store_value(state, result, result_type, Some(bytes))
}

/// Walk `indices` down the type hierarchy to a byte range of the composite
fn op_composite_extract(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let composite = inst.id()?;
    let indices = inst.rest();

    let source = state.table.value(composite)?;
    let mut type_id = source.type_id;
    let mut offset = 0;
    let mut size = source.bytes.len();
    for &index in indices {
        let ty = state.table.type_of(type_id)?;
        let (member, member_offset) = ty.member(index).ok_or_else(|| {
            RuntimeError::mismatch(
                composite,
                format!("composite with member {index}"),
                format!("{} of {} members", ty.data_kind(), ty.element_count()),
            )
        })?;
        offset += member_offset;
        size = member.size;
        type_id = member.type_id;
    }

    let bytes: Box<[u8]> = source
        .bytes
        .get(offset..offset + size)
        .ok_or_else(|| {
            RuntimeError::mismatch(
                composite,
                format!("at least {} bytes", offset + size),
                format!("{} bytes", source.bytes.len()),
            )
        })?
        .into();
    store_value(state, result, result_type, Some(bytes))
}

// ============================================================================
// Float Arithmetic
// ============================================================================

#[derive(Clone, Copy, Debug)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    #[inline]
    fn apply<T: Float>(self, x: T, y: T) -> T {
        match self {
            Arith::Add => x + y,
            Arith::Sub => x - y,
            Arith::Mul => x * y,
            Arith::Div => x / y,
        }
    }
}

fn float_binary(state: &mut VMState<'_>, inst: &mut Instruction<'_>, op: Arith) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let a = inst.id()?;
    let b = inst.id()?;

    let width = state.table.float_width(result_type)?;
    let a = &state.table.value(a)?.bytes;
    let b = &state.table.value(b)?.bytes;
    let bytes = by_width!(width, result_type, |T| value::map2::<T>(a, b, |x, y| op.apply(x, y)));
    store_value(state, result, result_type, bytes)
}

fn op_fnegate(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let operand = inst.id()?;

    let width = state.table.float_width(result_type)?;
    let operand = &state.table.value(operand)?.bytes;
    let bytes = by_width!(width, result_type, |T| value::map1::<T>(operand, |x| -x));
    store_value(state, result, result_type, bytes)
}

fn op_fadd(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    float_binary(state, inst, Arith::Add)
}

fn op_fsub(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    float_binary(state, inst, Arith::Sub)
}

fn op_fmul(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    float_binary(state, inst, Arith::Mul)
}

fn op_fdiv(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    float_binary(state, inst, Arith::Div)
}

/// `result[i] = vector[i] * scalar`
fn op_vector_times_scalar(
    _: &Context,
    state: &mut VMState<'_>,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let vector = inst.id()?;
    let scalar = inst.id()?;

    let width = state.table.float_width(result_type)?;
    let vector = &state.table.value(vector)?.bytes;
    let scalar = &state.table.value(scalar)?.bytes;
    let bytes = by_width!(width, result_type, |T| {
        value::scalar::<T>(scalar).and_then(|s| value::map1::<T>(vector, |x| x * s))
    });
    store_value(state, result, result_type, bytes)
}

fn op_dot(_: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let result_type = inst.id()?;
    let result = inst.id()?;
    let a = inst.id()?;
    let b = inst.id()?;

    let width = state.table.float_width(result_type)?;
    let a = &state.table.value(a)?.bytes;
    let b = &state.table.value(b)?.bytes;
    let bytes = by_width!(width, result_type, |T| {
        let same_shape = a.len() == b.len() && value::lane_count::<T>(a).is_some();
        same_shape.then(|| value::encode(&[value::dot(&value::decode::<T>(a), &value::decode::<T>(b))]))
    });
    store_value(state, result, result_type, bytes)
}

// ============================================================================
// Extended Instructions
// ============================================================================

fn op_ext_inst(ctx: &Context, state: &mut VMState<'_>, inst: &mut Instruction<'_>) -> Result<()> {
    let result_type = inst.id()?;
    let result_id = inst.id()?;
    let set_id = inst.id()?;
    let instruction = inst.word()?;

    let set = match &state.table.get(set_id)?.kind {
        ResultKind::ExtInstSet(set) => set.clone(),
        ResultKind::Unset => return Err(RuntimeError::UndefinedId { id: set_id }),
        other => return Err(RuntimeError::mismatch(set_id, "ExtInstSet", other.name())),
    };

    match ctx.extended().get(&set, instruction) {
        Some(handler) => handler(
            ctx,
            state,
            &ExtCall {
                result_type,
                result_id,
            },
            inst,
        ),
        None => {
            inst.drain();
            Err(RuntimeError::UnsupportedExtInst {
                set: set.name().to_string(),
                instruction,
                offset: inst.offset,
            })
        }
    }
}
