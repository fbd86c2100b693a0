//! # GLSL.std.450 Extended Instructions
//!
//! Float built-ins evaluated in the result type's width: double precision
//! for 8-byte components, single precision otherwise. Vector operands are
//! processed component by component.

use spirv_vm_spec::{GlslStd450, Id};

use crate::dispatch::{ExtCall, ExtHandler, ExtendedTable, Instruction};
use crate::error::Result;
use crate::execute::store_value;
use crate::state::VMState;
use crate::value::{self, by_width, Float};
use crate::vm::Context;

pub(crate) fn register(table: &mut ExtendedTable) {
    let handlers: [(GlslStd450, ExtHandler); 15] = [
        (GlslStd450::FAbs, fabs),
        (GlslStd450::Floor, floor),
        (GlslStd450::Ceil, ceil),
        (GlslStd450::Fract, fract),
        (GlslStd450::Sqrt, sqrt),
        (GlslStd450::InverseSqrt, inverse_sqrt),
        (GlslStd450::Pow, pow),
        (GlslStd450::FMin, fmin),
        (GlslStd450::FMax, fmax),
        (GlslStd450::FClamp, fclamp),
        (GlslStd450::FMix, fmix),
        (GlslStd450::Length, length),
        (GlslStd450::Distance, distance),
        (GlslStd450::Cross, cross),
        (GlslStd450::Normalize, normalize),
    ];
    for (instruction, handler) in handlers {
        table.register_glsl(instruction.to_u32(), handler);
    }
}

/// Read `N` operand IDs
fn operand_ids<const N: usize>(inst: &mut Instruction<'_>) -> Result<[Id; N]> {
    let mut ids = [0; N];
    for id in ids.iter_mut() {
        *id = inst.id()?;
    }
    Ok(ids)
}

/// Operand payloads, in order
fn operands<'s, const N: usize>(state: &'s VMState<'_>, ids: [Id; N]) -> Result<[&'s [u8]; N]> {
    let mut out: [&'s [u8]; N] = [&[]; N];
    for (slot, id) in out.iter_mut().zip(ids) {
        *slot = &state.table.value(id)?.bytes;
    }
    Ok(out)
}

// ============================================================================
// Component-wise
// ============================================================================

#[derive(Clone, Copy, Debug)]
enum Unary {
    Abs,
    Floor,
    Ceil,
    Fract,
    Sqrt,
    InverseSqrt,
}

impl Unary {
    #[inline]
    fn apply<T: Float>(self, x: T) -> T {
        match self {
            Unary::Abs => x.abs(),
            Unary::Floor => x.floor(),
            Unary::Ceil => x.ceil(),
            Unary::Fract => x - x.floor(),
            Unary::Sqrt => x.sqrt(),
            Unary::InverseSqrt => T::ONE / x.sqrt(),
        }
    }
}

fn unary(state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>, op: Unary) -> Result<()> {
    let ids = operand_ids::<1>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| value::map1::<T>(x, |v| op.apply(v)));
    store_value(state, call.result_id, call.result_type, bytes)
}

fn fabs(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    unary(state, call, inst, Unary::Abs)
}

fn floor(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    unary(state, call, inst, Unary::Floor)
}

fn ceil(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    unary(state, call, inst, Unary::Ceil)
}

fn fract(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    unary(state, call, inst, Unary::Fract)
}

fn sqrt(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    unary(state, call, inst, Unary::Sqrt)
}

fn inverse_sqrt(
    _: &Context,
    state: &mut VMState<'_>,
    call: &ExtCall,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    unary(state, call, inst, Unary::InverseSqrt)
}

#[derive(Clone, Copy, Debug)]
enum Binary {
    Pow,
    Min,
    Max,
}

impl Binary {
    #[inline]
    fn apply<T: Float>(self, x: T, y: T) -> T {
        match self {
            Binary::Pow => x.powf(y),
            Binary::Min => value::fmin(x, y),
            Binary::Max => value::fmax(x, y),
        }
    }
}

fn binary(state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>, op: Binary) -> Result<()> {
    let ids = operand_ids::<2>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x, y] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        value::map2::<T>(x, y, |a, b| op.apply(a, b))
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

fn pow(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    binary(state, call, inst, Binary::Pow)
}

fn fmin(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    binary(state, call, inst, Binary::Min)
}

fn fmax(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    binary(state, call, inst, Binary::Max)
}

/// `min(max(x, minVal), maxVal)`
fn fclamp(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    let ids = operand_ids::<3>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x, lo, hi] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        value::map3::<T>(x, lo, hi, value::fclamp)
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

/// `x * (1 - a) + y * a`
fn fmix(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    let ids = operand_ids::<3>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x, y, a] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        value::map3::<T>(x, y, a, |x, y, a| x * (T::ONE - a) + y * a)
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

// ============================================================================
// Geometric
// ============================================================================

fn length(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    let ids = operand_ids::<1>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        value::lane_count::<T>(x).map(|_| value::encode(&[value::length(&value::decode::<T>(x))]))
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

fn distance(
    _: &Context,
    state: &mut VMState<'_>,
    call: &ExtCall,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let ids = operand_ids::<2>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [p0, p1] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        value::map2::<T>(p0, p1, |a, b| a - b)
            .map(|diff| value::encode(&[value::length(&value::decode::<T>(&diff))]))
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

fn normalize(
    _: &Context,
    state: &mut VMState<'_>,
    call: &ExtCall,
    inst: &mut Instruction<'_>,
) -> Result<()> {
    let ids = operand_ids::<1>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        let len = value::length(&value::decode::<T>(x));
        value::map1::<T>(x, |v| v / len)
    });
    store_value(state, call.result_id, call.result_type, bytes)
}

fn cross(_: &Context, state: &mut VMState<'_>, call: &ExtCall, inst: &mut Instruction<'_>) -> Result<()> {
    let ids = operand_ids::<2>(inst)?;
    let width = state.table.float_width(call.result_type)?;
    let [x, y] = operands(state, ids)?;
    let bytes = by_width!(width, call.result_type, |T| {
        match (value::decode::<T>(x).as_slice(), value::decode::<T>(y).as_slice()) {
            (&[x0, x1, x2], &[y0, y1, y2]) if x.len() == y.len() => Some(value::encode(&[
                x1 * y2 - y1 * x2,
                x2 * y0 - y2 * x0,
                x0 * y1 - y0 * x1,
            ])),
            _ => None,
        }
    });
    store_value(state, call.result_id, call.result_type, bytes)
}
