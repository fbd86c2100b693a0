//! Instruction formatting to assembly text
//!
//! The output is accepted by the assembler: enumerants are spelled by name
//! only when the name parses back to the same value, and floats that have no
//! exact decimal spelling are written as hex bits.

use spirv_vm_spec::{GlslStd450, Word};

use crate::decoder::{DecodedInstruction, DecodedOperand, Scalar};

/// Format an instruction without its result ID
pub fn format(inst: &DecodedInstruction) -> String {
    let Some(op) = inst.op else {
        let words: Vec<String> = inst.operands.iter().map(format_operand).collect();
        return format!("; unsupported opcode {}: {}", inst.opcode, words.join(" "))
            .trim_end()
            .to_string();
    };
    let mut out = op.name().to_string();
    for operand in &inst.operands {
        out.push(' ');
        out.push_str(&format_operand(operand));
    }
    out
}

pub fn format_operand(operand: &DecodedOperand) -> String {
    match operand {
        DecodedOperand::Id(id) => format!("%{id}"),
        DecodedOperand::Literal(value) => value.to_string(),
        DecodedOperand::Str(text) => quote(text),
        DecodedOperand::Enum(kind, value) => kind
            .name_of(*value)
            .filter(|name| kind.value_of(name) == Some(*value))
            .unwrap_or_else(|| value.to_string()),
        DecodedOperand::ExtInst { glsl, instruction } => {
            match glsl.then(|| GlslStd450::from_u32(*instruction)).flatten() {
                Some(known) => known.name().to_string(),
                None => instruction.to_string(),
            }
        }
        DecodedOperand::Constant { scalar, words } => format_constant(*scalar, words),
    }
}

/// Format a constant's value words for its scalar type
pub fn format_constant(scalar: Option<Scalar>, words: &[Word]) -> String {
    match (scalar, words) {
        (Some(Scalar::Float(32)), &[bits]) => format_f32(bits),
        (Some(Scalar::Float(64)), &[lo, hi]) => format_f64(join(lo, hi)),
        (Some(Scalar::Int { signed: true, .. }), &[word]) => (word as i32).to_string(),
        (Some(Scalar::Int { signed: true, .. }), &[lo, hi]) => (join(lo, hi) as i64).to_string(),
        (Some(Scalar::Int { signed: false, .. }), &[lo, hi]) => {
            let value = join(lo, hi);
            if i64::try_from(value).is_ok() {
                value.to_string()
            } else {
                format!("{value:#x}")
            }
        }
        (Some(Scalar::Int { .. }), &[word]) => word.to_string(),
        _ => words
            .iter()
            .map(|word| format!("{word:#x}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn join(lo: Word, hi: Word) -> u64 {
    u64::from(lo) | (u64::from(hi) << 32)
}

/// Shortest decimal that parses back to the same bits
fn format_f32(bits: u32) -> String {
    let value = f32::from_bits(bits);
    if value.is_finite() {
        format!("{value:?}")
    } else {
        format!("{bits:#x}")
    }
}

fn format_f64(bits: u64) -> String {
    let value = f64::from_bits(bits);
    if value.is_finite() {
        format!("{value:?}")
    } else {
        format!("{bits:#x}")
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
