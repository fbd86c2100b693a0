//! # GLSL.std.450 Extended Instructions
//!
//! Instruction numbers of the `GLSL.std.450` extended set that the VM
//! evaluates. They are the literal operand following the set ID in `OpExtInst`.

/// Import name of the set, as written in `OpExtInstImport`
pub const SET_NAME: &str = "GLSL.std.450";

spirv_enum! {
    GlslStd450 {
        FAbs = 4,
        Floor = 8,
        Ceil = 9,
        Fract = 10,
        Pow = 26,
        Sqrt = 31,
        InverseSqrt = 32,
        FMin = 37,
        FMax = 40,
        FClamp = 43,
        FMix = 46,
        Length = 66,
        Distance = 67,
        Cross = 68,
        Normalize = 69,
    }
}

impl GlslStd450 {
    /// Number of operand IDs the instruction takes
    pub const fn arity(self) -> usize {
        match self {
            GlslStd450::FAbs
            | GlslStd450::Floor
            | GlslStd450::Ceil
            | GlslStd450::Fract
            | GlslStd450::Sqrt
            | GlslStd450::InverseSqrt
            | GlslStd450::Length
            | GlslStd450::Normalize => 1,
            GlslStd450::Pow
            | GlslStd450::FMin
            | GlslStd450::FMax
            | GlslStd450::Distance
            | GlslStd450::Cross => 2,
            GlslStd450::FClamp | GlslStd450::FMix => 3,
        }
    }
}
