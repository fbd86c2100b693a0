//! # Decorations
//!
//! Decoration kinds and the number of literal operands each one carries after
//! the kind word in `OpDecorate`/`OpMemberDecorate`.

spirv_enum! {
    /// Decoration kinds the VM names explicitly
    ///
    /// Other kinds are still accepted by the runtime as raw numbers.
    Decoration {
        RelaxedPrecision = 0,
        SpecId = 1,
        Block = 2,
        BufferBlock = 3,
        RowMajor = 4,
        ColMajor = 5,
        ArrayStride = 6,
        MatrixStride = 7,
        GLSLShared = 8,
        GLSLPacked = 9,
        CPacked = 10,
        BuiltIn = 11,
        NoPerspective = 13,
        Flat = 14,
        Patch = 15,
        Centroid = 16,
        Sample = 17,
        Invariant = 18,
        Restrict = 19,
        Aliased = 20,
        Volatile = 21,
        Constant = 22,
        Coherent = 23,
        NonWritable = 24,
        NonReadable = 25,
        Uniform = 26,
        UniformId = 27,
        SaturatedConversion = 28,
        Stream = 29,
        Location = 30,
        Component = 31,
        Index = 32,
        Binding = 33,
        DescriptorSet = 34,
        Offset = 35,
        XfbBuffer = 36,
        XfbStride = 37,
        FuncParamAttr = 38,
        FPRoundingMode = 39,
        FPFastMathMode = 40,
        LinkageAttributes = 41,
        NoContraction = 42,
        InputAttachmentIndex = 43,
        Alignment = 44,
        MaxByteOffset = 45,
        AlignmentId = 46,
        MaxByteOffsetId = 47,
    }
}

impl Decoration {
    /// Number of literal words following the kind word
    #[inline]
    pub const fn literal_count(self) -> usize {
        literals_for(self as u32)
    }
}

/// Number of literal words trailing a decoration of raw kind `kind`
///
/// `LinkageAttributes` is counted as two literals: the name string and the
/// linkage type. The name may span several words, so a reader must decode it
/// as a string rather than take the count as a word count.
pub const fn literals_for(kind: u32) -> usize {
    match kind {
        // SpecId, ArrayStride, MatrixStride, BuiltIn
        1 | 6 | 7 | 11 => 1,
        // UniformId, Stream, Location, Component, Index, Binding, DescriptorSet, Offset
        27 | 29..=35 => 1,
        // XfbBuffer, XfbStride, FuncParamAttr, FPRoundingMode, FPFastMathMode
        36..=40 => 1,
        // LinkageAttributes
        41 => 2,
        // InputAttachmentIndex, Alignment, MaxByteOffset, AlignmentId, MaxByteOffsetId
        43..=47 => 1,
        _ => 0,
    }
}
