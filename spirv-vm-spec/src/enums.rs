//! # Enumerants
//!
//! Operand enumerations used by the mode-setting and memory instructions.
//! Values follow the Khronos SPIR-V registry; the VM only names the ones it
//! reports or acts on.

spirv_enum! {
    /// Where a pointer's storage lives
    StorageClass {
        UniformConstant = 0,
        Input = 1,
        Uniform = 2,
        Output = 3,
        Workgroup = 4,
        CrossWorkgroup = 5,
        Private = 6,
        Function = 7,
        Generic = 8,
        PushConstant = 9,
        AtomicCounter = 10,
        Image = 11,
        StorageBuffer = 12,
    }
}

impl StorageClass {
    /// Check if a shader may write through pointers of this class
    pub const fn is_writable(self) -> bool {
        !matches!(self, StorageClass::Input | StorageClass::UniformConstant)
    }

    /// Check if variables of this class are bound to interface locations
    pub const fn is_interface(self) -> bool {
        matches!(self, StorageClass::Input | StorageClass::Output)
    }
}

spirv_enum! {
    /// Pipeline stage an entry point is written for
    ExecutionModel {
        Vertex = 0,
        TessellationControl = 1,
        TessellationEvaluation = 2,
        Geometry = 3,
        Fragment = 4,
        GLCompute = 5,
        Kernel = 6,
    }
}

spirv_enum! {
    AddressingModel {
        Logical = 0,
        Physical32 = 1,
        Physical64 = 2,
    }
}

spirv_enum! {
    MemoryModel {
        Simple = 0,
        GLSL450 = 1,
        OpenCL = 2,
        Vulkan = 3,
    }
}

spirv_enum! {
    Capability {
        Matrix = 0,
        Shader = 1,
        Geometry = 2,
        Tessellation = 3,
        Addresses = 4,
        Linkage = 5,
        Kernel = 6,
        Vector16 = 7,
        Float16Buffer = 8,
        Float16 = 9,
        Float64 = 10,
        Int64 = 11,
        Int64Atomics = 12,
        ImageBasic = 13,
        Int16 = 22,
        TessellationPointSize = 23,
        GeometryPointSize = 24,
        ImageGatherExtended = 25,
        StorageImageMultisample = 27,
        ClipDistance = 32,
        CullDistance = 33,
        SampleRateShading = 35,
        Int8 = 39,
        InputAttachment = 40,
        Sampled1D = 43,
        Image1D = 44,
        SampledBuffer = 46,
        ImageQuery = 50,
        DerivativeControl = 51,
    }
}

spirv_enum! {
    ExecutionMode {
        Invocations = 0,
        SpacingEqual = 1,
        SpacingFractionalEven = 2,
        SpacingFractionalOdd = 3,
        VertexOrderCw = 4,
        VertexOrderCcw = 5,
        PixelCenterInteger = 6,
        OriginUpperLeft = 7,
        OriginLowerLeft = 8,
        EarlyFragmentTests = 9,
        PointMode = 10,
        Xfb = 11,
        DepthReplacing = 12,
        DepthGreater = 14,
        DepthLess = 15,
        DepthUnchanged = 16,
        LocalSize = 17,
        LocalSizeHint = 18,
    }
}

spirv_enum! {
    SourceLanguage {
        Unknown = 0,
        ESSL = 1,
        GLSL = 2,
        OpenCL_C = 3,
        OpenCL_CPP = 4,
        HLSL = 5,
    }
}

spirv_enum! {
    /// Single bits of the `OpFunction` control mask
    FunctionControl {
        None = 0,
        Inline = 1,
        DontInline = 2,
        Pure = 4,
        Const = 8,
    }
}

impl FunctionControl {
    /// Spell a control mask as `None` or `Inline|Pure`
    pub fn format_mask(mask: u32) -> String {
        if mask == 0 {
            return FunctionControl::None.name().to_string();
        }
        let mut parts: Vec<String> = FunctionControl::ALL
            .iter()
            .filter(|bit| bit.to_u32() != 0 && mask & bit.to_u32() != 0)
            .map(|bit| bit.name().to_string())
            .collect();
        let unknown = mask & !0xF;
        if unknown != 0 {
            parts.push(format!("{unknown:#x}"));
        }
        parts.join("|")
    }

    /// Parse `None`, a single bit name or a `|`-separated list of them
    pub fn parse_mask(text: &str) -> Option<u32> {
        text.split('|')
            .map(|part| FunctionControl::from_name(part.trim()).map(FunctionControl::to_u32))
            .try_fold(0u32, |acc, bit| bit.map(|b| acc | b))
    }
}
