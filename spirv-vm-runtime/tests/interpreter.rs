//! Interpreter tests driven by assembled shaders

use proptest::prelude::*;
use spirv_vm_assembler::{assemble, assemble_words};
use spirv_vm_runtime::value::{bytes_f32, f32_bytes};
use spirv_vm_runtime::{Context, ResultKind, RuntimeError, VMConfig};
use spirv_vm_spec::{
    encode_header, encode_string, Decoration, ExecutionModel, Module, ModuleHeader, Op, Word,
    MAX_BOUND,
};

const PRELUDE: &str = r#"
               OpCapability Shader
        %std = OpExtInstImport "GLSL.std.450"
               OpMemoryModel Logical GLSL450
"#;

/// Fragment shader: `out = clamp(in * 2, 0, 1)`
const CLAMP_SHADER: &str = r#"
               OpCapability Shader
        %std = OpExtInstImport "GLSL.std.450"
               OpMemoryModel Logical GLSL450
               OpEntryPoint Fragment %main "main" %in_color %out_color
               OpExecutionMode %main OriginUpperLeft
               OpName %main "main"
               OpDecorate %in_color Location 0
               OpDecorate %out_color Location 0
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
      %float = OpTypeFloat 32
    %v3float = OpTypeVector %float 3
  %ptr_in_v3 = OpTypePointer Input %v3float
 %ptr_out_v3 = OpTypePointer Output %v3float
   %in_color = OpVariable %ptr_in_v3 Input
  %out_color = OpVariable %ptr_out_v3 Output
    %float_0 = OpConstant %float 0.0
    %float_1 = OpConstant %float 1.0
    %float_2 = OpConstant %float 2.0
         %lo = OpConstantComposite %v3float %float_0 %float_0 %float_0
         %hi = OpConstantComposite %v3float %float_1 %float_1 %float_1
       %main = OpFunction %void None %fn_void
      %entry = OpLabel
          %c = OpLoad %v3float %in_color
          %s = OpVectorTimesScalar %v3float %c %float_2
          %r = OpExtInst %v3float %std FClamp %s %lo %hi
               OpStore %out_color %r
               OpReturn
               OpFunctionEnd
"#;

fn run_clamp(ctx: &Context, module: &Module, input: &[f32]) -> Vec<f32> {
    let mut state = ctx.create_state(module).unwrap();
    state.add_input_data(0, f32_bytes(input)).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    bytes_f32(state.read_output_data(0).unwrap())
}

/// Wrap a body in a fragment entry point writing a vec3 to location 0
fn vec3_shader(constants: &str, body: &str) -> String {
    format!(
        r#"{PRELUDE}
               OpEntryPoint Fragment %main "main" %out
               OpDecorate %out Location 0
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
      %float = OpTypeFloat 32
    %v3float = OpTypeVector %float 3
    %ptr_out = OpTypePointer Output %v3float
        %out = OpVariable %ptr_out Output
{constants}
       %main = OpFunction %void None %fn_void
      %entry = OpLabel
{body}
               OpReturn
               OpFunctionEnd
"#
    )
}

/// Splice an instruction in front of the first instruction with `opcode`
fn splice_before(words: &[Word], opcode: u16, inserted: &[Word]) -> Vec<Word> {
    let mut offset = spirv_vm_spec::HEADER_WORDS;
    while offset < words.len() {
        if (words[offset] & 0xFFFF) as u16 == opcode {
            let mut out = words[..offset].to_vec();
            out.extend_from_slice(inserted);
            out.extend_from_slice(&words[offset..]);
            return out;
        }
        offset += (words[offset] >> 16) as usize;
    }
    panic!("opcode {opcode} not found");
}

// ============================================================================
// Setup
// ============================================================================

#[test]
fn test_float_constant_payload() {
    let module = assemble(&format!(
        "{PRELUDE}\n%10 = OpTypeFloat 32\n%11 = OpConstant %10 1.5\n%12 = OpConstant %10 0x3FC00000"
    ))
    .unwrap();
    let state = Context::default().create_state(&module).unwrap();
    for id in [11, 12] {
        let constant = state.table().value(id).unwrap();
        assert_eq!(constant.type_id, 10);
        assert_eq!(&*constant.bytes, &0x3FC0_0000u32.to_le_bytes());
    }
}

#[test]
fn test_composite_constant_concatenates_members() {
    let module = assemble(&format!(
        r#"{PRELUDE}
        %10 = OpTypeFloat 32
        %11 = OpTypeVector %10 3
        %12 = OpConstant %10 1.0
        %13 = OpConstant %10 2.0
        %14 = OpConstant %10 3.0
        %15 = OpConstantComposite %11 %12 %13 %14
        "#
    ))
    .unwrap();
    let state = Context::default().create_state(&module).unwrap();
    let composite = state.table().value(15).unwrap();
    assert_eq!(composite.bytes.len(), 12);
    assert_eq!(bytes_f32(&composite.bytes), vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_identical_names_allocate_once() {
    let module = assemble(&format!(
        r#"{PRELUDE}
               OpName %10 "color"
               OpName %10 "color"
        %10 = OpTypeFloat 32
        "#
    ))
    .unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert_eq!(state.name_allocations(), 1);
    assert_eq!(state.name_of(10), Some("color"));

    let module = assemble(&format!(
        r#"{PRELUDE}
               OpName %10 "color"
               OpName %10 "tint"
        %10 = OpTypeFloat 32
        "#
    ))
    .unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert_eq!(state.name_allocations(), 2);
    assert_eq!(state.name_of(10), Some("tint"));
}

#[test]
fn test_entry_point_name_shared_with_op_name() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert_eq!(state.name_allocations(), 1);
    let id = state.table().find_entry_point("main").unwrap();
    assert!(matches!(state.record(id).unwrap().kind, ResultKind::EntryPoint(_)));
}

#[test]
fn test_function_declared_as_two_entry_points() {
    let module = assemble(&format!(
        r#"{PRELUDE}
               OpEntryPoint Fragment %main "main" %out
               OpEntryPoint GLCompute %main "main_cs"
               OpDecorate %out Location 0
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
      %float = OpTypeFloat 32
    %ptr_out = OpTypePointer Output %float
        %out = OpVariable %ptr_out Output
        %one = OpConstant %float 1.0
       %main = OpFunction %void None %fn_void
      %entry = OpLabel
               OpStore %out %one
               OpReturn
               OpFunctionEnd
        "#
    ))
    .unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();

    let id = state.table().find_entry_point("main").unwrap();
    assert_eq!(state.table().find_entry_point("main_cs"), Some(id));
    match &state.record(id).unwrap().kind {
        ResultKind::EntryPoint(entry) => {
            assert_eq!(entry.models, vec![ExecutionModel::Fragment, ExecutionModel::GLCompute]);
            assert_eq!(entry.names.len(), 2);
            assert!(entry.function.is_some());
        }
        other => panic!("expected an entry point, got {}", other.name()),
    }

    for name in ["main", "main_cs"] {
        let summary = ctx.call_entry_point_by_name(&mut state, name).unwrap();
        assert_eq!(summary.entry_point, id);
        assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![1.0]);
    }
}

#[test]
fn test_header_bound_does_not_size_the_table() {
    let module = Module::from_words(&ModuleHeader::new(MAX_BOUND, 0).to_words()).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert_eq!(state.table().bound(), MAX_BOUND);
    assert_eq!(state.table().materialized(), 0);
    assert!(state.record(MAX_BOUND - 1).unwrap().is_unset());

    // Only IDs the stream touches get a record
    let mut words = assemble_words(&format!("{PRELUDE}\n%10 = OpTypeFloat 32")).unwrap();
    words[3] = MAX_BOUND;
    let module = Module::from_words(&words).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert_eq!(state.table().materialized(), 2);
}

#[test]
fn test_linkage_name_spans_several_words() {
    let words = assemble_words(&format!("{PRELUDE}\n%10 = OpTypeFloat 32")).unwrap();
    let name = encode_string("exported_function");
    let mut decorate = vec![10, Decoration::LinkageAttributes.to_u32()];
    decorate.extend_from_slice(&name);
    // Export
    decorate.push(0);
    decorate.insert(0, encode_header(Op::Decorate.to_u16(), decorate.len() as u16 + 1));
    let words = splice_before(&words, Op::TypeFloat.to_u16(), &decorate);

    let module = Module::from_words(&words).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    let decoration = state.record(10).unwrap().decorations[0];
    assert_eq!(decoration.kind, Decoration::LinkageAttributes.to_u32());
    assert_eq!(decoration.literals, [u32::from_le_bytes(*b"expo"), 0]);
}

#[test]
fn test_redefined_id_is_rejected() {
    let module = assemble(&format!("{PRELUDE}\n%10 = OpTypeFloat 32\n%10 = OpTypeFloat 64")).unwrap();
    assert!(matches!(
        Context::default().create_state(&module),
        Err(RuntimeError::IdRedefined { id: 10, .. })
    ));
}

#[test]
fn test_id_beyond_bound_is_rejected() {
    let mut words = assemble_words(&format!("{PRELUDE}\n%10 = OpTypeFloat 32")).unwrap();
    // Shrink the bound below the largest ID
    words[3] = 5;
    let module = Module::from_words(&words).unwrap();
    assert!(matches!(
        Context::default().create_state(&module),
        Err(RuntimeError::IdOutOfRange { bound: 5, .. })
    ));
}

#[test]
fn test_decoration_overflow() {
    let decorations = "OpDecorate %10 RelaxedPrecision\n".repeat(9);
    let module = assemble(&format!("{PRELUDE}\n{decorations}\n%10 = OpTypeFloat 32")).unwrap();
    assert!(matches!(
        Context::default().create_state(&module),
        Err(RuntimeError::TooManyDecorations { id: 10, max: 8 })
    ));

    let ctx = Context::new(VMConfig {
        max_decorations: 16,
        ..VMConfig::default()
    });
    let state = ctx.create_state(&module).unwrap();
    assert_eq!(state.record(10).unwrap().decorations.len(), 9);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_clamp_shader() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();
    assert_eq!(run_clamp(&ctx, &module, &[0.25, -1.0, 3.0]), vec![0.5, 0.0, 1.0]);
}

#[test]
fn test_fclamp_components() {
    let constants = r#"
          %c5 = OpConstant %float 5.0
          %cm = OpConstant %float -1.0
          %c2 = OpConstant %float 2.0
          %c0 = OpConstant %float 0.0
          %c3 = OpConstant %float 3.0
           %x = OpConstantComposite %v3float %c5 %cm %c2
          %lo = OpConstantComposite %v3float %c0 %c0 %c0
          %hi = OpConstantComposite %v3float %c3 %c3 %c3
    "#;
    let body = r#"
           %r = OpExtInst %v3float %std FClamp %x %lo %hi
                OpStore %out %r
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![3.0, 0.0, 2.0]);
}

#[test]
fn test_vector_times_scalar() {
    let constants = r#"
          %c2 = OpConstant %float 2.0
          %c3 = OpConstant %float 3.0
          %c4 = OpConstant %float 4.0
           %v = OpConstantComposite %v3float %c2 %c3 %c4
    "#;
    let body = r#"
           %r = OpVectorTimesScalar %v3float %v %c2
                OpStore %out %r
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![4.0, 6.0, 8.0]);
    // Label, VectorTimesScalar, Store, Return
    assert_eq!(summary.instructions_executed, 4);
    assert_eq!(summary.unsupported_opcodes, 0);
}

#[test]
fn test_dot_product() {
    let constants = r#"
          %c0 = OpConstant %float 0.0
          %c1 = OpConstant %float 1.0
           %x = OpConstantComposite %v3float %c1 %c0 %c0
           %y = OpConstantComposite %v3float %c0 %c1 %c0
    "#;
    let body = r#"
          %xy = OpDot %float %x %y
          %xx = OpDot %float %x %x
           %r = OpCompositeConstruct %v3float %xy %xx %c0
                OpStore %out %r
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_arithmetic_and_extract() {
    let constants = r#"
          %c1 = OpConstant %float 1.0
          %c2 = OpConstant %float 2.0
          %c4 = OpConstant %float 4.0
           %v = OpConstantComposite %v3float %c1 %c2 %c4
    "#;
    let body = r#"
           %a = OpCompositeExtract %float %v 2
           %b = OpFAdd %float %a %c1
           %c = OpFSub %float %a %c1
           %d = OpFDiv %float %a %c2
           %e = OpFNegate %float %d
           %f = OpFMul %float %e %b
           %r = OpCompositeConstruct %v3float %b %c %f
                OpStore %out %r
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![5.0, 3.0, -10.0]);
}

#[test]
fn test_double_precision_builtins() {
    let source = format!(
        r#"{PRELUDE}
               OpEntryPoint Fragment %main "main" %out
               OpDecorate %out Location 1
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
     %double = OpTypeFloat 64
    %ptr_out = OpTypePointer Output %double
        %out = OpVariable %ptr_out Output
          %x = OpConstant %double 9.0
       %main = OpFunction %void None %fn_void
      %entry = OpLabel
          %r = OpExtInst %double %std Sqrt %x
               OpStore %out %r
               OpReturn
               OpFunctionEnd
        "#
    );
    let module = assemble(&source).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    let out = state.read_output_data(1).unwrap();
    assert_eq!(out, &3.0f64.to_le_bytes());
}

#[test]
fn test_function_not_physically_last() {
    let source = format!(
        r#"{PRELUDE}
               OpEntryPoint Fragment %main "main" %out
               OpEntryPoint Fragment %other "other" %out
               OpDecorate %out Location 0
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
      %float = OpTypeFloat 32
    %ptr_out = OpTypePointer Output %float
        %out = OpVariable %ptr_out Output
        %one = OpConstant %float 1.0
        %two = OpConstant %float 2.0
       %main = OpFunction %void None %fn_void
         %l1 = OpLabel
               OpStore %out %one
               OpReturn
               OpFunctionEnd
      %other = OpFunction %void None %fn_void
         %l2 = OpLabel
               OpStore %out %two
               OpReturn
               OpFunctionEnd
        "#
    );
    let module = assemble(&source).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();

    let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(summary.instructions_executed, 3);
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![1.0]);

    ctx.call_entry_point_by_name(&mut state, "other").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![2.0]);
}

#[test]
fn test_repeated_calls_are_deterministic() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    state.add_input_data(0, f32_bytes(&[0.1, 0.2, 0.3])).unwrap();

    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    let first = state.read_output_data(0).unwrap().to_vec();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(state.read_output_data(0).unwrap(), first.as_slice());

    let fresh = run_clamp(&ctx, &module, &[0.1, 0.2, 0.3]);
    assert_eq!(f32_bytes(&fresh), first);
}

#[test]
fn test_input_data_is_replaced() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    state.add_input_data(0, f32_bytes(&[0.1, 0.1, 0.1])).unwrap();
    state.add_input_data(0, f32_bytes(&[0.25, 0.0, 0.5])).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![0.5, 0.0, 1.0]);
}

#[test]
fn test_input_errors() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();

    let mut state = ctx.create_state(&module).unwrap();
    assert!(matches!(
        ctx.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::MissingInput { location: 0 })
    ));

    state.add_input_data(0, f32_bytes(&[1.0, 2.0])).unwrap();
    assert!(matches!(
        ctx.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::InputTooShort {
            location: 0,
            expected: 12,
            actual: 8
        })
    ));

    assert!(matches!(
        state.add_input_data(64, vec![0u8; 4]),
        Err(RuntimeError::LocationOutOfRange { location: 64, .. })
    ));
}

#[test]
fn test_input_variable_is_read_only() {
    let source = format!(
        r#"{PRELUDE}
               OpEntryPoint Fragment %main "main" %in
               OpDecorate %in Location 0
       %void = OpTypeVoid
    %fn_void = OpTypeFunction %void
      %float = OpTypeFloat 32
     %ptr_in = OpTypePointer Input %float
         %in = OpVariable %ptr_in Input
        %one = OpConstant %float 1.0
       %main = OpFunction %void None %fn_void
      %entry = OpLabel
               OpStore %in %one
               OpReturn
               OpFunctionEnd
        "#
    );
    let module = assemble(&source).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    assert!(matches!(
        ctx.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::ReadOnlyStorage { .. })
    ));
}

#[test]
fn test_function_scope_variable() {
    let constants = r#"
    %ptr_fn = OpTypePointer Function %v3float
        %c1 = OpConstant %float 1.0
         %v = OpConstantComposite %v3float %c1 %c1 %c1
    "#;
    let body = r#"
       %tmp = OpVariable %ptr_fn Function
              OpStore %tmp %v
         %x = OpLoad %v3float %tmp
         %y = OpFAdd %v3float %x %x
              OpStore %out %y
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_no_output_before_first_call() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    assert!(matches!(
        state.read_output_data(0),
        Err(RuntimeError::NoOutputData { location: 0 })
    ));
}

// ============================================================================
// Unsupported Instructions and Limits
// ============================================================================

#[test]
fn test_unknown_opcodes_are_skipped() {
    let words = assemble_words(CLAMP_SHADER).unwrap();
    let unknown = [encode_header(999, 3), 1, 2];
    // One at module scope, one inside the body
    let words = splice_before(&words, spirv_vm_spec::Op::TypeVoid.to_u16(), &unknown);
    let words = splice_before(&words, spirv_vm_spec::Op::Return.to_u16(), &unknown);
    let module = Module::from_words(&words).unwrap();

    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    assert_eq!(state.stats().setup_unsupported, 2);

    state.add_input_data(0, f32_bytes(&[0.25, 0.25, 0.25])).unwrap();
    let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(summary.unsupported_opcodes, 1);
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![0.5, 0.5, 0.5]);
}

#[test]
fn test_strict_mode_rejects_unknown_opcodes() {
    let words = assemble_words(CLAMP_SHADER).unwrap();
    let words = splice_before(
        &words,
        spirv_vm_spec::Op::TypeVoid.to_u16(),
        &[encode_header(999, 1)],
    );
    let module = Module::from_words(&words).unwrap();
    let ctx = Context::new(VMConfig {
        strict_opcodes: true,
        ..VMConfig::default()
    });
    assert!(matches!(
        ctx.create_state(&module),
        Err(RuntimeError::UnsupportedOpcode { opcode: 999, .. })
    ));
}

#[test]
fn test_unsupported_ext_inst_is_skipped() {
    let constants = r#"
          %c1 = OpConstant %float 1.5
           %v = OpConstantComposite %v3float %c1 %c1 %c1
    "#;
    let body = r#"
           %r = OpExtInst %v3float %std 1 %v
                OpStore %out %v
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();

    let ctx = Context::default();
    let mut state = ctx.create_state(&module).unwrap();
    let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(summary.unsupported_opcodes, 1);
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![1.5, 1.5, 1.5]);

    let strict = Context::new(VMConfig {
        strict_opcodes: true,
        ..VMConfig::default()
    });
    let mut state = strict.create_state(&module).unwrap();
    assert!(matches!(
        strict.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::UnsupportedExtInst { .. })
    ));
}

#[test]
fn test_execution_limit() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::new(VMConfig {
        max_instructions: 2,
        ..VMConfig::default()
    });
    let mut state = ctx.create_state(&module).unwrap();
    state.add_input_data(0, f32_bytes(&[0.0, 0.0, 0.0])).unwrap();
    assert!(matches!(
        ctx.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::ExecutionLimitExceeded { limit: 2 })
    ));
}

#[test]
fn test_failed_call_keeps_previous_outputs() {
    let constants = r#"
        %c1 = OpConstant %float 1.0
         %v = OpConstantComposite %v3float %c1 %c1 %c1
    "#;
    let body = r#"
              OpStore %out %v
         %y = OpFAdd %v3float %v %v
              OpStore %out %y
    "#;
    let module = assemble(&vec3_shader(constants, body)).unwrap();
    let full = Context::default();
    // Label and the first store fit; the add does not
    let limited = Context::new(VMConfig {
        max_instructions: 2,
        ..VMConfig::default()
    });

    let mut state = limited.create_state(&module).unwrap();
    assert!(limited.call_entry_point_by_name(&mut state, "main").is_err());
    assert!(matches!(
        state.read_output_data(0),
        Err(RuntimeError::NoOutputData { location: 0 })
    ));

    full.call_entry_point_by_name(&mut state, "main").unwrap();
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![2.0, 2.0, 2.0]);
    assert!(matches!(
        limited.call_entry_point_by_name(&mut state, "main"),
        Err(RuntimeError::ExecutionLimitExceeded { limit: 2 })
    ));
    assert_eq!(bytes_f32(state.read_output_data(0).unwrap()), vec![2.0, 2.0, 2.0]);
}

#[test]
fn test_leftover_operand_words_are_malformed() {
    let words = assemble_words(&format!("{PRELUDE}\n%10 = OpTypeFloat 32")).unwrap();
    let mut words = words;
    let last = words.len() - 3;
    // OpTypeFloat with one extra word
    words[last] = encode_header(spirv_vm_spec::Op::TypeFloat.to_u16(), 4);
    words.push(0);
    let module = Module::from_words(&words).unwrap();
    let err = Context::default().create_state(&module).unwrap_err();
    assert!(err.is_fatal());
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_shared_context_across_threads() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();

    let results: Vec<Vec<f32>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ctx = &ctx;
                let module = &module;
                scope.spawn(move || run_clamp(ctx, module, &[0.125 * i as f32, 0.0, 1.0]))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, out) in results.iter().enumerate() {
        assert_eq!(out, &vec![0.25 * i as f32, 0.0, 1.0]);
    }
}

#[test]
fn test_states_are_independent() {
    let module = assemble(CLAMP_SHADER).unwrap();
    let ctx = Context::default();
    let mut a = ctx.create_state(&module).unwrap();
    let mut b = a.clone();
    a.add_input_data(0, f32_bytes(&[0.5, 0.5, 0.5])).unwrap();
    b.add_input_data(0, f32_bytes(&[0.0, 0.0, 0.0])).unwrap();
    ctx.call_entry_point_by_name(&mut a, "main").unwrap();
    ctx.call_entry_point_by_name(&mut b, "main").unwrap();
    assert_eq!(bytes_f32(a.read_output_data(0).unwrap()), vec![1.0, 1.0, 1.0]);
    assert_eq!(bytes_f32(b.read_output_data(0).unwrap()), vec![0.0, 0.0, 0.0]);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(module) = Module::from_bytes(&bytes) {
            let _ = Context::default().create_state(&module);
        }
    }

    #[test]
    fn prop_arbitrary_body_never_panics(body in prop::collection::vec(any::<u32>(), 0..64)) {
        let mut words = ModuleHeader::new(16, 0).to_words().to_vec();
        words.extend(body);
        if let Ok(module) = Module::from_words(&words) {
            let ctx = Context::default();
            if let Ok(mut state) = ctx.create_state(&module) {
                for id in 0..16 {
                    let _ = ctx.call_function(&mut state, id);
                }
            }
        }
    }

    #[test]
    fn prop_clamp_stays_in_range(x in -10.0f32..10.0, y in -10.0f32..10.0, z in -10.0f32..10.0) {
        let module = assemble(CLAMP_SHADER).unwrap();
        let out = run_clamp(&Context::default(), &module, &[x, y, z]);
        for v in out {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }
}
