//! # SPIR-V VM Runtime
//!
//! Interpret straight-line SPIR-V shader entry points on the CPU.
//!
//! A [`Context`] holds the dispatch tables and configuration and is shared by
//! reference. [`Context::create_state`] runs the setup pass over a loaded
//! [`Module`](spirv_vm_spec::Module), producing a [`VMState`] whose result
//! table holds every declared type, constant, variable and function.
//! Entry points are then called by name; each call reads its inputs from the
//! state's input locations and leaves its outputs in the output locations.
//!
//! ## Features
//!
//! - **Types**: void, bool, int, float (32/64-bit arithmetic), vector,
//!   matrix, array, struct, pointer, function
//! - **Execution**: loads and stores, composites, float arithmetic,
//!   `OpVectorTimesScalar`, `OpDot`
//! - **Extended set**: the float subset of GLSL.std.450
//!
//! ## Example
//!
//! ```rust,no_run
//! use spirv_vm_runtime::{Context, VMConfig};
//! use spirv_vm_spec::Module;
//!
//! let bytes = std::fs::read("shader.spv").unwrap();
//! let module = Module::from_bytes(&bytes).unwrap();
//! let ctx = Context::new(VMConfig::default());
//! let mut state = ctx.create_state(&module).unwrap();
//! state.add_input_data(0, 1.0f32.to_le_bytes().to_vec()).unwrap();
//! let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
//! println!("executed {} instructions", summary.instructions_executed);
//! ```

pub mod dispatch;
pub mod error;
mod execute;
mod glsl_std_450;
pub mod io;
pub mod record;
mod setup;
pub mod state;
pub mod table;
pub mod types;
pub mod value;
pub mod vm;

pub use dispatch::{DispatchTable, ExtCall, ExtHandler, ExtendedTable, Instruction, OpHandler};
pub use error::{Result, RuntimeError};
pub use io::{InterfaceSlots, MAX_INPUT_LOCATIONS, MAX_OUTPUT_LOCATIONS};
pub use record::{
    ConstantData, DecorationEntry, EntryPointData, ExtSet, FunctionData, ResultKind, ResultRecord,
    VariableData,
};
pub use state::{Stats, VMState};
pub use table::ResultTable;
pub use types::{DataKind, Member, TypeData};
pub use vm::{handled_ops, Context, ExecutionSummary, VMConfig};

/// Simple execution helper
///
/// Loads `bytes`, binds `inputs` by location, runs entry point `name` once
/// and returns every output location it wrote.
pub fn run_entry_point(
    bytes: &[u8],
    name: &str,
    inputs: &[(u32, &[u8])],
) -> Result<Vec<(u32, Vec<u8>)>> {
    let module = spirv_vm_spec::Module::from_bytes(bytes)?;
    let ctx = Context::default();
    let mut state = ctx.create_state(&module)?;
    for &(location, data) in inputs {
        state.add_input_data(location, data)?;
    }
    ctx.call_entry_point_by_name(&mut state, name)?;
    Ok(state
        .outputs()
        .map(|(location, data)| (location, data.to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_vm_spec::{encode_header, encode_string, Module, Op, MAGIC};

    /// Hand-encoded `void main() {}` fragment shader
    fn minimal_module_words() -> Vec<u32> {
        let mut words = vec![MAGIC, 0x0001_0000, 0, 6, 0];
        words.extend([encode_header(Op::Capability.to_u16(), 2), 1]);
        words.extend([encode_header(Op::MemoryModel.to_u16(), 3), 0, 1]);
        let name = encode_string("main");
        words.push(encode_header(Op::EntryPoint.to_u16(), 3 + name.len() as u16));
        words.extend([4, 1]);
        words.extend(name);
        words.extend([encode_header(Op::TypeVoid.to_u16(), 2), 2]);
        words.extend([encode_header(Op::TypeFunction.to_u16(), 3), 3, 2]);
        words.extend([encode_header(Op::Function.to_u16(), 5), 2, 1, 0, 3]);
        words.extend([encode_header(Op::Label.to_u16(), 2), 5]);
        words.push(encode_header(Op::Return.to_u16(), 1));
        words.push(encode_header(Op::FunctionEnd.to_u16(), 1));
        words
    }

    fn to_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_public_exports() {
        let _ = VMConfig::default();
        let _ = Context::default();
        let _ = ResultKind::Unset;
        let _ = DataKind::Float;
        assert_eq!(MAX_INPUT_LOCATIONS, 64);
        assert_eq!(MAX_OUTPUT_LOCATIONS, 8);
    }

    #[test]
    fn test_vmconfig_default() {
        let config = VMConfig::default();
        assert_eq!(config.max_instructions, 1_000_000);
        assert_eq!(config.max_decorations, 8);
        assert!(!config.strict_opcodes);
    }

    #[test]
    fn test_context_tables() {
        let ctx = Context::default();
        assert_eq!(ctx.setup_table().name(), "setup");
        assert_eq!(ctx.execution_table().name(), "execution");
        assert!(ctx.setup_table().contains(Op::TypeFloat.to_u16()));
        assert!(!ctx.setup_table().contains(Op::Load.to_u16()));
        assert!(ctx.execution_table().contains(Op::Load.to_u16()));
        assert!(handled_ops(ctx.execution_table()).contains(&"OpDot"));
    }

    #[test]
    fn test_minimal_module_runs() {
        let module = Module::from_words(&minimal_module_words()).unwrap();
        let ctx = Context::default();
        let mut state = ctx.create_state(&module).unwrap();
        assert_eq!(state.name_of(1), Some("main"));

        let summary = ctx.call_entry_point_by_name(&mut state, "main").unwrap();
        assert_eq!(summary.entry_point, 1);
        assert_eq!(summary.instructions_executed, 2);
        assert_eq!(summary.unsupported_opcodes, 0);
    }

    #[test]
    fn test_entry_point_not_found() {
        let module = Module::from_words(&minimal_module_words()).unwrap();
        let ctx = Context::default();
        let mut state = ctx.create_state(&module).unwrap();
        assert_eq!(
            ctx.call_entry_point_by_name(&mut state, "Main").unwrap_err(),
            RuntimeError::EntryPointNotFound {
                name: "Main".to_string()
            }
        );
        // The state stays usable after a failed lookup
        assert!(ctx.call_entry_point_by_name(&mut state, "main").is_ok());
    }

    #[test]
    fn test_run_helper() {
        let outputs = run_entry_point(&to_bytes(&minimal_module_words()), "main", &[]).unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_run_helper_bad_magic() {
        let mut words = minimal_module_words();
        words[0] = 0xDEAD_BEEF;
        assert!(matches!(
            run_entry_point(&to_bytes(&words), "main", &[]),
            Err(RuntimeError::Spirv(spirv_vm_spec::SpirvError::BadMagic(0xDEAD_BEEF)))
        ));
    }

    #[test]
    fn test_unterminated_function() {
        let mut words = minimal_module_words();
        words.pop();
        let module = Module::from_words(&words).unwrap();
        assert_eq!(
            Context::default().create_state(&module).unwrap_err(),
            RuntimeError::UnterminatedFunction { id: 1 }
        );
    }
}
