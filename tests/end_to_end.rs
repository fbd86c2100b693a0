//! End-to-end tests for the SPIR-V VM toolchain
//!
//! Shader text is assembled to a binary, loaded from bytes, run, and
//! disassembled back to text.

use spirv_vm_assembler::assemble;
use spirv_vm_disassembler::disassemble;
use spirv_vm_runtime::value::{bytes_f32, f32_bytes};
use spirv_vm_runtime::{run_entry_point, Context, RuntimeError};
use spirv_vm_spec::Module;

const BASIC_FRAG: &str = include_str!("fixtures/basic_frag.spvasm");

fn basic_frag_bytes() -> Vec<u8> {
    assemble(BASIC_FRAG).expect("Assembly failed").to_bytes()
}

fn run_basic(bytes: &[u8]) -> Vec<(u32, Vec<f32>)> {
    let color = f32_bytes(&[0.5, 0.25, 1.0]);
    let tint = f32_bytes(&[1.0, 0.75, 0.0]);
    run_entry_point(bytes, "main", &[(0, &color), (1, &tint)])
        .expect("Execution failed")
        .into_iter()
        .map(|(location, data)| (location, bytes_f32(&data)))
        .collect()
}

// ============================================================================
// Assemble -> Execute
// ============================================================================

#[test]
fn test_basic_fragment_shader() {
    let outputs = run_basic(&basic_frag_bytes());
    assert_eq!(outputs, vec![(0, vec![1.0, 0.75, 0.75]), (1, vec![2.5])]);
}

#[test]
fn test_big_endian_binary() {
    let words: Vec<u32> = basic_frag_bytes()
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let swapped: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    assert_eq!(run_basic(&swapped), run_basic(&basic_frag_bytes()));
}

#[test]
fn test_debug_names_survive_loading() {
    let module = Module::from_bytes(&basic_frag_bytes()).unwrap();
    let state = Context::default().create_state(&module).unwrap();
    let names: Vec<&str> = state
        .table()
        .iter()
        .filter_map(|(_, record)| record.name())
        .collect();
    for expected in ["main", "in_color", "in_tint", "out_color", "out_luma"] {
        assert!(names.contains(&expected), "missing name {expected}");
    }
    // The entry point and OpName share "main"
    assert_eq!(state.name_allocations(), 5);
}

#[test]
fn test_wrong_entry_point_name() {
    let bytes = basic_frag_bytes();
    assert!(matches!(
        run_entry_point(&bytes, "mainn", &[]),
        Err(RuntimeError::EntryPointNotFound { .. })
    ));
}

#[test]
fn test_missing_input_location() {
    let bytes = basic_frag_bytes();
    let color = f32_bytes(&[0.0, 0.0, 0.0]);
    assert!(matches!(
        run_entry_point(&bytes, "main", &[(0, &color)]),
        Err(RuntimeError::MissingInput { location: 1 })
    ));
}

// ============================================================================
// Assemble -> Disassemble -> Assemble
// ============================================================================

#[test]
fn test_disassembled_listing_runs_identically() {
    let module = assemble(BASIC_FRAG).unwrap();
    let listing = disassemble(&module).unwrap();
    let again = assemble(&listing).unwrap();
    assert_eq!(again.words(), module.words());
    assert_eq!(run_basic(&again.to_bytes()), run_basic(&module.to_bytes()));
}

#[test]
fn test_listing_mentions_extended_instructions() {
    let listing = disassemble(&assemble(BASIC_FRAG).unwrap()).unwrap();
    assert!(listing.contains("FMix"));
    assert!(listing.contains("FClamp"));
    assert!(listing.contains("OpName %2 \"main\""));
}
