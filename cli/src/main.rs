//! SPIR-V VM command-line runner
//!
//! Usage:
//!   spirv-vm run shader.spv --input 0=0.5,0.25,1.0
//!   spirv-vm disasm shader.spv
//!   spirv-vm asm shader.spvasm -o shader.spv

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spirv_vm_runtime::value::{bytes_f32, f32_bytes};
use spirv_vm_runtime::{handled_ops, Context, VMConfig};
use spirv_vm_spec::Module;

#[derive(Debug, Parser)]
#[command(name = "spirv-vm", version, about = "Run, assemble and disassemble SPIR-V shaders")]
struct Cli {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Execute an entry point once and print its outputs
    Run {
        /// SPIR-V binary
        file: PathBuf,

        /// Entry point name
        #[arg(long, default_value = "main")]
        entry: String,

        /// Float input bound at a location, as LOC=f,f,...
        #[arg(long = "input", value_name = "LOC=VALUES", value_parser = parse_input)]
        inputs: Vec<(u32, Vec<f32>)>,

        /// Instructions one call may execute
        #[arg(long, default_value_t = VMConfig::default().max_instructions)]
        max_instructions: u64,

        /// Fail on unsupported opcodes instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Print the assembly listing of a binary
    Disasm {
        file: PathBuf,
    },

    /// Assemble text into a binary
    Asm {
        file: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the opcodes the interpreter handles
    Ops,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            file,
            entry,
            inputs,
            max_instructions,
            strict,
        } => {
            let config = VMConfig {
                max_instructions,
                strict_opcodes: strict,
                ..VMConfig::default()
            };
            run(&file, &entry, &inputs, config)
        }
        Command::Disasm { file } => {
            let module = load(&file)?;
            let listing = spirv_vm_disassembler::disassemble(&module)
                .with_context(|| format!("failed to disassemble {}", file.display()))?;
            print!("{listing}");
            Ok(())
        }
        Command::Asm { file, output } => {
            let source = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let module = spirv_vm_assembler::assemble(&source)
                .with_context(|| format!("failed to assemble {}", file.display()))?;
            fs::write(&output, module.to_bytes())
                .with_context(|| format!("failed to write {}", output.display()))?;
            tracing::info!(
                "wrote {} instructions to {}",
                module.instruction_count(),
                output.display()
            );
            Ok(())
        }
        Command::Ops => {
            let ctx = Context::default();
            println!("setup:");
            for name in handled_ops(ctx.setup_table()) {
                println!("  {name}");
            }
            println!("execution:");
            for name in handled_ops(ctx.execution_table()) {
                println!("  {name}");
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<Module> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Module::from_bytes(&bytes).with_context(|| format!("failed to load {}", path.display()))
}

fn run(path: &Path, entry: &str, inputs: &[(u32, Vec<f32>)], config: VMConfig) -> Result<()> {
    let module = load(path)?;
    let ctx = Context::new(config);
    let mut state = ctx.create_state(&module).context("setup failed")?;

    for (location, values) in inputs {
        state
            .add_input_data(*location, f32_bytes(values))
            .with_context(|| format!("cannot bind input location {location}"))?;
    }

    let summary = ctx
        .call_entry_point_by_name(&mut state, entry)
        .with_context(|| format!("entry point \"{entry}\" failed"))?;
    tracing::info!(
        "executed {} instructions ({} unsupported)",
        summary.instructions_executed,
        summary.unsupported_opcodes
    );

    for (location, bytes) in state.outputs() {
        let values: Vec<String> = bytes_f32(bytes).iter().map(|v| v.to_string()).collect();
        println!("location {location}: [{}]", values.join(", "));
    }
    Ok(())
}

/// Parse `LOC=f,f,...`
fn parse_input(arg: &str) -> Result<(u32, Vec<f32>)> {
    let Some((location, values)) = arg.split_once('=') else {
        bail!("expected LOC=VALUES, got {arg:?}");
    };
    let location = location
        .trim()
        .parse()
        .with_context(|| format!("invalid location {location:?}"))?;
    let values = values
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f32>()
                .with_context(|| format!("invalid float {v:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((location, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("2=0.5, 1,-3").unwrap(), (2, vec![0.5, 1.0, -3.0]));
        assert!(parse_input("0.5,1").is_err());
        assert!(parse_input("x=1").is_err());
        assert!(parse_input("0=1,y").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "spirv-vm", "-vv", "run", "a.spv", "--input", "0=1,2", "--input", "3=4",
            "--max-instructions", "10",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                entry,
                inputs,
                max_instructions,
                strict,
                ..
            } => {
                assert_eq!(entry, "main");
                assert_eq!(inputs, vec![(0, vec![1.0, 2.0]), (3, vec![4.0])]);
                assert_eq!(max_instructions, 10);
                assert!(!strict);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_asm_output() {
        assert!(Cli::try_parse_from(["spirv-vm", "asm", "a.spvasm"]).is_err());
    }
}
