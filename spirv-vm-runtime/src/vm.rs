//! Virtual machine driver for SPIR-V modules

use spirv_vm_spec::{Id, Module, Op};

use crate::dispatch::{DispatchTable, ExtendedTable, Instruction, OpHandler};
use crate::error::{Result, RuntimeError};
use crate::state::VMState;
use crate::{execute, glsl_std_450, setup};

/// VM configuration
#[derive(Debug, Clone)]
pub struct VMConfig {
    /// Maximum number of instructions one call may execute
    pub max_instructions: u64,

    /// Maximum number of decorations a single ID may carry
    pub max_decorations: usize,

    /// Treat unsupported opcodes and extended instructions as fatal
    pub strict_opcodes: bool,
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            max_instructions: 1_000_000,
            max_decorations: 8,
            strict_opcodes: false,
        }
    }
}

/// Result of a completed entry-point call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// ID of the entry point's function
    pub entry_point: Id,

    /// Number of instructions dispatched
    pub instructions_executed: u64,

    /// Instructions skipped because no handler exists for them
    pub unsupported_opcodes: u64,
}

/// Dispatch tables and configuration
///
/// Built once and shared by reference; any number of states, on any number
/// of threads, can run against the same context.
#[derive(Debug, Clone)]
pub struct Context {
    setup: DispatchTable,
    execution: DispatchTable,
    extended: ExtendedTable,
    config: VMConfig,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(VMConfig::default())
    }
}

impl Context {
    pub fn new(config: VMConfig) -> Self {
        let mut setup = DispatchTable::new("setup");
        setup::register(&mut setup);
        let mut execution = DispatchTable::new("execution");
        execute::register(&mut execution);
        let mut extended = ExtendedTable::new();
        glsl_std_450::register(&mut extended);

        Self {
            setup,
            execution,
            extended,
            config,
        }
    }

    pub fn config(&self) -> &VMConfig {
        &self.config
    }

    pub fn setup_table(&self) -> &DispatchTable {
        &self.setup
    }

    pub fn execution_table(&self) -> &DispatchTable {
        &self.execution
    }

    pub fn extended(&self) -> &ExtendedTable {
        &self.extended
    }

    /// Build a state for `module` and run the setup pass over it
    pub fn create_state<'m>(&self, module: &'m Module) -> Result<VMState<'m>> {
        let mut state = VMState::new(module);
        let mut cursor = module.cursor();

        while !cursor.is_empty() {
            let (header, offset, operands) = cursor.next_instruction()?;
            let mut inst = Instruction::new(header.opcode, offset, header.word_count, operands);
            trace_instruction("setup", &inst);

            if let Some(handler) = self.setup.get(header.opcode) {
                if self.dispatch(handler, &mut state, &mut inst)? {
                    state.stats.setup_unsupported += 1;
                }
            } else if state.current_function.is_some() && self.execution.contains(header.opcode) {
                // Runs when the function is called
            } else {
                self.skip_unsupported(RuntimeError::UnsupportedOpcode {
                    opcode: header.opcode,
                    offset,
                })?;
                state.stats.setup_unsupported += 1;
            }
        }

        if let Some(id) = state.current_function {
            return Err(RuntimeError::UnterminatedFunction { id });
        }
        tracing::debug!(
            "setup complete: {} instructions, {} unsupported",
            module.instruction_count(),
            state.stats.setup_unsupported
        );
        Ok(state)
    }

    /// Find an entry point by exact name and run it
    pub fn call_entry_point_by_name(
        &self,
        state: &mut VMState<'_>,
        name: &str,
    ) -> Result<ExecutionSummary> {
        let id = state
            .table
            .find_entry_point(name)
            .ok_or_else(|| RuntimeError::EntryPointNotFound {
                name: name.to_string(),
            })?;
        tracing::debug!("calling entry point {:?} ({})", name, id);
        self.call_function(state, id)
    }

    /// Run the body of function `id` up to its own `OpFunctionEnd`
    ///
    /// Outputs start empty. If the call fails, the outputs of the previous
    /// completed call are put back.
    pub fn call_function(&self, state: &mut VMState<'_>, id: Id) -> Result<ExecutionSummary> {
        let function = state
            .table
            .get(id)?
            .kind
            .function()
            .cloned()
            .ok_or(RuntimeError::UndefinedId { id })?;
        let end = function
            .body_end
            .ok_or(RuntimeError::UnterminatedFunction { id })?;

        let previous = state.slots.take_outputs();
        state.call_unsupported = 0;

        let executed = match self.run_body(state, function.body_start, end) {
            Ok(executed) => executed,
            Err(err) => {
                state.slots.restore_outputs(previous);
                return Err(err);
            }
        };

        tracing::debug!("function {} returned after {} instructions", id, executed);
        Ok(ExecutionSummary {
            entry_point: id,
            instructions_executed: executed,
            unsupported_opcodes: state.call_unsupported,
        })
    }

    /// Dispatch every instruction in `[start, end)`; returns the count
    fn run_body(&self, state: &mut VMState<'_>, start: usize, end: usize) -> Result<u64> {
        let module = state.module();
        let mut cursor = module.cursor();
        cursor.seek(start)?;
        let mut executed = 0u64;

        while cursor.offset() < end {
            if executed >= self.config.max_instructions {
                return Err(RuntimeError::ExecutionLimitExceeded {
                    limit: self.config.max_instructions,
                });
            }
            let (header, offset, operands) = cursor.next_instruction()?;
            let mut inst = Instruction::new(header.opcode, offset, header.word_count, operands);
            trace_instruction("exec", &inst);
            executed += 1;

            let skipped = match self.execution.get(header.opcode) {
                Some(handler) => self.dispatch(handler, state, &mut inst)?,
                None => {
                    self.skip_unsupported(RuntimeError::UnsupportedOpcode {
                        opcode: header.opcode,
                        offset,
                    })?;
                    true
                }
            };
            if skipped {
                state.call_unsupported += 1;
            }
        }
        Ok(executed)
    }

    /// Run one handler; returns `true` if the instruction was skipped
    fn dispatch(
        &self,
        handler: OpHandler,
        state: &mut VMState<'_>,
        inst: &mut Instruction<'_>,
    ) -> Result<bool> {
        match handler(self, state, inst) {
            Ok(()) if inst.remaining() == 0 => Ok(false),
            Ok(()) => Err(inst.malformed(format!(
                "{} operand words left unread",
                inst.remaining()
            ))),
            Err(err) if !err.is_fatal() => self.skip_unsupported(err).map(|()| true),
            Err(err) => Err(err),
        }
    }

    fn skip_unsupported(&self, err: RuntimeError) -> Result<()> {
        if self.config.strict_opcodes {
            return Err(err);
        }
        tracing::warn!("{}, skipping", err);
        Ok(())
    }
}

fn trace_instruction(pass: &str, inst: &Instruction<'_>) {
    match inst.op() {
        Some(op) => tracing::trace!("[{}] {:6} {}", pass, inst.offset, op),
        None => tracing::trace!("[{}] {:6} <opcode {}>", pass, inst.offset, inst.opcode),
    }
}

/// Mnemonics of the opcodes a table handles, for diagnostics
pub fn handled_ops(table: &DispatchTable) -> Vec<&'static str> {
    table.ops().map(Op::name).collect()
}
