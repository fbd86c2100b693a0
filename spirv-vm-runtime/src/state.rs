//! VM state for one shader invocation context

use spirv_vm_spec::{Id, Module};

use crate::error::Result;
use crate::io::InterfaceSlots;
use crate::record::ResultRecord;
use crate::table::ResultTable;

/// Counters collected while setting up and running a state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Name buffers allocated by `OpName` and `OpEntryPoint`
    pub name_allocations: u64,
    /// Instructions skipped during setup because no handler exists
    pub setup_unsupported: u64,
}

/// Per-invocation VM state
///
/// Owns the result table and the interface slots; borrows its module.
#[derive(Clone, Debug)]
pub struct VMState<'m> {
    module: &'m Module,
    pub(crate) table: ResultTable,
    pub(crate) slots: InterfaceSlots,
    /// Function whose body the setup pass is inside
    pub(crate) current_function: Option<Id>,
    pub(crate) stats: Stats,
    /// Unsupported instructions skipped during the current call
    pub(crate) call_unsupported: u64,
}

impl<'m> VMState<'m> {
    pub(crate) fn new(module: &'m Module) -> Self {
        VMState {
            module,
            table: ResultTable::new(module.bound()),
            slots: InterfaceSlots::new(),
            current_function: None,
            stats: Stats::default(),
            call_unsupported: 0,
        }
    }

    pub fn module(&self) -> &'m Module {
        self.module
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn record(&self, id: Id) -> Result<&ResultRecord> {
        self.table.get(id)
    }

    pub fn name_of(&self, id: Id) -> Option<&str> {
        self.table.get(id).ok().and_then(ResultRecord::name)
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn name_allocations(&self) -> u64 {
        self.stats.name_allocations
    }

    /// Bind input data at an interface location
    ///
    /// Replaces and drops any buffer previously bound there.
    pub fn add_input_data(&mut self, location: u32, bytes: impl Into<Box<[u8]>>) -> Result<()> {
        self.slots.set_input(location, bytes.into())
    }

    /// Data written to an output location by the last completed call
    ///
    /// A failed call leaves the previous outputs in place.
    pub fn read_output_data(&self, location: u32) -> Result<&[u8]> {
        self.slots.output(location)
    }

    /// Every output location written by the last call
    pub fn outputs(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.slots.outputs()
    }
}
