//! Interface slots
//!
//! Inputs are bound by the host per location before a call; outputs are
//! written by `OpStore` through Output variables during a call.

use crate::error::{Result, RuntimeError};

/// Number of input locations
pub const MAX_INPUT_LOCATIONS: usize = 64;

/// Number of output locations
pub const MAX_OUTPUT_LOCATIONS: usize = 8;

#[derive(Clone, Debug)]
pub struct InterfaceSlots {
    inputs: Vec<Option<Box<[u8]>>>,
    outputs: Vec<Option<Box<[u8]>>>,
}

impl Default for InterfaceSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceSlots {
    pub fn new() -> Self {
        InterfaceSlots {
            inputs: vec![None; MAX_INPUT_LOCATIONS],
            outputs: vec![None; MAX_OUTPUT_LOCATIONS],
        }
    }

    fn input_index(location: u32) -> Result<usize> {
        let index = location as usize;
        if index >= MAX_INPUT_LOCATIONS {
            return Err(RuntimeError::LocationOutOfRange {
                location,
                max: MAX_INPUT_LOCATIONS,
            });
        }
        Ok(index)
    }

    fn output_index(location: u32) -> Result<usize> {
        let index = location as usize;
        if index >= MAX_OUTPUT_LOCATIONS {
            return Err(RuntimeError::LocationOutOfRange {
                location,
                max: MAX_OUTPUT_LOCATIONS,
            });
        }
        Ok(index)
    }

    /// Bind `bytes` at `location`, dropping whatever was bound there
    pub fn set_input(&mut self, location: u32, bytes: Box<[u8]>) -> Result<()> {
        let index = Self::input_index(location)?;
        self.inputs[index] = Some(bytes);
        Ok(())
    }

    pub fn input(&self, location: u32) -> Result<&[u8]> {
        let index = Self::input_index(location)?;
        self.inputs[index]
            .as_deref()
            .ok_or(RuntimeError::MissingInput { location })
    }

    pub fn write_output(&mut self, location: u32, bytes: &[u8]) -> Result<()> {
        let index = Self::output_index(location)?;
        self.outputs[index] = Some(bytes.into());
        Ok(())
    }

    pub fn output(&self, location: u32) -> Result<&[u8]> {
        let index = Self::output_index(location)?;
        self.outputs[index]
            .as_deref()
            .ok_or(RuntimeError::NoOutputData { location })
    }

    /// Detach the outputs of the previous call, leaving every location empty
    pub fn take_outputs(&mut self) -> Vec<Option<Box<[u8]>>> {
        std::mem::replace(&mut self.outputs, vec![None; MAX_OUTPUT_LOCATIONS])
    }

    /// Put back outputs detached by [`InterfaceSlots::take_outputs`]
    pub fn restore_outputs(&mut self, outputs: Vec<Option<Box<[u8]>>>) {
        self.outputs = outputs;
    }

    /// Written output locations with their data
    pub fn outputs(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.outputs
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|bytes| (index as u32, bytes)))
    }
}
