//! Input/output instructions: INPUT (3), OUTPUT (4).

use tracing::debug;

use crate::config::{OPCODE_INPUT, OPCODE_OUTPUT, WIDTH_ONE_PARAMETER};
use crate::error::Fault;
use crate::input::acquire_integer;
use crate::instructions::base::{destination_address, read_parameter, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult};

/// INPUT (opcode 3): pop the input queue into the destination.
///
/// On an empty queue it either suspends (pointer left on this instruction, nothing written)
/// or blocks on the context's input source, depending on capabilities.
pub struct InputInstruction;

impl InputInstruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for InputInstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionHandler for InputInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_INPUT
    }

    fn name(&self) -> &'static str {
        "INPUT"
    }

    fn width(&self) -> u64 {
        WIDTH_ONE_PARAMETER
    }

    fn execute(&self, context: &mut InstructionContext<'_>) -> Result<InstructionResult, Fault> {
        // Validate the destination first so a suspended instruction re-executes cleanly.
        let address = destination_address(context, 1)?;
        let value = match context.inputs.pop_front() {
            Some(value) => value,
            None if context.capabilities.suspend_on_input => {
                return Ok(InstructionResult::Suspend);
            }
            None => {
                debug!(pointer = context.pointer, "input queue empty, reading from input source");
                acquire_integer(context.input_source)?
            }
        };
        context.memory.write(address, value)?;
        Ok(InstructionResult::Continue)
    }
}

/// OUTPUT (opcode 4): append parameter 1 to the output buffer.
pub struct OutputInstruction;

impl OutputInstruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for OutputInstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionHandler for OutputInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_OUTPUT
    }

    fn name(&self) -> &'static str {
        "OUTPUT"
    }

    fn width(&self) -> u64 {
        WIDTH_ONE_PARAMETER
    }

    fn execute(&self, context: &mut InstructionContext<'_>) -> Result<InstructionResult, Fault> {
        let value = read_parameter(context, 1)?;
        context.outputs.push(value);
        Ok(InstructionResult::Continue)
    }
}
