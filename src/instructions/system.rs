//! System instructions: ADJUST_BASE (9), HALT (99).

use crate::config::{OPCODE_ADJUST_BASE, OPCODE_HALT, WIDTH_NO_PARAMETERS, WIDTH_ONE_PARAMETER};
use crate::error::Fault;
use crate::instructions::base::{read_parameter, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult};

/// ADJUST_BASE (opcode 9): relative_base += parameter 1. The only writer of the relative base.
pub struct AdjustBaseInstruction;

impl AdjustBaseInstruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for AdjustBaseInstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionHandler for AdjustBaseInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_ADJUST_BASE
    }

    fn name(&self) -> &'static str {
        "ADJUST_BASE"
    }

    fn width(&self) -> u64 {
        WIDTH_ONE_PARAMETER
    }

    fn execute(&self, context: &mut InstructionContext<'_>) -> Result<InstructionResult, Fault> {
        // Programs written before relative addressing existed treat 9 as garbage.
        if !context.capabilities.relative_mode {
            return Err(Fault::UnknownOpcode {
                opcode: i64::from(OPCODE_ADJUST_BASE),
                raw: context.memory.read(context.pointer),
            });
        }
        let delta = read_parameter(context, 1)?;
        *context.relative_base += delta;
        Ok(InstructionResult::Continue)
    }
}

/// HALT (opcode 99).
pub struct HaltInstruction;

impl HaltInstruction {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for HaltInstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionHandler for HaltInstruction {
    fn opcode(&self) -> u8 {
        OPCODE_HALT
    }

    fn name(&self) -> &'static str {
        "HALT"
    }

    fn width(&self) -> u64 {
        WIDTH_NO_PARAMETERS
    }

    fn execute(&self, _context: &mut InstructionContext<'_>) -> Result<InstructionResult, Fault> {
        Ok(InstructionResult::Halt)
    }
}
