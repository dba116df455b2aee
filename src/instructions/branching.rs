//! Branching instructions: JUMP_IF_TRUE (5), JUMP_IF_FALSE (6).
//! The target operand is only read when the branch is taken.

use num::Zero;

use crate::config::{OPCODE_JUMP_IF_FALSE, OPCODE_JUMP_IF_TRUE, WIDTH_TWO_PARAMETERS};
use crate::error::Fault;
use crate::instructions::base::{read_parameter, resolve_address, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult, Value};

/// When condition holds, jump to parameter 2; otherwise fall through.
fn do_branch(
    context: &mut InstructionContext<'_>,
    condition: bool,
) -> Result<InstructionResult, Fault> {
    if !condition {
        return Ok(InstructionResult::Continue);
    }
    let target = read_parameter(context, 2)?;
    Ok(InstructionResult::Jump(resolve_address(&target)?))
}

macro_rules! branch_instruction {
    ($name:ident, $opcode:ident, $label:literal, $cond:expr) => {
        pub struct $name;

        impl $name {
            #[must_use]
            pub const fn new() -> Self {
                Self
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl InstructionHandler for $name {
            fn opcode(&self) -> u8 {
                $opcode
            }
            fn name(&self) -> &'static str {
                $label
            }
            fn width(&self) -> u64 {
                WIDTH_TWO_PARAMETERS
            }
            fn execute(
                &self,
                context: &mut InstructionContext<'_>,
            ) -> Result<InstructionResult, Fault> {
                let value = read_parameter(context, 1)?;
                do_branch(context, $cond(&value))
            }
        }
    };
}

fn is_true(value: &Value) -> bool {
    !value.is_zero()
}

fn is_false(value: &Value) -> bool {
    value.is_zero()
}

branch_instruction!(JumpIfTrueInstruction, OPCODE_JUMP_IF_TRUE, "JUMP_IF_TRUE", is_true);
branch_instruction!(JumpIfFalseInstruction, OPCODE_JUMP_IF_FALSE, "JUMP_IF_FALSE", is_false);
