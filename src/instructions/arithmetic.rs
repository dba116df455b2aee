//! Arithmetic instructions: ADD (1), MUL (2).
//! Operands are arbitrary precision, so neither can overflow.

use crate::config::{OPCODE_ADD, OPCODE_MUL, WIDTH_THREE_PARAMETERS};
use crate::error::Fault;
use crate::instructions::base::{read_parameter, write_parameter, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult, Value};

macro_rules! binary_instruction {
    ($name:ident, $opcode:ident, $label:literal, $op:expr) => {
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
                WIDTH_THREE_PARAMETERS
            }
            fn execute(
                &self,
                context: &mut InstructionContext<'_>,
            ) -> Result<InstructionResult, Fault> {
                let a = read_parameter(context, 1)?;
                let b = read_parameter(context, 2)?;
                write_parameter(context, 3, $op(a, b))?;
                Ok(InstructionResult::Continue)
            }
        }
    };
}

fn add(a: Value, b: Value) -> Value {
    a + b
}

fn mul(a: Value, b: Value) -> Value {
    a * b
}

// dst = a + b
binary_instruction!(AddInstruction, OPCODE_ADD, "ADD", add);
// dst = a * b
binary_instruction!(MulInstruction, OPCODE_MUL, "MUL", mul);
