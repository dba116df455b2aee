//! Comparison instructions: LESS_THAN (7), EQUALS (8). The destination receives 1 or 0.

use crate::config::{OPCODE_EQUALS, OPCODE_LESS_THAN, WIDTH_THREE_PARAMETERS};
use crate::error::Fault;
use crate::instructions::base::{read_parameter, write_parameter, InstructionHandler};
use crate::types::{InstructionContext, InstructionResult, Value};

macro_rules! compare_instruction {
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
                WIDTH_THREE_PARAMETERS
            }
            fn execute(
                &self,
                context: &mut InstructionContext<'_>,
            ) -> Result<InstructionResult, Fault> {
                let a = read_parameter(context, 1)?;
                let b = read_parameter(context, 2)?;
                let flag = Value::from(u8::from($cond(&a, &b)));
                write_parameter(context, 3, flag)?;
                Ok(InstructionResult::Continue)
            }
        }
    };
}

fn less_than(a: &Value, b: &Value) -> bool {
    a < b
}

fn equals(a: &Value, b: &Value) -> bool {
    a == b
}

compare_instruction!(LessThanInstruction, OPCODE_LESS_THAN, "LESS_THAN", less_than);
compare_instruction!(EqualsInstruction, OPCODE_EQUALS, "EQUALS", equals);
