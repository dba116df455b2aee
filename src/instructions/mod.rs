//! Instruction set: decoder, operand resolution and one handler per opcode.

pub mod base;
pub mod registry;
pub mod registry_instructions;
pub mod arithmetic;
pub mod comparison;
pub mod branching;
pub mod io;
pub mod system;
