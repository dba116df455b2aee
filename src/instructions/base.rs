//! Instruction decoding, operand resolution and the handler trait.

use num::{Integer, Signed, ToPrimitive};

use crate::config::{
    Capabilities, MAX_PARAMETERS, MODE_IMMEDIATE, MODE_POSITION, MODE_RELATIVE, OPCODE_DIVISOR,
};
use crate::error::Fault;
use crate::types::{InstructionContext, InstructionResult, Memory, Value};

/// Per-operand addressing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterMode {
    /// Operand is `memory[memory[pointer + i]]`.
    Position,
    /// Operand is `memory[pointer + i]`. Never valid for a write destination.
    Immediate,
    /// Operand is `memory[relative_base + memory[pointer + i]]`.
    Relative,
}

/// Decoded instruction word: opcode and the three raw mode digits.
///
/// Mode digits are validated when a parameter is used, so digits of parameters an
/// opcode never reads are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub modes: [u8; MAX_PARAMETERS],
}

impl Instruction {
    /// `opcode = raw mod 100`, `modes[i] = (raw / 10^(i+1)) mod 10` for parameter `i` (1-indexed).
    pub fn decode(raw: &Value) -> Result<Self, Fault> {
        if raw.is_negative() {
            let opcode = (raw % OPCODE_DIVISOR).to_i64().unwrap_or_default();
            return Err(Fault::UnknownOpcode {
                opcode,
                raw: raw.clone(),
            });
        }
        let ten = Value::from(10u8);
        let (mut rest, opcode) = raw.div_rem(&Value::from(OPCODE_DIVISOR));
        let mut modes = [MODE_POSITION; MAX_PARAMETERS];
        for mode in &mut modes {
            let (quotient, digit) = rest.div_rem(&ten);
            *mode = digit.to_u8().unwrap_or_default();
            rest = quotient;
        }
        Ok(Self {
            opcode: opcode.to_u8().unwrap_or_default(),
            modes,
        })
    }

    /// Mode of `parameter` (1-indexed).
    pub fn mode(&self, parameter: usize, capabilities: Capabilities) -> Result<ParameterMode, Fault> {
        let digit = self
            .modes
            .get(parameter.wrapping_sub(1))
            .copied()
            .unwrap_or(MODE_POSITION);
        match digit {
            MODE_POSITION => Ok(ParameterMode::Position),
            MODE_IMMEDIATE => Ok(ParameterMode::Immediate),
            MODE_RELATIVE if capabilities.relative_mode => Ok(ParameterMode::Relative),
            _ => Err(Fault::InvalidMode { parameter, digit }),
        }
    }
}

/// Convert a resolved address to a memory index. Negative or oversized addresses fail fast.
pub fn resolve_address(address: &Value) -> Result<u64, Fault> {
    address.to_u64().ok_or_else(|| Fault::InvalidAddress {
        address: address.clone(),
    })
}

/// Address of the word holding `parameter` (1-indexed).
fn parameter_slot(context: &InstructionContext<'_>, parameter: usize) -> Result<u64, Fault> {
    context
        .pointer
        .checked_add(parameter as u64)
        .ok_or_else(|| Fault::InvalidAddress {
            address: Value::from(context.pointer) + parameter,
        })
}

/// Value of a read operand.
pub fn read_parameter(context: &InstructionContext<'_>, parameter: usize) -> Result<Value, Fault> {
    let word = context.memory.read(parameter_slot(context, parameter)?);
    match context.instruction.mode(parameter, context.capabilities)? {
        ParameterMode::Immediate => Ok(word),
        ParameterMode::Position => Ok(context.memory.read(resolve_address(&word)?)),
        ParameterMode::Relative => {
            let address = &*context.relative_base + &word;
            Ok(context.memory.read(resolve_address(&address)?))
        }
    }
}

/// Address a write destination refers to. IMMEDIATE mode is rejected.
pub fn destination_address(context: &InstructionContext<'_>, parameter: usize) -> Result<u64, Fault> {
    let word = context.memory.read(parameter_slot(context, parameter)?);
    match context.instruction.mode(parameter, context.capabilities)? {
        ParameterMode::Immediate => Err(Fault::InvalidMode {
            parameter,
            digit: MODE_IMMEDIATE,
        }),
        ParameterMode::Position => resolve_address(&word),
        ParameterMode::Relative => resolve_address(&(&*context.relative_base + &word)),
    }
}

/// Store `value` through the destination `parameter`.
pub fn write_parameter(
    context: &mut InstructionContext<'_>,
    parameter: usize,
    value: Value,
) -> Result<(), Fault> {
    let address = destination_address(context, parameter)?;
    context.memory.write(address, value)
}

/// Base trait for all Intcode instruction handlers.
pub trait InstructionHandler: Send + Sync {
    fn opcode(&self) -> u8;
    fn name(&self) -> &'static str;

    /// Words occupied by the instruction: the opcode word plus its parameters.
    fn width(&self) -> u64;

    /// Execute the instruction at `context.pointer`.
    fn execute(&self, context: &mut InstructionContext<'_>) -> Result<InstructionResult, Fault>;

    fn disassemble(&self, memory: &dyn Memory, pointer: u64) -> String {
        let words = memory.window(pointer, self.width());
        let mut text = self.name().to_string();
        for word in words.iter().skip(1) {
            text.push(' ');
            text.push_str(&word.to_string());
        }
        text
    }
}
