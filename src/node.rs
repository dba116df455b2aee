//! N-API binding: exposes `IntcodeMachine` to JavaScript as the `IntcodeVm` class.
//! Values cross the boundary as JS `BigInt` so nothing is truncated to a double.

use napi::bindgen_prelude::BigInt;
use napi::{Error, Result};
use napi_derive::napi;
use num::bigint::Sign;
use num::Zero;

use crate::input::ClosedSource;
use crate::instructions::base::resolve_address;
use crate::machine::IntcodeMachine;
use crate::types::{Memory, Value};

/// JS `BigInt` -> `Value`. Words are little-endian 64-bit limbs.
fn from_js(value: &BigInt) -> Value {
    let magnitude = value
        .words
        .iter()
        .rev()
        .fold(Value::zero(), |acc, &word| (acc << 64u32) + word);
    if value.sign_bit {
        -magnitude
    } else {
        magnitude
    }
}

fn to_js(value: &Value) -> BigInt {
    let (sign, mut words) = value.to_u64_digits();
    if words.is_empty() {
        words.push(0);
    }
    BigInt {
        sign_bit: sign == Sign::Minus,
        words,
    }
}

fn to_address(value: &BigInt) -> Result<u64> {
    resolve_address(&from_js(value)).map_err(|fault| Error::from_reason(fault.to_string()))
}

/// One non-zero memory cell.
#[napi(object)]
pub struct MemoryCell {
    pub address: BigInt,
    pub value: BigInt,
}

#[napi]
pub struct IntcodeVm {
    machine: IntcodeMachine,
}

#[napi]
impl IntcodeVm {
    #[napi(constructor)]
    pub fn new(program: Vec<BigInt>) -> Self {
        let program: Vec<Value> = program.iter().map(from_js).collect();
        Self {
            machine: IntcodeMachine::new(&program),
        }
    }

    /// Build from comma separated program text.
    #[napi(factory)]
    pub fn parse(text: String) -> Result<Self> {
        let machine =
            IntcodeMachine::parse(&text).map_err(|err| Error::from_reason(err.to_string()))?;
        Ok(Self { machine })
    }

    #[napi]
    pub fn push_input(&mut self, value: BigInt) {
        self.machine.push_input(from_js(&value));
    }

    /// Run until halted or suspended on input; returns the output of this segment.
    /// JS has no blocking stdin here, so the machine always suspends on missing input.
    #[napi]
    pub fn run(&mut self) -> Result<Vec<BigInt>> {
        let outcome = self
            .machine
            .run_with_source(&mut ClosedSource)
            .map_err(|err| Error::from_reason(err.to_string()))?;
        Ok(outcome.output.iter().map(to_js).collect())
    }

    /// `RUNNING`, `SUSPENDED`, `HALTED` or `ERRORED`.
    #[napi(getter)]
    pub fn status(&self) -> String {
        self.machine.status().to_string()
    }

    /// Instruction pointer, or `null` once halted.
    #[napi(getter)]
    pub fn pointer(&self) -> Option<BigInt> {
        self.machine
            .context()
            .pointer
            .address()
            .map(BigInt::from)
    }

    #[napi(getter)]
    pub fn relative_base(&self) -> BigInt {
        to_js(&self.machine.context().relative_base)
    }

    #[napi]
    pub fn peek(&self, address: BigInt) -> Result<BigInt> {
        Ok(to_js(&self.machine.peek(to_address(&address)?)))
    }

    #[napi]
    pub fn poke(&mut self, address: BigInt, value: BigInt) -> Result<()> {
        let address = to_address(&address)?;
        self.machine
            .poke(address, from_js(&value))
            .map_err(|fault| Error::from_reason(fault.to_string()))
    }

    /// Non-zero cells in ascending address order. Unlisted addresses read as zero.
    #[napi]
    pub fn cells(&self) -> Vec<MemoryCell> {
        self.machine
            .memory()
            .nonzero_cells()
            .into_iter()
            .map(|(address, value)| MemoryCell {
                address: BigInt::from(address),
                value: to_js(&value),
            })
            .collect()
    }
}
