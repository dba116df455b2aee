//! Error types. A `Fault` says what went wrong; `VmError` pairs it with the machine state
//! at the moment execution stopped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Snapshot, Value};

/// Fatal condition raised while decoding or executing one instruction.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    #[error("unknown opcode {opcode} (instruction word {raw})")]
    UnknownOpcode { opcode: i64, raw: Value },

    /// Unrecognized mode digit, immediate mode on a write destination, or relative mode
    /// while the capability is disabled.
    #[error("parameter {parameter} cannot use mode {digit}")]
    InvalidMode { parameter: usize, digit: u8 },

    /// Resolved address is negative or does not fit in 64 bits.
    #[error("address {address} is outside the addressable range")]
    InvalidAddress { address: Value },

    /// The blocking input source was closed before it produced an integer.
    #[error("input source closed while waiting for an integer")]
    InputClosed,
}

/// Error surfaced to the caller: the fault plus a diagnostic snapshot.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{fault} ({snapshot})")]
pub struct VmError {
    pub fault: Fault,
    pub snapshot: Snapshot,
}

impl VmError {
    #[must_use]
    pub fn new(fault: Fault, snapshot: Snapshot) -> Self {
        Self { fault, snapshot }
    }
}

/// Program text that is not a comma separated list of integers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("program text is empty")]
    Empty,
    #[error("value {index} ({token:?}) is not an integer")]
    InvalidValue { index: usize, token: String },
}
