//! Intcode type definitions: values, execution context, status, memory interface.

use std::collections::VecDeque;
use std::fmt;

use num::BigInt;
use serde::{Deserialize, Serialize};

use crate::config::Capabilities;
use crate::error::Fault;
use crate::input::InputSource;
use crate::instructions::base::Instruction;

/// Memory cell value. Arbitrary precision: products of large operands never wrap.
pub type Value = BigInt;

// ============================================================================
// Execution context
// ============================================================================

/// Instruction pointer. `Halted` is the sentinel set by opcode 99; it is never a valid address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pointer {
    At(u64),
    Halted,
}

impl Pointer {
    #[must_use]
    pub const fn address(self) -> Option<u64> {
        match self {
            Pointer::At(address) => Some(address),
            Pointer::Halted => None,
        }
    }

    #[must_use]
    pub const fn is_halted(self) -> bool {
        matches!(self, Pointer::Halted)
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Pointer::At(0)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::At(address) => write!(f, "{address}"),
            Pointer::Halted => f.write_str("halted"),
        }
    }
}

/// Continuation handed back to the caller on suspension and fed into the next run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub pointer: Pointer,
    /// Mutated only by opcode 9.
    pub relative_base: Value,
}

impl ExecutionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Execution status (the suspend/resume state machine).
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Running = 0,
    Suspended = 1,
    Halted = 2,
    Errored = 3,
}

impl Status {
    /// HALTED and ERRORED never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Status::Halted | Status::Errored)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Running => "RUNNING",
            Status::Suspended => "SUSPENDED",
            Status::Halted => "HALTED",
            Status::Errored => "ERRORED",
        })
    }
}

/// Result of one run segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Values produced by opcode 4 since the segment started.
    pub output: Vec<Value>,
    pub context: ExecutionContext,
    /// `Halted` or `Suspended`; errors are returned as `VmError` instead.
    pub status: Status,
}

/// Diagnostic state captured when a fault stops execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pointer: u64,
    pub relative_base: Value,
    /// Memory cells starting at `pointer`.
    pub window: Vec<Value>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pointer {}, relative base {}, memory [",
            self.pointer, self.relative_base
        )?;
        for (i, value) in self.window.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

// ============================================================================
// Instruction execution result
// ============================================================================

/// What the executor does after a handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionResult {
    /// Advance the pointer past the instruction.
    Continue,
    /// Set the pointer to the target.
    Jump(u64),
    /// Input queue empty in non-blocking mode; the pointer stays on the input instruction.
    Suspend,
    Halt,
}

// ============================================================================
// Memory trait (interface for memory backends)
// ============================================================================

/// Address-indexed integer store with default-zero reads.
pub trait Memory {
    /// Value at `address`, 0 if never written.
    fn read(&self, address: u64) -> Value;
    /// Store `value` at `address`. Backends with a bounded address space reject addresses
    /// they cannot hold with `Fault::InvalidAddress`.
    fn write(&mut self, address: u64, value: Value) -> Result<(), Fault>;
    /// One past the highest address ever written (including the initial load).
    fn extent(&self) -> u64;

    /// `len` consecutive cells starting at `start`.
    fn window(&self, start: u64, len: u64) -> Vec<Value> {
        (0..len)
            .map_while(|offset| start.checked_add(offset))
            .map(|address| self.read(address))
            .collect()
    }

    /// Dense copy of `0..extent()`. Allocates one value per address, so after a far write
    /// prefer `nonzero_cells`.
    fn to_vec(&self) -> Vec<Value> {
        self.window(0, self.extent())
    }

    /// `(address, value)` for every non-zero cell, in ascending address order. Cost follows
    /// what is stored rather than the extent.
    fn nonzero_cells(&self) -> Vec<(u64, Value)>;
}

// ============================================================================
// Instruction context
// ============================================================================

/// Everything a handler may touch while executing one instruction.
pub struct InstructionContext<'a> {
    pub memory: &'a mut dyn Memory,
    pub instruction: &'a Instruction,
    /// Address of the instruction word.
    pub pointer: u64,
    pub relative_base: &'a mut Value,
    pub inputs: &'a mut VecDeque<Value>,
    pub outputs: &'a mut Vec<Value>,
    pub capabilities: Capabilities,
    /// Blocking fallback used when the queue is empty and suspension is off.
    pub input_source: &'a mut dyn InputSource,
}
