//! Intcode configuration constants and run-time capabilities.

use serde::{Deserialize, Serialize};

// ============================================================================
// Opcodes
// ============================================================================
pub const OPCODE_ADD: u8 = 1;
pub const OPCODE_MUL: u8 = 2;
pub const OPCODE_INPUT: u8 = 3;
pub const OPCODE_OUTPUT: u8 = 4;
pub const OPCODE_JUMP_IF_TRUE: u8 = 5;
pub const OPCODE_JUMP_IF_FALSE: u8 = 6;
pub const OPCODE_LESS_THAN: u8 = 7;
pub const OPCODE_EQUALS: u8 = 8;
pub const OPCODE_ADJUST_BASE: u8 = 9;
pub const OPCODE_HALT: u8 = 99;

/// Divisor that splits the opcode from the mode digits (`opcode = raw mod 100`).
pub const OPCODE_DIVISOR: u32 = 100;

// ============================================================================
// Parameter modes
// ============================================================================
pub const MODE_POSITION: u8 = 0;
pub const MODE_IMMEDIATE: u8 = 1;
pub const MODE_RELATIVE: u8 = 2;

/// Every opcode takes at most three parameters.
pub const MAX_PARAMETERS: usize = 3;

// ============================================================================
// Instruction widths (opcode word + parameters)
// ============================================================================
pub const WIDTH_THREE_PARAMETERS: u64 = 4;
pub const WIDTH_TWO_PARAMETERS: u64 = 3;
pub const WIDTH_ONE_PARAMETER: u64 = 2;
pub const WIDTH_NO_PARAMETERS: u64 = 1;

// ============================================================================
// Memory / diagnostics
// ============================================================================
/// Cells per page in `SparseMemory`.
pub const PAGE_SIZE: u64 = 64;
/// Addresses `FlatMemory` can hold (`0..FLAT_MEMORY_LIMIT`). Writes past it are rejected
/// instead of growing the vector without bound.
pub const FLAT_MEMORY_LIMIT: u64 = 1 << 20;
/// Number of cells captured, starting at the faulting pointer, in an error snapshot.
pub const SNAPSHOT_WINDOW: u64 = 8;

/// Prompt written by the interactive input fallback.
pub const INPUT_PROMPT: &str = "Enter int value: ";

/// Feature switches for one machine. The same interpreter serves every generation of
/// Intcode programs; older programs simply run with fewer capabilities enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Mode 2 parameters and opcode 9. When disabled both are rejected.
    pub relative_mode: bool,
    /// Yield SUSPENDED on an empty input queue instead of blocking on the input source.
    pub suspend_on_input: bool,
}

impl Capabilities {
    /// Relative mode and non-blocking input.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            relative_mode: true,
            suspend_on_input: true,
        }
    }

    /// Relative mode; missing input is read from the blocking input source.
    #[must_use]
    pub const fn blocking() -> Self {
        Self {
            relative_mode: true,
            suspend_on_input: false,
        }
    }

    /// Position and immediate modes only, blocking input.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            relative_mode: false,
            suspend_on_input: false,
        }
    }

    #[must_use]
    pub const fn with_suspend_on_input(mut self, suspend_on_input: bool) -> Self {
        self.suspend_on_input = suspend_on_input;
        self
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Opcode name for trace output and diagnostics.
#[must_use]
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        OPCODE_ADD => "ADD",
        OPCODE_MUL => "MUL",
        OPCODE_INPUT => "INPUT",
        OPCODE_OUTPUT => "OUTPUT",
        OPCODE_JUMP_IF_TRUE => "JUMP_IF_TRUE",
        OPCODE_JUMP_IF_FALSE => "JUMP_IF_FALSE",
        OPCODE_LESS_THAN => "LESS_THAN",
        OPCODE_EQUALS => "EQUALS",
        OPCODE_ADJUST_BASE => "ADJUST_BASE",
        OPCODE_HALT => "HALT",
        _ => "UNKNOWN",
    }
}
