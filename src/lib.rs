//! Intcode virtual machine: sparse default-zero memory, arbitrary precision values and a
//! suspend/resume protocol so several machines can be driven from one thread.
//! Layout: config, types, instructions (one handler per opcode), ram, executor, machine.

/// Per-instruction trace event. No-op unless built with `--features step_logging`.
#[macro_export]
macro_rules! vm_log {
    ($($t:tt)*) => {
        #[cfg(feature = "step_logging")]
        tracing::trace!($($t)*);
    };
}

/// Log fatal faults (unknown opcode, invalid mode, invalid address, closed input).
/// Emits only when built with `--features fault_logging`.
#[macro_export]
macro_rules! vm_log_error {
    ($($t:tt)*) => {
        #[cfg(feature = "fault_logging")]
        tracing::error!($($t)*);
    };
}

pub mod config;
pub mod error;
pub mod executor;
pub mod input;
pub mod instructions;
pub mod logger;
pub mod machine;
#[cfg(feature = "node")]
pub mod node;
pub mod parser;
pub mod pipeline;
pub mod ram;
pub mod simple_ram;
pub mod types;

pub use config::Capabilities;
pub use error::{Fault, ParseError, VmError};
pub use executor::{run, Executor};
pub use input::{ClosedSource, InputSource, LineSource, ScriptedSource};
pub use machine::IntcodeMachine;
pub use parser::parse_program;
pub use pipeline::{best_phase_setting, run_chain, run_feedback_loop, PipelineError, Wiring};
pub use ram::SparseMemory;
pub use simple_ram::FlatMemory;
pub use types::{ExecutionContext, Memory, Pointer, RunOutcome, Snapshot, Status, Value};
