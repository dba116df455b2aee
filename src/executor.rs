//! Fetch-decode-execute loop.
//!
//! Everything here works on caller-owned state: memory, an `ExecutionContext`, the input
//! queue and the output buffer. Suspending is just returning; resuming is calling again with
//! the same context, so several machines interleave through ordinary function calls.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::{Capabilities, SNAPSHOT_WINDOW};
use crate::error::{Fault, VmError};
use crate::input::InputSource;
use crate::instructions::base::Instruction;
use crate::instructions::registry_instructions::get_registry;
use crate::types::{
    ExecutionContext, InstructionContext, InstructionResult, Memory, Pointer, RunOutcome,
    Snapshot, Status, Value,
};

/// Borrowed view of one machine's state for the duration of a run segment.
pub struct Executor<'a> {
    pub memory: &'a mut dyn Memory,
    pub context: &'a mut ExecutionContext,
    pub inputs: &'a mut VecDeque<Value>,
    pub outputs: &'a mut Vec<Value>,
    pub capabilities: Capabilities,
    pub input_source: &'a mut dyn InputSource,
}

impl Executor<'_> {
    /// Execute one instruction. Returns `Running` when execution can continue.
    pub fn step(&mut self) -> Result<Status, VmError> {
        let Pointer::At(pointer) = self.context.pointer else {
            return Ok(Status::Halted);
        };
        if pointer >= self.memory.extent() {
            debug!(pointer, "pointer ran past the end of memory, halting");
            self.context.pointer = Pointer::Halted;
            return Ok(Status::Halted);
        }

        let raw = self.memory.read(pointer);
        let instruction = match Instruction::decode(&raw) {
            Ok(instruction) => instruction,
            Err(fault) => return Err(self.fail(pointer, fault)),
        };
        let Some(handler) = get_registry().get_handler(instruction.opcode) else {
            let fault = Fault::UnknownOpcode {
                opcode: i64::from(instruction.opcode),
                raw,
            };
            return Err(self.fail(pointer, fault));
        };
        crate::vm_log!(
            pointer,
            relative_base = %self.context.relative_base,
            "{}",
            handler.disassemble(&*self.memory, pointer)
        );

        let mut context = InstructionContext {
            memory: &mut *self.memory,
            instruction: &instruction,
            pointer,
            relative_base: &mut self.context.relative_base,
            inputs: &mut *self.inputs,
            outputs: &mut *self.outputs,
            capabilities: self.capabilities,
            input_source: &mut *self.input_source,
        };
        let result = match handler.execute(&mut context) {
            Ok(result) => result,
            Err(fault) => return Err(self.fail(pointer, fault)),
        };

        match result {
            InstructionResult::Continue => {
                let Some(next) = pointer.checked_add(handler.width()) else {
                    let fault = Fault::InvalidAddress {
                        address: Value::from(pointer) + handler.width(),
                    };
                    return Err(self.fail(pointer, fault));
                };
                self.context.pointer = Pointer::At(next);
                Ok(Status::Running)
            }
            InstructionResult::Jump(target) => {
                self.context.pointer = Pointer::At(target);
                Ok(Status::Running)
            }
            InstructionResult::Suspend => {
                debug!(pointer, "input queue empty, suspending");
                Ok(Status::Suspended)
            }
            InstructionResult::Halt => {
                debug!(pointer, "halted");
                self.context.pointer = Pointer::Halted;
                Ok(Status::Halted)
            }
        }
    }

    /// Step until the machine halts or suspends.
    pub fn run(&mut self) -> Result<Status, VmError> {
        debug!(
            pointer = %self.context.pointer,
            relative_base = %self.context.relative_base,
            queued = self.inputs.len(),
            "running segment"
        );
        loop {
            match self.step()? {
                Status::Running => continue,
                status => return Ok(status),
            }
        }
    }

    fn fail(&self, pointer: u64, fault: Fault) -> VmError {
        let snapshot = capture_snapshot(&*self.memory, pointer, &self.context.relative_base);
        crate::vm_log_error!(%fault, %snapshot, "execution stopped");
        VmError::new(fault, snapshot)
    }
}

/// Diagnostic snapshot: pointer, relative base and the memory window at the pointer.
#[must_use]
pub fn capture_snapshot(memory: &dyn Memory, pointer: u64, relative_base: &Value) -> Snapshot {
    Snapshot {
        pointer,
        relative_base: relative_base.clone(),
        window: memory.window(pointer, SNAPSHOT_WINDOW),
    }
}

/// Run one segment: start from `resume_context` (or a fresh context), feed `input_values`
/// and execute until HALTED or SUSPENDED. The outcome carries the output produced by this
/// segment and the context to resume from.
pub fn run(
    memory: &mut dyn Memory,
    input_values: impl IntoIterator<Item = Value>,
    capabilities: Capabilities,
    resume_context: Option<ExecutionContext>,
    input_source: &mut dyn InputSource,
) -> Result<RunOutcome, VmError> {
    let mut context = resume_context.unwrap_or_default();
    let mut inputs: VecDeque<Value> = input_values.into_iter().collect();
    let mut output = Vec::new();
    let status = Executor {
        memory,
        context: &mut context,
        inputs: &mut inputs,
        outputs: &mut output,
        capabilities,
        input_source,
    }
    .run()?;
    Ok(RunOutcome {
        output,
        context,
        status,
    })
}

/// Listing of `count` instructions starting at `start`. Words that do not decode to a known
/// opcode are shown as `DATA` and occupy one cell.
#[must_use]
pub fn disassemble(memory: &dyn Memory, start: u64, count: usize) -> Vec<(u64, String)> {
    let registry = get_registry();
    let mut listing = Vec::with_capacity(count);
    let mut address = start;
    for _ in 0..count {
        let raw = memory.read(address);
        let handler = Instruction::decode(&raw)
            .ok()
            .and_then(|instruction| registry.get_handler(instruction.opcode));
        let (text, width) = match handler {
            Some(handler) => (handler.disassemble(memory, address), handler.width()),
            None => (format!("DATA {raw}"), 1),
        };
        listing.push((address, text));
        match address.checked_add(width) {
            Some(next) => address = next,
            None => break,
        }
    }
    listing
}
