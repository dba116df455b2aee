//! `IntcodeMachine`: one Intcode instance owning its memory, execution context and input queue.
//!
//! The machine is plain data. Cloning forks it mid-run, and serializing a suspended machine
//! persists it for a later resume.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Capabilities;
use crate::error::{Fault, ParseError, VmError};
use crate::executor::{disassemble, Executor};
use crate::input::{InputSource, LineSource};
use crate::parser::parse_program;
use crate::ram::SparseMemory;
use crate::types::{ExecutionContext, Memory, Pointer, RunOutcome, Status, Value};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntcodeMachine<M = SparseMemory> {
    memory: M,
    context: ExecutionContext,
    status: Status,
    inputs: VecDeque<Value>,
    /// Output produced since the last `take_output`.
    outputs: Vec<Value>,
    capabilities: Capabilities,
    error: Option<VmError>,
}

impl IntcodeMachine<SparseMemory> {
    #[must_use]
    pub fn new(program: &[Value]) -> Self {
        Self::from_memory(SparseMemory::from_program(program))
    }

    /// Load a machine from comma separated program text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self::new(&parse_program(text)?))
    }
}

impl<M: Memory> IntcodeMachine<M> {
    pub fn from_memory(memory: M) -> Self {
        Self {
            memory,
            context: ExecutionContext::new(),
            status: Status::Running,
            inputs: VecDeque::new(),
            outputs: Vec::new(),
            capabilities: Capabilities::default(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// The error that stopped the machine, if any.
    pub fn error(&self) -> Option<&VmError> {
        self.error.as_ref()
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    pub fn peek(&self, address: u64) -> Value {
        self.memory.read(address)
    }

    /// Store `value` at `address`. Fails only when the backend cannot hold the address.
    pub fn poke(&mut self, address: u64, value: impl Into<Value>) -> Result<(), Fault> {
        self.memory.write(address, value.into())
    }

    pub fn push_input(&mut self, value: impl Into<Value>) {
        self.inputs.push_back(value.into());
    }

    pub fn extend_input<I, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.inputs.extend(values.into_iter().map(Into::into));
    }

    /// Queued input values not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.inputs.len()
    }

    /// Drain the output buffer.
    pub fn take_output(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.outputs)
    }

    /// Run until halted or suspended, falling back to stdin when blocking input is enabled.
    pub fn run(&mut self) -> Result<RunOutcome, VmError> {
        self.run_with_source(&mut LineSource::stdin())
    }

    /// Append `values` to the input queue and continue.
    pub fn resume<I, V>(&mut self, values: I) -> Result<RunOutcome, VmError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.extend_input(values);
        self.run()
    }

    /// Run until halted or suspended. The outcome's output holds everything produced since
    /// the output buffer was last drained, normally just this segment.
    pub fn run_with_source(&mut self, source: &mut dyn InputSource) -> Result<RunOutcome, VmError> {
        if self.status == Status::Suspended {
            debug!(
                pointer = %self.context.pointer,
                queued = self.inputs.len(),
                "resuming"
            );
        }
        while self.step_once(source)? == Status::Running {}
        Ok(RunOutcome {
            output: self.take_output(),
            context: self.context.clone(),
            status: self.status,
        })
    }

    /// Execute at most one instruction.
    ///
    /// A halted machine stays halted; an errored machine returns its stored error.
    pub fn step_once(&mut self, source: &mut dyn InputSource) -> Result<Status, VmError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }
        let result = Executor {
            memory: &mut self.memory,
            context: &mut self.context,
            inputs: &mut self.inputs,
            outputs: &mut self.outputs,
            capabilities: self.capabilities,
            input_source: source,
        }
        .step();
        match result {
            Ok(status) => {
                self.status = status;
                Ok(status)
            }
            Err(error) => {
                self.status = Status::Errored;
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Execute up to `budget` instructions. Returns `Running` if the budget ran out first.
    pub fn run_steps(&mut self, budget: u64, source: &mut dyn InputSource) -> Result<Status, VmError> {
        for _ in 0..budget {
            let status = self.step_once(source)?;
            if status != Status::Running {
                return Ok(status);
            }
        }
        Ok(self.status)
    }

    /// Listing of the next `count` instructions from the current pointer.
    pub fn disassemble(&self, count: usize) -> Vec<(u64, String)> {
        match self.context.pointer {
            Pointer::At(pointer) => disassemble(&self.memory, pointer, count),
            Pointer::Halted => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::input::{ClosedSource, ScriptedSource};
    use crate::simple_ram::FlatMemory;

    fn values(raw: &[i64]) -> Vec<Value> {
        raw.iter().copied().map(Value::from).collect()
    }

    fn machine(raw: &[i64]) -> IntcodeMachine {
        IntcodeMachine::new(&values(raw))
    }

    /// Run a program to completion with a single input and return its output.
    fn run_with_input(raw: &[i64], input: i64) -> Vec<Value> {
        let mut vm = machine(raw);
        vm.push_input(input);
        let outcome = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.status, Status::Halted);
        outcome.output
    }

    const LARGER_COMPARISON: &[i64] = &[
        3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0,
        0, 1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4,
        20, 1105, 1, 46, 98, 99,
    ];

    #[rstest]
    #[case(&[1, 0, 0, 0, 99], &[2, 0, 0, 0, 99])]
    #[case(&[2, 3, 0, 3, 99], &[2, 3, 0, 6, 99])]
    #[case(&[2, 4, 4, 5, 99, 0], &[2, 4, 4, 5, 99, 9801])]
    #[case(&[1, 1, 1, 4, 99, 5, 6, 0, 99], &[30, 1, 1, 4, 2, 5, 6, 0, 99])]
    #[case(&[1002, 4, 3, 4, 33], &[1002, 4, 3, 4, 99])]
    #[case(&[1101, 100, -1, 4, 0], &[1101, 100, -1, 4, 99])]
    fn arithmetic_programs_rewrite_memory(#[case] program: &[i64], #[case] expected: &[i64]) {
        let mut vm = machine(program);
        let outcome = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.status, Status::Halted);
        assert_eq!(vm.memory().to_vec(), values(expected));
    }

    #[test]
    fn gravity_assist_program() {
        let mut vm = machine(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(vm.peek(0), Value::from(3500));
        assert_eq!(vm.peek(3), Value::from(70));
    }

    #[rstest]
    #[case::position_equals(&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], 8, 1)]
    #[case::position_not_equals(&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], 7, 0)]
    #[case::position_less(&[3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8], 5, 1)]
    #[case::position_not_less(&[3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8], 8, 0)]
    #[case::immediate_equals(&[3, 3, 1108, -1, 8, 3, 4, 3, 99], 8, 1)]
    #[case::immediate_not_equals(&[3, 3, 1108, -1, 8, 3, 4, 3, 99], -8, 0)]
    #[case::immediate_less(&[3, 3, 1107, -1, 8, 3, 4, 3, 99], 7, 1)]
    #[case::immediate_not_less(&[3, 3, 1107, -1, 8, 3, 4, 3, 99], 9, 0)]
    #[case::position_jump_zero(&[3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9], 0, 0)]
    #[case::position_jump_nonzero(&[3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9], 5, 1)]
    #[case::immediate_jump_zero(&[3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1], 0, 0)]
    #[case::immediate_jump_nonzero(&[3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1], -3, 1)]
    #[case::below_eight(LARGER_COMPARISON, 7, 999)]
    #[case::eight(LARGER_COMPARISON, 8, 1000)]
    #[case::above_eight(LARGER_COMPARISON, 9, 1001)]
    fn comparison_and_jump_programs(
        #[case] program: &[i64],
        #[case] input: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(run_with_input(program, input), values(&[expected]));
    }

    #[test]
    fn quine_outputs_itself() {
        let program = [
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ];
        let mut vm = machine(&program);
        let outcome = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.output, values(&program));
    }

    #[test]
    fn quine_runs_on_flat_memory() {
        let program = values(&[
            109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
        ]);
        let mut vm = IntcodeMachine::from_memory(FlatMemory::from_program(&program));
        let outcome = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.output, program);
    }

    #[test]
    fn products_do_not_overflow() {
        let mut vm = machine(&[1102, 34_915_192, 34_915_192, 7, 4, 7, 99, 0]);
        let output = vm.run_with_source(&mut ClosedSource).unwrap().output;
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].to_string().len(), 16);
        assert_eq!(output[0], Value::from(1_219_070_632_396_864i64));
    }

    #[test]
    fn large_literal_is_output_verbatim() {
        let mut vm = machine(&[104, 1_125_899_906_842_624, 99]);
        let output = vm.run_with_source(&mut ClosedSource).unwrap().output;
        assert_eq!(output, values(&[1_125_899_906_842_624]));
    }

    #[test]
    fn values_beyond_64_bits_survive_arithmetic() {
        let mut vm = machine(&[1102, i64::MAX, i64::MAX, 7, 4, 7, 99, 0]);
        let output = vm.run_with_source(&mut ClosedSource).unwrap().output;
        let expected = Value::from(i64::MAX) * Value::from(i64::MAX);
        assert_eq!(output, vec![expected]);
    }

    #[test]
    fn far_writes_stay_sparse() {
        let far = 1_000_000_000_000;
        let mut vm = machine(&[1101, 5, 6, far, 4, far, 99]);
        let outcome = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.output, values(&[11]));
        assert_eq!(vm.peek(far as u64), Value::from(11));
        assert_eq!(vm.peek(far as u64 + 1), Value::from(0));
        assert_eq!(vm.memory().allocated_pages(), 2);
    }

    #[test]
    fn suspend_and_resume_round_trip() {
        let mut vm = machine(&[3, 0, 4, 0, 99]);
        let first = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(first.status, Status::Suspended);
        assert!(first.output.is_empty());
        assert_eq!(vm.peek(0), Value::from(3));

        vm.push_input(42);
        let second = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(second.status, Status::Halted);
        assert_eq!(second.output, values(&[42]));
        assert!(vm.is_halted());
    }

    #[test]
    fn resume_appends_input() {
        let mut vm = machine(&[3, 0, 4, 0, 99]);
        vm.run_with_source(&mut ClosedSource).unwrap();
        let outcome = vm.resume([7]).unwrap();
        assert_eq!(outcome.output, values(&[7]));
        assert_eq!(outcome.status, Status::Halted);
    }

    #[test]
    fn segment_output_excludes_earlier_segments() {
        let mut vm = machine(&[104, 7, 3, 0, 104, 8, 99]);
        let first = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(first.output, values(&[7]));
        assert_eq!(first.status, Status::Suspended);
        assert_eq!(first.context.pointer, Pointer::At(2));

        vm.push_input(1);
        let second = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(second.output, values(&[8]));
    }

    #[test]
    fn suspending_again_without_input_is_idempotent() {
        let mut vm = machine(&[3, 0, 99]);
        let first = vm.run_with_source(&mut ClosedSource).unwrap();
        let second = vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(first, second);
        assert_eq!(vm.status(), Status::Suspended);
    }

    #[test]
    fn halted_machine_stays_halted() {
        let mut vm = machine(&[104, 1, 99]);
        assert_eq!(vm.run_with_source(&mut ClosedSource).unwrap().output, values(&[1]));
        let again = vm.run_with_source(&mut ClosedSource).unwrap();
        assert!(again.output.is_empty());
        assert_eq!(again.status, Status::Halted);
        assert_eq!(again.context.pointer, Pointer::Halted);
    }

    #[test]
    fn errored_machine_keeps_its_error() {
        let mut vm = machine(&[1101, 1, 1, 5, 42, 0]);
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert!(matches!(err.fault, Fault::UnknownOpcode { opcode: 42, .. }));
        assert_eq!(err.snapshot.pointer, 4);
        assert_eq!(vm.status(), Status::Errored);
        assert_eq!(vm.error(), Some(&err));
        assert_eq!(vm.run_with_source(&mut ClosedSource).unwrap_err(), err);
    }

    #[test]
    fn immediate_write_destination_errors() {
        let mut vm = machine(&[11101, 1, 1, 5, 99]);
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert_eq!(
            err.fault,
            Fault::InvalidMode {
                parameter: 3,
                digit: 1
            }
        );
    }

    #[test]
    fn invalid_mode_digit_errors() {
        let mut vm = machine(&[304, 0, 99]);
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert_eq!(
            err.fault,
            Fault::InvalidMode {
                parameter: 1,
                digit: 3
            }
        );
    }

    #[test]
    fn negative_relative_address_errors() {
        let mut vm = machine(&[109, -5, 204, 0, 99]);
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert_eq!(
            err.fault,
            Fault::InvalidAddress {
                address: Value::from(-5)
            }
        );
        assert_eq!(err.snapshot.relative_base, Value::from(-5));
    }

    #[test]
    fn blocking_input_discards_malformed_responses() {
        let mut vm = machine(&[3, 0, 4, 0, 99]).with_capabilities(Capabilities::blocking());
        let mut source = ScriptedSource::new(["", "abc", "12"]);
        let outcome = vm.run_with_source(&mut source).unwrap();
        assert_eq!(outcome.output, values(&[12]));
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn queued_input_is_used_before_blocking() {
        let mut vm = machine(&[3, 0, 3, 1, 4, 0, 4, 1, 99])
            .with_capabilities(Capabilities::legacy());
        vm.push_input(1);
        let mut source = ScriptedSource::new(["2"]);
        let outcome = vm.run_with_source(&mut source).unwrap();
        assert_eq!(outcome.output, values(&[1, 2]));
    }

    #[test]
    fn legacy_machine_rejects_relative_mode() {
        let mut vm = machine(&[204, 0, 99]).with_capabilities(Capabilities::legacy());
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert_eq!(
            err.fault,
            Fault::InvalidMode {
                parameter: 1,
                digit: 2
            }
        );
    }

    #[test]
    fn poke_patches_program_before_run() {
        let mut vm = machine(&[1, 5, 6, 0, 99, 0, 0]);
        vm.poke(5, 7).unwrap();
        vm.poke(6, 8).unwrap();
        vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(vm.peek(0), Value::from(15));
    }

    #[rstest]
    #[case::trillion(1_000_000_000_000)]
    #[case::max(u64::MAX)]
    fn flat_memory_rejects_far_destination(#[case] destination: u64) {
        let program = vec![
            Value::from(1101),
            Value::from(1),
            Value::from(1),
            Value::from(destination),
            Value::from(99),
        ];
        let mut vm = IntcodeMachine::from_memory(FlatMemory::from_program(&program));
        let err = vm.run_with_source(&mut ClosedSource).unwrap_err();
        assert_eq!(
            err.fault,
            Fault::InvalidAddress {
                address: Value::from(destination)
            }
        );
        assert_eq!(err.snapshot.pointer, 0);
        assert_eq!(vm.status(), Status::Errored);
        assert_eq!(vm.memory().extent(), 5);
    }

    #[test]
    fn clone_forks_a_suspended_machine() {
        let mut original = machine(&[3, 0, 1002, 0, 2, 0, 4, 0, 99]);
        original.run_with_source(&mut ClosedSource).unwrap();
        let mut fork = original.clone();

        original.push_input(5);
        fork.push_input(21);
        assert_eq!(original.run_with_source(&mut ClosedSource).unwrap().output, values(&[10]));
        assert_eq!(fork.run_with_source(&mut ClosedSource).unwrap().output, values(&[42]));
    }

    #[test]
    fn suspended_machine_survives_serialization() {
        let mut vm = machine(&[109, 3, 203, 0, 204, 0, 99]);
        vm.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(vm.status(), Status::Suspended);

        let json = serde_json::to_string(&vm).unwrap();
        let mut restored: IntcodeMachine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vm);

        restored.push_input(-9);
        let outcome = restored.run_with_source(&mut ClosedSource).unwrap();
        assert_eq!(outcome.output, values(&[-9]));
    }

    #[test]
    fn run_steps_respects_budget() {
        // Jumps back to itself forever.
        let mut vm = machine(&[1105, 1, 0]);
        assert_eq!(vm.run_steps(10, &mut ClosedSource), Ok(Status::Running));
        assert_eq!(vm.context().pointer, Pointer::At(0));

        let mut vm = machine(&[104, 3, 99]);
        assert_eq!(vm.run_steps(1, &mut ClosedSource), Ok(Status::Running));
        assert_eq!(vm.take_output(), values(&[3]));
        assert_eq!(vm.run_steps(5, &mut ClosedSource), Ok(Status::Halted));
    }

    #[test]
    fn parse_loads_program_text() {
        let mut vm = IntcodeMachine::parse("104,-3,99\n").unwrap();
        assert_eq!(vm.disassemble(2), vec![(0, "OUTPUT -3".to_string()), (2, "HALT".to_string())]);
        assert_eq!(vm.run_with_source(&mut ClosedSource).unwrap().output, values(&[-3]));
        assert!(vm.disassemble(1).is_empty());
        assert!(IntcodeMachine::parse("1,two").is_err());
    }
}
