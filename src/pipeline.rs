//! Multi-machine drivers built on suspend/resume: amplifier chains, feedback loops and the
//! phase setting search over them. The VM knows nothing about any of this.

use itertools::Itertools;
use num::Zero;
use thiserror::Error;
use tracing::debug;

use crate::error::VmError;
use crate::input::ClosedSource;
use crate::machine::IntcodeMachine;
use crate::types::Value;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Vm(#[from] VmError),

    #[error("stage {stage} stopped without producing a signal")]
    NoOutput { stage: usize },

    #[error("{amplifiers} amplifiers need at least as many distinct phase values, got {available}")]
    NotEnoughPhases { amplifiers: usize, available: usize },
}

/// How the amplifiers are connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wiring {
    /// Each machine runs once, feeding the next.
    Chain,
    /// The last machine feeds the first until a machine halts.
    FeedbackLoop,
}

impl Wiring {
    pub fn run(self, program: &[Value], phases: &[Value]) -> Result<Value, PipelineError> {
        match self {
            Wiring::Chain => run_chain(program, phases),
            Wiring::FeedbackLoop => run_feedback_loop(program, phases),
        }
    }
}

/// Run one fresh machine per phase, each fed `[phase, signal]`. The signal starts at 0 and
/// becomes the last value each stage outputs.
pub fn run_chain(program: &[Value], phases: &[Value]) -> Result<Value, PipelineError> {
    let mut signal = Value::zero();
    for (stage, phase) in phases.iter().enumerate() {
        let mut machine = IntcodeMachine::new(program);
        machine.extend_input([phase.clone(), signal]);
        let outcome = machine.run_with_source(&mut ClosedSource)?;
        signal = outcome
            .output
            .into_iter()
            .last()
            .ok_or(PipelineError::NoOutput { stage })?;
    }
    Ok(signal)
}

/// Round robin over suspended machines. The first visit feeds `[phase, signal]`, later visits
/// feed `[signal]`. Returns the last signal once a machine is found halted on its turn.
/// A round may pass without output, since a stage can need several inputs per signal.
/// A program that never halts keeps the loop running.
pub fn run_feedback_loop(program: &[Value], phases: &[Value]) -> Result<Value, PipelineError> {
    let mut machines: Vec<IntcodeMachine> = phases
        .iter()
        .map(|phase| {
            let mut machine = IntcodeMachine::new(program);
            machine.push_input(phase.clone());
            machine
        })
        .collect();
    let mut signal = Value::zero();
    if machines.is_empty() {
        return Ok(signal);
    }

    for round in 0u64.. {
        for (stage, machine) in machines.iter_mut().enumerate() {
            if machine.is_halted() {
                debug!(round, stage, signal = %signal, "feedback loop finished");
                return Ok(signal);
            }
            machine.push_input(signal.clone());
            let outcome = machine.run_with_source(&mut ClosedSource)?;
            if let Some(value) = outcome.output.into_iter().last() {
                signal = value;
            }
        }
    }
    Ok(signal)
}

/// Try every ordering of `amplifiers` distinct values drawn from `phase_values`. Returns the
/// first setting whose signal is strictly highest, or `None` when no setting beats 0.
pub fn best_phase_setting(
    program: &[Value],
    amplifiers: usize,
    phase_values: &[Value],
    wiring: Wiring,
) -> Result<Option<(Vec<Value>, Value)>, PipelineError> {
    let distinct: Vec<Value> = phase_values.iter().cloned().unique().collect();
    if distinct.len() < amplifiers {
        return Err(PipelineError::NotEnoughPhases {
            amplifiers,
            available: distinct.len(),
        });
    }

    let mut best: Option<(Vec<Value>, Value)> = None;
    let mut best_signal = Value::zero();
    for phases in distinct.into_iter().permutations(amplifiers) {
        let signal = wiring.run(program, &phases)?;
        if signal > best_signal {
            best_signal = signal.clone();
            best = Some((phases, signal));
        }
    }
    Ok(best)
}
