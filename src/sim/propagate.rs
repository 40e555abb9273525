//! Bounded level-synchronous value propagation.

use log::{debug, warn};
use serde::Serialize;

use super::logic::evaluate;
use super::{BATCH_MAX_ITERATIONS, INTERACTIVE_MAX_ITERATIONS};
use crate::circuit::{Circuit, GateId, GateKind};

/// Configuration for a propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// Iteration cap; the run stops here even if values still change.
    pub max_iterations: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl SimConfig {
    /// Settings for a user-triggered (animated) simulation.
    pub fn interactive() -> Self {
        Self {
            max_iterations: INTERACTIVE_MAX_ITERATIONS,
        }
    }

    /// Settings for truth-table enumeration.
    pub fn batch() -> Self {
        Self {
            max_iterations: BATCH_MAX_ITERATIONS,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Propagation {
    /// Iterations executed, including the final quiet one.
    pub iterations: usize,
    /// False when the cap was hit while values were still changing.
    pub converged: bool,
}

/// What changed during one iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterationReport {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Indices (into [`Circuit::wires`]) of wires that delivered a new value.
    pub wires_changed: Vec<usize>,
    /// Gates whose output changed.
    pub gates_changed: Vec<GateId>,
}

impl IterationReport {
    /// True if anything changed.
    pub fn changed(&self) -> bool {
        !self.wires_changed.is_empty() || !self.gates_changed.is_empty()
    }
}

/// Receives every iteration's intermediate state. Presentation layers
/// hook animation in here; the propagation itself never waits on them.
pub trait PropagationObserver {
    fn on_iteration(&mut self, circuit: &Circuit, report: &IterationReport);
}

impl<F> PropagationObserver for F
where
    F: FnMut(&Circuit, &IterationReport),
{
    fn on_iteration(&mut self, circuit: &Circuit, report: &IterationReport) {
        self(circuit, report)
    }
}

/// Result of advancing a [`Propagator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// One iteration ran; more may follow.
    Iterated(IterationReport),
    /// The run is over.
    Finished(Propagation),
}

/// A propagation run that advances one iteration per call.
///
/// The propagator holds no reference to the circuit, so a host event loop
/// can keep it between frames and resume with [`Propagator::step`].
#[derive(Debug, Clone)]
pub struct Propagator {
    config: SimConfig,
    iteration: usize,
    started: bool,
    outcome: Option<Propagation>,
}

impl Propagator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            iteration: 0,
            started: false,
            outcome: None,
        }
    }

    /// Iterations executed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Final outcome, once finished.
    pub fn outcome(&self) -> Option<Propagation> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Run one iteration (resetting the circuit first on the initial call).
    pub fn step(&mut self, circuit: &mut Circuit) -> Step {
        if let Some(outcome) = self.outcome {
            return Step::Finished(outcome);
        }
        if !self.started {
            reset(circuit);
            self.started = true;
        }
        if self.iteration >= self.config.max_iterations {
            return self.finish(false);
        }

        self.iteration += 1;
        let report = iterate(circuit, self.iteration);
        debug!(
            "iteration {}: {} wire(s), {} gate(s) changed",
            self.iteration,
            report.wires_changed.len(),
            report.gates_changed.len()
        );

        if !report.changed() {
            self.outcome = Some(Propagation {
                iterations: self.iteration,
                converged: true,
            });
        } else if self.iteration >= self.config.max_iterations {
            warn!(
                "propagation still changing after {} iterations; keeping last state",
                self.iteration
            );
            self.outcome = Some(Propagation {
                iterations: self.iteration,
                converged: false,
            });
        }
        Step::Iterated(report)
    }

    fn finish(&mut self, converged: bool) -> Step {
        let outcome = Propagation {
            iterations: self.iteration,
            converged,
        };
        self.outcome = Some(outcome);
        Step::Finished(outcome)
    }
}

/// Zero every pin of every non-INPUT gate.
pub fn reset(circuit: &mut Circuit) {
    circuit
        .gates_mut()
        .iter_mut()
        .filter(|g| g.kind != GateKind::Input)
        .for_each(|g| g.reset_pins());
}

/// One iteration: copy every wire, then recompute every gate.
fn iterate(circuit: &mut Circuit, iteration: usize) -> IterationReport {
    let mut report = IterationReport {
        iteration,
        ..Default::default()
    };

    let transfers: Vec<(usize, GateId, usize, bool)> = circuit
        .wires()
        .iter()
        .enumerate()
        .filter_map(|(idx, w)| {
            let value = circuit.gate(w.source.gate)?.output(w.source.index)?;
            Some((idx, w.target.gate, w.target.index, value))
        })
        .collect();
    for (idx, gate, pin, value) in transfers {
        if let Some(target) = circuit.gate_mut(gate) {
            if target.set_input_pin(pin, value) {
                report.wires_changed.push(idx);
            }
        }
    }

    for gate in circuit.gates_mut() {
        if let Some(value) = evaluate(gate.kind, gate.input_values()) {
            if gate.set_output_pin(0, value) {
                report.gates_changed.push(gate.id);
            }
        }
    }

    report
}

/// Run a full propagation.
pub fn propagate(circuit: &mut Circuit, config: SimConfig) -> Propagation {
    propagate_observed(circuit, config, &mut |_: &Circuit, _: &IterationReport| {})
}

/// Run a full propagation, reporting each iteration to `observer`.
pub fn propagate_observed<O>(circuit: &mut Circuit, config: SimConfig, observer: &mut O) -> Propagation
where
    O: PropagationObserver + ?Sized,
{
    let mut run = Propagator::new(config);
    loop {
        match run.step(circuit) {
            Step::Iterated(report) => observer.on_iteration(circuit, &report),
            Step::Finished(outcome) => return outcome,
        }
    }
}
