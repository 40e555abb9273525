//! Editing session: one circuit, at most one simulation run in flight.
//!
//! While a stepped run is active every structural edit and every other
//! simulation request is refused with [`LogicError::SimulationInProgress`].
//! `clear` and the whole-design loaders discard the run instead.

use log::{debug, info};
use serde::Serialize;

use crate::circuit::{find_cycle, Circuit, Design, GateId, GateKind, Levels, PinRef, Position, Wire};
use crate::error::{LogicError, Result};
use crate::hdl::{self, Diagnostic, GeneratorOptions};
use crate::layout::{self, LayoutConfig, Placement};
use crate::sim::{propagate_observed, IterationReport, Propagation, Propagator, SimConfig, Step, TruthTable};

/// Counts shown in the editor's status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub inputs: usize,
    pub outputs: usize,
    pub logic_gates: usize,
    pub wires: usize,
    /// Deepest topological level
    pub depth: usize,
    pub has_cycle: bool,
}

/// The editor's circuit plus its simulation state.
#[derive(Debug, Default)]
pub struct Workbench {
    circuit: Circuit,
    config: SimConfig,
    run: Option<Propagator>,
    layout: LayoutConfig,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for [`Workbench::simulate`] and stepped runs.
    pub fn with_sim_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `layout` when arranging.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// True while a stepped run is active.
    pub fn is_simulating(&self) -> bool {
        self.run.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.run.is_some() {
            return Err(LogicError::SimulationInProgress);
        }
        Ok(())
    }

    // Editing

    pub fn create_gate(&mut self, kind: GateKind, position: Position) -> Result<GateId> {
        self.ensure_idle()?;
        Ok(self.circuit.create_gate(kind, position))
    }

    pub fn delete_gate(&mut self, id: GateId) -> Result<()> {
        self.ensure_idle()?;
        self.circuit.delete_gate(id).map(|_| ())
    }

    pub fn connect(&mut self, a: PinRef, b: PinRef) -> Result<()> {
        self.ensure_idle()?;
        self.circuit.connect(a, b).map(|_| ())
    }

    /// Remove a wire. False if it was already gone.
    pub fn delete_wire(&mut self, wire: &Wire) -> Result<bool> {
        self.ensure_idle()?;
        Ok(self.circuit.delete_wire(wire))
    }

    pub fn set_input(&mut self, id: GateId, value: bool) -> Result<()> {
        self.ensure_idle()?;
        self.circuit.set_input(id, value)
    }

    /// Toggle an INPUT gate and return its new value.
    pub fn toggle_input(&mut self, id: GateId) -> Result<bool> {
        self.ensure_idle()?;
        let value = !self.circuit.gate(id).and_then(|g| g.output(0)).unwrap_or(false);
        self.circuit.set_input(id, value)?;
        Ok(value)
    }

    /// Moving gates is cosmetic and allowed during a run.
    pub fn move_gate(&mut self, id: GateId, position: Position) -> Result<()> {
        self.circuit.set_position(id, position)
    }

    /// Remove everything, abandoning any run in flight.
    pub fn clear(&mut self) {
        if self.run.take().is_some() {
            debug!("clear abandoned the running simulation");
        }
        self.circuit.clear();
    }

    // Simulation

    /// Run a full propagation.
    pub fn simulate(&mut self) -> Result<Propagation> {
        self.simulate_observed(|_: &Circuit, _: &IterationReport| {})
    }

    /// Run a full propagation, passing each iteration to `observer`.
    pub fn simulate_observed<F>(&mut self, mut observer: F) -> Result<Propagation>
    where
        F: FnMut(&Circuit, &IterationReport),
    {
        self.ensure_idle()?;
        Ok(propagate_observed(&mut self.circuit, self.config, &mut observer))
    }

    /// Start a stepped run. Advance it with [`Workbench::step_simulation`].
    pub fn begin_simulation(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.run = Some(Propagator::new(self.config));
        Ok(())
    }

    /// Advance the stepped run by one iteration. The run slot is released
    /// when the result is [`Step::Finished`].
    pub fn step_simulation(&mut self) -> Result<Step> {
        let run = self.run.as_mut().ok_or(LogicError::NoSimulation)?;
        let step = run.step(&mut self.circuit);
        if let Step::Finished(outcome) = step {
            self.run = None;
            info!(
                "simulation finished after {} iteration(s){}",
                outcome.iterations,
                if outcome.converged { "" } else { " without settling" }
            );
        }
        Ok(step)
    }

    /// Drop the stepped run, keeping whatever values it reached.
    pub fn cancel_simulation(&mut self) -> bool {
        self.run.take().is_some()
    }

    /// Enumerate every input assignment.
    pub fn truth_table(&mut self) -> Result<TruthTable> {
        self.ensure_idle()?;
        TruthTable::generate(&mut self.circuit)
    }

    // Text and persistence

    /// Assignment-style source for the current circuit.
    pub fn generate_hdl(&self, options: &GeneratorOptions) -> String {
        hdl::generate(&self.circuit, options)
    }

    /// Primitive-instance source for the current circuit.
    pub fn generate_netlist(&self) -> String {
        hdl::generate_netlist(&self.circuit, hdl::DEFAULT_NETLIST_MODULE)
    }

    /// Replace the circuit with the one described by `text`.
    ///
    /// A missing module header leaves the current circuit untouched.
    pub fn load_hdl(&mut self, text: &str) -> Result<Vec<Diagnostic>> {
        let parsed = hdl::parse(text)?;
        let mut elaboration = hdl::elaborate_with(&parsed.module, &self.layout);
        let mut diagnostics = parsed.diagnostics;
        diagnostics.append(&mut elaboration.diagnostics);

        self.run = None;
        self.circuit = elaboration.circuit;
        Ok(diagnostics)
    }

    pub fn save_design(&self) -> Design {
        Design::from_circuit(&self.circuit)
    }

    /// Replace the circuit with a saved design.
    pub fn load_design(&mut self, design: &Design) -> Result<()> {
        let circuit = design.to_circuit()?;
        self.run = None;
        self.circuit = circuit;
        Ok(())
    }

    pub fn save_json(&self) -> Result<String> {
        self.save_design().to_json()
    }

    pub fn load_json(&mut self, text: &str) -> Result<()> {
        self.load_design(&Design::from_json(text)?)
    }

    /// Arrange every gate by topological level.
    pub fn auto_arrange(&mut self) -> Placement {
        layout::arrange(&mut self.circuit, &self.layout)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            inputs: self.circuit.input_gates().count(),
            outputs: self.circuit.output_gates().count(),
            logic_gates: self.circuit.logic_gates().count(),
            wires: self.circuit.wire_count(),
            depth: Levels::compute(&self.circuit).max_level(),
            has_cycle: find_cycle(&self.circuit).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(w: &mut Workbench, kind: GateKind) -> GateId {
        w.create_gate(kind, Position::default()).unwrap()
    }

    #[test]
    fn test_single_gate_circuit() {
        let mut w = Workbench::new();
        let a = gate(&mut w, GateKind::Input);
        let b = gate(&mut w, GateKind::Input);
        let g = gate(&mut w, GateKind::And);
        let o = gate(&mut w, GateKind::Output);
        w.connect(PinRef::output(a, 0), PinRef::input(g, 0)).unwrap();
        w.connect(PinRef::output(b, 0), PinRef::input(g, 1)).unwrap();
        w.connect(PinRef::output(g, 0), PinRef::input(o, 0)).unwrap();

        w.set_input(a, true).unwrap();
        w.set_input(b, true).unwrap();
        assert!(w.simulate().unwrap().converged);
        assert_eq!(w.circuit().output_value(o), Some(true));

        w.set_input(b, false).unwrap();
        w.simulate().unwrap();
        assert_eq!(w.circuit().output_value(o), Some(false));
    }

    #[test]
    fn test_run_excludes_edits() {
        let mut w = Workbench::new();
        let a = gate(&mut w, GateKind::Input);
        let n = gate(&mut w, GateKind::Not);
        w.begin_simulation().unwrap();
        assert!(w.is_simulating());

        assert!(matches!(w.begin_simulation(), Err(LogicError::SimulationInProgress)));
        assert!(matches!(w.simulate(), Err(LogicError::SimulationInProgress)));
        assert!(matches!(w.truth_table(), Err(LogicError::SimulationInProgress)));
        assert!(matches!(
            w.connect(PinRef::output(a, 0), PinRef::input(n, 0)),
            Err(LogicError::SimulationInProgress)
        ));
        assert!(matches!(w.set_input(a, true), Err(LogicError::SimulationInProgress)));
        assert!(w.move_gate(n, Position::new(5.0, 5.0)).is_ok());

        let outcome = loop {
            if let Step::Finished(outcome) = w.step_simulation().unwrap() {
                break outcome;
            }
        };
        assert!(outcome.converged);
        assert!(!w.is_simulating());
        assert!(w.connect(PinRef::output(a, 0), PinRef::input(n, 0)).is_ok());
        assert!(matches!(w.step_simulation(), Err(LogicError::NoSimulation)));
    }

    #[test]
    fn test_clear_abandons_run() {
        let mut w = Workbench::new();
        gate(&mut w, GateKind::Not);
        w.begin_simulation().unwrap();
        w.step_simulation().unwrap();
        w.clear();
        assert!(!w.is_simulating());
        assert!(w.circuit().is_empty());
        assert_eq!(gate(&mut w, GateKind::Input), GateId(0));
    }

    #[test]
    fn test_cancel_keeps_reached_values() {
        let mut w = Workbench::new();
        let n = gate(&mut w, GateKind::Not);
        w.begin_simulation().unwrap();
        w.step_simulation().unwrap();
        assert!(w.cancel_simulation());
        assert!(!w.cancel_simulation());
        assert_eq!(w.circuit().gate(n).unwrap().output(0), Some(true));
    }

    #[test]
    fn test_observed_iterations() {
        let mut w = Workbench::new();
        let a = gate(&mut w, GateKind::Input);
        let n = gate(&mut w, GateKind::Not);
        let o = gate(&mut w, GateKind::Output);
        w.connect(PinRef::output(a, 0), PinRef::input(n, 0)).unwrap();
        w.connect(PinRef::output(n, 0), PinRef::input(o, 0)).unwrap();

        let mut iterations = 0;
        let outcome = w.simulate_observed(|_, _| iterations += 1).unwrap();
        assert_eq!(iterations, outcome.iterations);
        assert_eq!(w.circuit().output_value(o), Some(true));
    }

    #[test]
    fn test_text_round_trip_preserves_behaviour() {
        let mut w = Workbench::new();
        let diagnostics = w
            .load_hdl("module m(input a, b, c, output y);\nassign y = a | b | c;\nendmodule")
            .unwrap();
        assert!(diagnostics.is_empty());
        let expected = w.truth_table().unwrap().output_signature();
        assert_eq!(expected.iter().filter(|row| row[0]).count(), 7);

        let text = w.generate_hdl(&GeneratorOptions::default());
        let mut other = Workbench::new();
        assert!(other.load_hdl(&text).unwrap().is_empty());
        assert_eq!(other.truth_table().unwrap().output_signature(), expected);
    }

    #[test]
    fn test_failed_load_keeps_circuit() {
        let mut w = Workbench::new();
        gate(&mut w, GateKind::Xor);
        assert!(matches!(w.load_hdl("assign y = a;"), Err(LogicError::NoModuleDeclaration)));
        assert!(w.load_json("not json").is_err());
        assert_eq!(w.circuit().gate_count(), 1);
    }

    #[test]
    fn test_json_round_trip_and_summary() {
        let mut w = Workbench::new();
        w.load_hdl("module m(input a, output y);\nassign y = ~a;\nendmodule")
            .unwrap();
        let json = w.save_json().unwrap();

        let mut other = Workbench::new();
        other.load_json(&json).unwrap();
        assert_eq!(other.circuit().gates(), w.circuit().gates());
        assert_eq!(
            other.summary(),
            Summary {
                inputs: 1,
                outputs: 1,
                logic_gates: 1,
                wires: 2,
                depth: 2,
                has_cycle: false,
            }
        );
    }
}
