//! Elaboration: build a circuit graph from a parsed module.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use super::ast::{CellDef, CellKind, Diagnostic, ModuleAst, Operand};
use crate::circuit::{Circuit, GateId, GateKind, Position};
use crate::layout::{self, LayoutConfig};

/// A module turned into gates and wires.
#[derive(Debug, Clone)]
pub struct Elaboration {
    pub circuit: Circuit,
    /// INPUT gate created for each input port, in port order
    pub inputs: Vec<(String, GateId)>,
    /// OUTPUT gate created for each output port, in port order
    pub outputs: Vec<(String, GateId)>,
    /// Findings that did not stop elaboration
    pub diagnostics: Vec<Diagnostic>,
}

impl Elaboration {
    pub fn input_gate(&self, name: &str) -> Option<GateId> {
        find(&self.inputs, name)
    }

    pub fn output_gate(&self, name: &str) -> Option<GateId> {
        find(&self.outputs, name)
    }
}

fn find(ports: &[(String, GateId)], name: &str) -> Option<GateId> {
    ports.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
}

/// Elaborate and arrange with the default layout.
pub fn elaborate(module: &ModuleAst) -> Elaboration {
    elaborate_with(module, &LayoutConfig::default())
}

/// Elaborate, then arrange the result with `layout`.
///
/// Gates are created in a fixed order: one INPUT per input port, one OUTPUT
/// per output port, then the logic gates in statement order. Aliases are
/// followed to the gate that really drives a net, constant-0 operands leave
/// the pin unconnected, and each output port is wired from whatever drives
/// the net of the same name.
pub fn elaborate_with(module: &ModuleAst, layout: &LayoutConfig) -> Elaboration {
    let mut builder = Builder::default();
    let mut inputs = Vec::with_capacity(module.inputs.len());
    let mut outputs = Vec::with_capacity(module.outputs.len());

    for name in &module.inputs {
        let id = builder.circuit.create_gate(GateKind::Input, Position::default());
        builder.drivers.insert(name.as_str(), id);
        inputs.push((name.clone(), id));
    }
    for name in &module.outputs {
        let id = builder.circuit.create_gate(GateKind::Output, Position::default());
        outputs.push((name.clone(), id));
    }

    for cell in &module.cells {
        builder.add_cell(cell, &module.inputs);
    }
    builder.connect_pending();

    for (name, (_, terminal)) in module.outputs.iter().zip(&outputs) {
        if let Some(source) = builder.resolve(name, module.line) {
            builder.connect(source, *terminal, 0, module.line);
        }
    }

    let Builder {
        mut circuit,
        diagnostics,
        ..
    } = builder;
    layout::arrange(&mut circuit, layout);
    info!(
        "elaborated module '{}': {} gate(s), {} wire(s), {} diagnostic(s)",
        module.name,
        circuit.gate_count(),
        circuit.wire_count(),
        diagnostics.len()
    );

    Elaboration {
        circuit,
        inputs,
        outputs,
        diagnostics,
    }
}

/// An input pin waiting for its net to be resolved.
struct Pending<'m> {
    gate: GateId,
    pin: usize,
    operand: &'m Operand,
    line: usize,
}

#[derive(Default)]
struct Builder<'m> {
    circuit: Circuit,
    /// Net name to the gate whose output drives it
    drivers: HashMap<&'m str, GateId>,
    /// Net name to the operand it is a plain copy of
    aliases: HashMap<&'m str, &'m Operand>,
    pending: Vec<Pending<'m>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'m> Builder<'m> {
    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(line, message));
    }

    fn add_cell(&mut self, cell: &'m CellDef, input_ports: &[String]) {
        let target = cell.output.as_str();
        if input_ports.iter().any(|p| p == target) {
            self.warn(cell.line, format!("input port '{}' cannot be driven", target));
            return;
        }
        if self.drivers.contains_key(target) || self.aliases.contains_key(target) {
            self.warn(cell.line, format!("'{}' has more than one driver; keeping the first", target));
            return;
        }

        match cell.kind {
            CellKind::Alias => match cell.inputs.as_slice() {
                [operand] => {
                    self.aliases.insert(target, operand);
                }
                _ => self.warn(cell.line, format!("alias '{}' needs exactly one operand", target)),
            },
            CellKind::Gate(kind) => {
                if let Some(id) = self.add_gate(cell, kind) {
                    self.drivers.insert(target, id);
                }
            }
        }
    }

    /// Create the gate (or chain of 2-input gates) for one cell and queue
    /// its operands. Returns the gate driving the cell's net.
    fn add_gate(&mut self, cell: &'m CellDef, kind: GateKind) -> Option<GateId> {
        let operands = &cell.inputs;
        let arity_ok = match kind {
            GateKind::Not => operands.len() == 1,
            GateKind::Input | GateKind::Output => false,
            _ => operands.len() >= 2,
        };
        if !arity_ok {
            self.warn(
                cell.line,
                format!("{} gate for '{}' cannot take {} operand(s)", kind, cell.output, operands.len()),
            );
            return None;
        }

        if kind == GateKind::Not {
            let gate = self.circuit.create_gate(kind, Position::default());
            self.queue(gate, 0, &operands[0], cell.line);
            return Some(gate);
        }

        // a op b op c becomes base(base(a, b), c) with the inversion, if
        // any, on the last gate only.
        let last = operands.len() - 2;
        let pick = |step: usize| if step == last { kind } else { kind.base() };
        let mut acc = self.circuit.create_gate(pick(0), Position::default());
        self.queue(acc, 0, &operands[0], cell.line);
        self.queue(acc, 1, &operands[1], cell.line);
        for (i, operand) in operands[2..].iter().enumerate() {
            let gate = self.circuit.create_gate(pick(i + 1), Position::default());
            self.connect(acc, gate, 0, cell.line);
            self.queue(gate, 1, operand, cell.line);
            acc = gate;
        }
        if operands.len() > 2 {
            debug!("'{}': {}-input {} split into {} gates", cell.output, operands.len(), kind, last + 1);
        }
        Some(acc)
    }

    fn queue(&mut self, gate: GateId, pin: usize, operand: &'m Operand, line: usize) {
        self.pending.push(Pending {
            gate,
            pin,
            operand,
            line,
        });
    }

    fn connect_pending(&mut self) {
        for p in std::mem::take(&mut self.pending) {
            match p.operand {
                Operand::Signal(name) => {
                    if let Some(source) = self.resolve(name, p.line) {
                        self.connect(source, p.gate, p.pin, p.line);
                    }
                }
                Operand::Const(false) => {}
                Operand::Const(true) => self.warn(p.line, "constant 1 is not supported; pin left at 0"),
            }
        }
    }

    /// Follow aliases from `name` to the gate driving it.
    fn resolve(&mut self, name: &'m str, line: usize) -> Option<GateId> {
        let mut current = name;
        let mut visited = HashSet::new();
        loop {
            if let Some(&id) = self.drivers.get(current) {
                return Some(id);
            }
            let alias: Option<&'m Operand> = self.aliases.get(current).copied();
            match alias {
                Some(Operand::Signal(next)) => {
                    if !visited.insert(current) {
                        self.warn(line, format!("alias loop through '{}'", name));
                        return None;
                    }
                    current = next.as_str();
                }
                Some(Operand::Const(false)) => return None,
                Some(Operand::Const(true)) => {
                    self.warn(line, format!("'{}' is tied to constant 1, which is not supported", name));
                    return None;
                }
                None => {
                    self.warn(line, format!("'{}' is not driven", current));
                    return None;
                }
            }
        }
    }

    fn connect(&mut self, from: GateId, to: GateId, pin: usize, line: usize) {
        if let Err(e) = self.circuit.connect_gates(from, to, pin) {
            self.warn(line, e.to_string());
        }
    }
}
