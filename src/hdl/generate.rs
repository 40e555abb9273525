//! Text generation: circuit graph to HDL source.
//!
//! Two styles are produced. [`generate`] writes continuous assignments and
//! is what the editor shows; [`generate_netlist`] writes gate primitives.
//! Both read back through [`parse`](super::parse) into an equivalent
//! circuit.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::circuit::{Circuit, Gate, GateId, GateKind};

/// Options for the assignment-style generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Name written in the module header
    pub module_name: String,
    /// Emit the leading comment line
    pub header_comment: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            module_name: "visual_circuit".to_string(),
            header_comment: true,
        }
    }
}

impl GeneratorOptions {
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }
}

/// Net name of every gate output, assigned before any text is written so
/// forward references resolve.
struct NetNames {
    names: HashMap<GateId, String>,
}

impl NetNames {
    fn assign(circuit: &Circuit, input: impl Fn(usize) -> String, logic: impl Fn(&Gate, usize) -> String) -> Self {
        let mut names = HashMap::new();
        for (i, gate) in circuit.input_gates().enumerate() {
            names.insert(gate.id, input(i + 1));
        }
        for (i, gate) in circuit.logic_gates().enumerate() {
            names.insert(gate.id, logic(gate, i + 1));
        }
        Self { names }
    }

    /// Net feeding `pin` of `gate`, if anything drives it.
    fn driver(&self, circuit: &Circuit, gate: GateId, pin: usize) -> Option<&str> {
        let wire = circuit.driver_of(gate, pin)?;
        self.names.get(&wire.source.gate).map(String::as_str)
    }

    fn get(&self, gate: GateId) -> &str {
        self.names.get(&gate).map(String::as_str).unwrap_or(ZERO)
    }
}

const ZERO: &str = "1'b0";

/// Constant low in primitive netlists.
const NETLIST_ZERO: &str = "0";

fn expression(kind: GateKind, a: &str, b: &str) -> String {
    match kind {
        GateKind::Not => format!("~{}", a),
        GateKind::And => format!("{} & {}", a, b),
        GateKind::Or => format!("{} | {}", a, b),
        GateKind::Xor => format!("{} ^ {}", a, b),
        GateKind::Nand => format!("~({} & {})", a, b),
        GateKind::Nor => format!("~({} | {})", a, b),
        GateKind::Xnor => format!("~({} ^ {})", a, b),
        GateKind::Input | GateKind::Output => a.to_string(),
    }
}

/// Generate assignment-style source.
///
/// Ports are named `input1..` and `output1..` in creation order. Logic
/// gate `k` (1-based, creation order) drives `<kind>_out<k>`. Unconnected
/// pins read `1'b0`; a gate with no connected inputs, or an OUTPUT with no
/// driver, is written as a comment.
pub fn generate(circuit: &Circuit, options: &GeneratorOptions) -> String {
    let nets = NetNames::assign(
        circuit,
        |i| format!("input{}", i),
        |gate, i| format!("{}_out{}", gate.kind.name().to_lowercase(), i),
    );
    let outputs: Vec<GateId> = circuit.output_gates().map(|g| g.id).collect();

    let mut ports: Vec<String> = circuit
        .input_gates()
        .map(|g| format!("    input wire {}", nets.get(g.id)))
        .collect();
    ports.extend((1..=outputs.len()).map(|i| format!("    output wire output{}", i)));

    let mut out = String::new();
    if options.header_comment {
        out.push_str("// Generated from visual circuit\n");
    }
    if ports.is_empty() {
        let _ = writeln!(out, "module {}();", options.module_name);
    } else {
        let _ = writeln!(out, "module {}(", options.module_name);
        let _ = writeln!(out, "{}", ports.join(",\n"));
        out.push_str(");\n");
    }

    if circuit.logic_gates().next().is_some() {
        out.push_str("\n    // Internal wires\n");
        for gate in circuit.logic_gates() {
            let _ = writeln!(out, "    wire {};", nets.get(gate.id));
        }

        out.push_str("\n    // Logic implementation\n");
        for gate in circuit.logic_gates() {
            let name = nets.get(gate.id);
            let pins: Vec<Option<&str>> = (0..gate.kind.input_count())
                .map(|pin| nets.driver(circuit, gate.id, pin))
                .collect();
            if pins.iter().all(Option::is_none) {
                let _ = writeln!(out, "    // assign {} = {}; // Unconnected gate", name, ZERO);
                continue;
            }
            let a = pins.first().copied().flatten().unwrap_or(ZERO);
            let b = pins.get(1).copied().flatten().unwrap_or(ZERO);
            let _ = writeln!(out, "    assign {} = {};", name, expression(gate.kind, a, b));
        }
    }

    if !outputs.is_empty() {
        out.push('\n');
    }
    for (i, &id) in outputs.iter().enumerate() {
        match nets.driver(circuit, id, 0) {
            Some(source) => {
                let _ = writeln!(out, "    assign output{} = {};", i + 1, source);
            }
            None => {
                let _ = writeln!(out, "    // assign output{} = {}; // Unconnected output", i + 1, ZERO);
            }
        }
    }

    out.push_str("\nendmodule\n");
    out
}

/// Generate primitive-instance source (`and (y, a, b);`).
///
/// Ports are `input_k`/`output_k`, each logic gate drives `gate_<id>_out`
/// and unconnected pins or OUTPUTs are tied to `0`.
pub fn generate_netlist(circuit: &Circuit, module_name: &str) -> String {
    let nets = NetNames::assign(circuit, |i| format!("input_{}", i), |gate, _| format!("{}_out", gate.id));

    let inputs: Vec<&str> = circuit.input_gates().map(|g| nets.get(g.id)).collect();
    let outputs: Vec<String> = (1..=circuit.output_gates().count())
        .map(|i| format!("output_{}", i))
        .collect();

    let mut out = String::from("// Generated Verilog Code\n// Digital Logic Simulator\n\n");
    let mut port_lines = Vec::new();
    if !inputs.is_empty() {
        port_lines.push(format!("    input {}", inputs.join(", ")));
    }
    if !outputs.is_empty() {
        port_lines.push(format!("    output {}", outputs.join(", ")));
    }
    if port_lines.is_empty() {
        let _ = writeln!(out, "module {} ();", module_name);
    } else {
        let _ = writeln!(out, "module {} (", module_name);
        let _ = writeln!(out, "{}", port_lines.join(",\n"));
        out.push_str(");\n");
    }

    if circuit.logic_gates().next().is_some() {
        out.push('\n');
        for gate in circuit.logic_gates() {
            let _ = writeln!(out, "    wire {};", nets.get(gate.id));
        }
        out.push('\n');
        for gate in circuit.logic_gates() {
            let pins: Vec<Option<&str>> = (0..gate.kind.input_count())
                .map(|pin| nets.driver(circuit, gate.id, pin))
                .collect();
            let mut terminals = vec![nets.get(gate.id)];
            terminals.extend(pins.iter().map(|p| p.unwrap_or(NETLIST_ZERO)));
            let primitive = gate.kind.primitive().unwrap_or("buf");
            let instance = format!("{} ({});", primitive, terminals.join(", "));
            if pins.iter().all(Option::is_none) {
                let _ = writeln!(out, "    // {} // Unconnected gate", instance);
            } else {
                let _ = writeln!(out, "    {}", instance);
            }
        }
    }

    if !outputs.is_empty() {
        out.push('\n');
    }
    for (name, gate) in outputs.iter().zip(circuit.output_gates()) {
        let source = nets.driver(circuit, gate.id, 0).unwrap_or(NETLIST_ZERO);
        let _ = writeln!(out, "    assign {} = {};", name, source);
    }

    out.push_str("\nendmodule\n");
    out
}
