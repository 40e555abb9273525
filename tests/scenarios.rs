use logicsim_core::circuit::{validate_circuit, Design};
use logicsim_core::error::ConnectionErrorKind;
use logicsim_core::hdl::{self, CellDef, CellKind, GeneratorOptions, Operand};
use logicsim_core::{propagate, Circuit, GateId, GateKind, PinRef, Position, SimConfig, TruthTable};

fn gate(c: &mut Circuit, kind: GateKind) -> GateId {
    c.create_gate(kind, Position::default())
}

#[test]
fn and_gate_follows_its_inputs() {
    let mut c = Circuit::new();
    let a = gate(&mut c, GateKind::Input);
    let b = gate(&mut c, GateKind::Input);
    let g = gate(&mut c, GateKind::And);
    let o = gate(&mut c, GateKind::Output);
    c.connect(PinRef::output(a, 0), PinRef::input(g, 0)).unwrap();
    c.connect(PinRef::output(b, 0), PinRef::input(g, 1)).unwrap();
    c.connect(PinRef::output(g, 0), PinRef::input(o, 0)).unwrap();

    c.set_input(a, true).unwrap();
    c.set_input(b, false).unwrap();
    propagate(&mut c, SimConfig::interactive());
    assert_eq!(c.output_value(o), Some(false));

    c.set_input(b, true).unwrap();
    propagate(&mut c, SimConfig::interactive());
    assert_eq!(c.output_value(o), Some(true));
}

#[test]
fn parse_two_input_and_module() {
    let parsed = hdl::parse(
        "module m(input wire a, input wire b, output wire y); assign y = a & b; endmodule",
    )
    .unwrap();
    assert_eq!(parsed.module.inputs, vec!["a", "b"]);
    assert_eq!(parsed.module.outputs, vec!["y"]);
    assert_eq!(
        parsed.module.cells,
        vec![CellDef {
            kind: CellKind::Gate(GateKind::And),
            output: "y".to_string(),
            inputs: vec![Operand::signal("a"), Operand::signal("b")],
            line: 1,
        }]
    );
}

#[test]
fn body_port_declarations_with_net_types_elaborate() {
    let source = "module m(a, b, y);\n  input wire a;\n  input wire b;\n  output reg y;\n  assign y = a ^ b;\nendmodule";
    let mut elaboration = hdl::load(source).unwrap();
    assert!(elaboration.diagnostics.is_empty());
    assert!(elaboration.input_gate("a").is_some());
    assert!(elaboration.output_gate("y").is_some());

    let table = TruthTable::generate(&mut elaboration.circuit).unwrap();
    assert_eq!(
        table.output_signature(),
        vec![vec![false], vec![true], vec![true], vec![false]]
    );
}

#[test]
fn deleting_a_gate_removes_its_wires() {
    let mut c = Circuit::new();
    let a = gate(&mut c, GateKind::Input);
    let n = gate(&mut c, GateKind::Not);
    let o = gate(&mut c, GateKind::Output);
    c.connect_gates(a, n, 0).unwrap();
    c.connect_gates(n, o, 0).unwrap();

    c.delete_gate(n).unwrap();
    assert_eq!(c.find_wires(n).count(), 0);
    assert_eq!(c.wire_count(), 0);
    assert!(c.gate(n).is_none());
}

#[test]
fn input_to_input_is_a_direction_mismatch() {
    let mut c = Circuit::new();
    let g1 = gate(&mut c, GateKind::And);
    let g2 = gate(&mut c, GateKind::Or);
    let err = c
        .connect(PinRef::input(g1, 0), PinRef::input(g2, 1))
        .unwrap_err();
    assert_eq!(err.connection_kind(), Some(ConnectionErrorKind::DirectionMismatch));
    assert_eq!(c.wire_count(), 0);
}

#[test]
fn occupied_target_is_refused() {
    let mut c = Circuit::new();
    let a = gate(&mut c, GateKind::Input);
    let b = gate(&mut c, GateKind::Input);
    let n = gate(&mut c, GateKind::Not);
    c.connect_gates(a, n, 0).unwrap();
    let before = c.wires().to_vec();

    let err = c.connect_gates(b, n, 0).unwrap_err();
    assert_eq!(err.connection_kind(), Some(ConnectionErrorKind::TargetOccupied));
    assert_eq!(c.wires(), before.as_slice());
}

/// Every kind, every input driven: generated text must read back into an
/// equivalent circuit in both styles.
#[test]
fn generated_text_is_simulation_equivalent() {
    let mut c = Circuit::new();
    let inputs: Vec<GateId> = (0..3).map(|_| gate(&mut c, GateKind::Input)).collect();
    let mut previous = inputs[0];
    for (i, kind) in [
        GateKind::And,
        GateKind::Or,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
    ]
    .into_iter()
    .enumerate()
    {
        let g = gate(&mut c, kind);
        c.connect_gates(previous, g, 0).unwrap();
        c.connect_gates(inputs[1 + i % 2], g, 1).unwrap();
        previous = g;
    }
    let not = gate(&mut c, GateKind::Not);
    c.connect_gates(previous, not, 0).unwrap();
    for source in [previous, not] {
        let o = gate(&mut c, GateKind::Output);
        c.connect_gates(source, o, 0).unwrap();
    }
    validate_circuit(&c).unwrap();
    let expected = TruthTable::generate(&mut c).unwrap().output_signature();
    assert_eq!(expected.len(), 8);

    for text in [
        hdl::generate(&c, &GeneratorOptions::default()),
        hdl::generate_netlist(&c, hdl::DEFAULT_NETLIST_MODULE),
    ] {
        let mut rebuilt = hdl::load(&text).unwrap();
        assert!(rebuilt.diagnostics.is_empty(), "{}\n{:?}", text, rebuilt.diagnostics);
        assert_eq!(rebuilt.circuit.logic_gates().count(), 7);
        let actual = TruthTable::generate(&mut rebuilt.circuit).unwrap().output_signature();
        assert_eq!(actual, expected);
    }
}

#[test]
fn saved_design_reloads_identically() {
    let mut e = hdl::load(
        "module m(input a, b, output y);\n  wire t;\n  assign t = ~(a | b);\n  assign y = t ^ a;\nendmodule",
    )
    .unwrap();
    let a = e.input_gate("a").unwrap();
    e.circuit.set_input(a, true).unwrap();

    let json = Design::from_circuit(&e.circuit).to_json().unwrap();
    let mut restored = Design::from_json(&json).unwrap().to_circuit().unwrap();
    assert_eq!(restored.wires(), e.circuit.wires());
    assert_eq!(
        TruthTable::generate(&mut restored).unwrap(),
        TruthTable::generate(&mut e.circuit).unwrap()
    );
    assert_eq!(restored.gate(a).unwrap().output(0), Some(true));
}

#[test]
fn public_edits_keep_gate_identity() {
    let mut c = Circuit::new();
    let a = gate(&mut c, GateKind::Input);
    let g = gate(&mut c, GateKind::And);
    let o = gate(&mut c, GateKind::Output);
    c.connect_gates(a, g, 0).unwrap();
    c.connect_gates(g, o, 0).unwrap();

    c.set_position(g, Position::new(40.0, 20.0)).unwrap();
    c.delete_gate(a).unwrap();

    let moved = c.gate(g).unwrap();
    assert_eq!(moved.id, g);
    assert_eq!(moved.kind, GateKind::And);
    assert_eq!(moved.input_values().len(), 2);
    assert_eq!(moved.position, Position::new(40.0, 20.0));
    assert_eq!(c.gate(o).unwrap().id, o);
    validate_circuit(&c).unwrap();
}
