//! Circuit validation.

use std::collections::HashSet;

use super::graph::Circuit;
use super::types::PinDirection;
use crate::error::{ConnectionErrorKind, LogicError, Result};

/// Check the structural invariants of a circuit.
///
/// Checks:
/// - Every gate's pin arrays match its kind's arity
/// - Every wire runs from an existing output pin to an existing input pin
///   of a different gate
/// - No input pin has more than one driver and no wire is repeated
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    for gate in circuit.gates() {
        if gate.input_values().len() != gate.kind.input_count()
            || gate.output_values().len() != gate.kind.output_count()
        {
            return Err(LogicError::DesignFormat {
                message: format!("{} has the wrong pin count for {}", gate.id, gate.kind),
            });
        }
    }

    let mut driven = HashSet::new();
    for wire in circuit.wires() {
        let refuse = |kind| LogicError::connection(kind, wire.source, wire.target);

        if wire.source.direction != PinDirection::Output || wire.target.direction != PinDirection::Input {
            return Err(refuse(ConnectionErrorKind::DirectionMismatch));
        }
        if wire.source.gate == wire.target.gate {
            return Err(refuse(ConnectionErrorKind::SelfLoop));
        }

        let source = circuit
            .gate(wire.source.gate)
            .ok_or(LogicError::GateNotFound { id: wire.source.gate })?;
        let target = circuit
            .gate(wire.target.gate)
            .ok_or(LogicError::GateNotFound { id: wire.target.gate })?;
        if source.output(wire.source.index).is_none() || target.input(wire.target.index).is_none() {
            return Err(refuse(ConnectionErrorKind::PinOutOfRange));
        }

        if !driven.insert(wire.target) {
            return Err(refuse(ConnectionErrorKind::TargetOccupied));
        }
    }

    Ok(())
}
