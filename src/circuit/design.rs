//! Persisted design record (save/load).
//!
//! The JSON layout matches what the browser editor has always written:
//!
//! ```json
//! {
//!   "gates": [{ "id": "gate_0", "type": "INPUT", "x": 80, "y": 60, "outputValues": [1] }],
//!   "wires": [{ "sourceGate": "gate_0", "sourcePinIndex": 0,
//!               "targetGate": "gate_2", "targetPinIndex": 0 }]
//! }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::graph::Circuit;
use super::types::{GateId, GateKind, PinRef, Position};
use super::validate::validate_circuit;
use crate::error::Result;

/// A saved design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub gates: Vec<GateRecord>,
    pub wires: Vec<WireRecord>,
}

/// One saved gate. Pin arity is implied by `kind` and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub output_values: Vec<u8>,
}

/// One saved wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub source_gate: String,
    pub source_pin_index: usize,
    pub target_gate: String,
    pub target_pin_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Design {
    /// Snapshot a circuit.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let gates = circuit
            .gates()
            .iter()
            .map(|g| GateRecord {
                id: g.id.to_string(),
                kind: g.kind.name().to_string(),
                x: g.position.x,
                y: g.position.y,
                output_values: g.output_values().iter().map(|&v| v as u8).collect(),
            })
            .collect();

        let wires = circuit
            .wires()
            .iter()
            .map(|w| WireRecord {
                source_gate: w.source.gate.to_string(),
                source_pin_index: w.source.index,
                target_gate: w.target.gate.to_string(),
                target_pin_index: w.target.index,
                color: w.color.clone(),
            })
            .collect();

        Self { gates, wires }
    }

    /// Rebuild a circuit.
    ///
    /// Pin arrays come from each gate kind. INPUT gates keep their saved
    /// value. Wires whose endpoints are missing, or which would break a wire
    /// invariant, are skipped with a warning.
    pub fn to_circuit(&self) -> Result<Circuit> {
        let mut circuit = Circuit::new();

        for record in &self.gates {
            let id: GateId = record.id.parse()?;
            let kind: GateKind = record.kind.parse()?;
            let gate = circuit.insert_gate(id, kind, Position::new(record.x, record.y))?;
            if kind == GateKind::Input {
                let value = record.output_values.first().copied().unwrap_or(0) != 0;
                gate.set_output_pin(0, value);
            }
        }

        let mut skipped = 0usize;
        for record in &self.wires {
            let endpoints = record
                .source_gate
                .parse::<GateId>()
                .and_then(|s| record.target_gate.parse::<GateId>().map(|t| (s, t)));
            let (source, target) = match endpoints {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("skipping wire: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            let result = circuit.connect_with_color(
                PinRef::output(source, record.source_pin_index),
                PinRef::input(target, record.target_pin_index),
                record.color.clone(),
            );
            if let Err(e) = result {
                warn!("skipping wire {} -> {}: {}", source, target, e);
                skipped += 1;
            }
        }

        validate_circuit(&circuit)?;
        info!(
            "loaded design: {} gate(s), {} wire(s), {} skipped",
            circuit.gate_count(),
            circuit.wire_count(),
            skipped
        );
        Ok(circuit)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Write a circuit to a design file.
#[cfg(feature = "cli")]
pub fn save_file(circuit: &Circuit, path: &std::path::Path) -> Result<()> {
    let json = Design::from_circuit(circuit).to_json()?;
    std::fs::write(path, json).map_err(|e| crate::error::LogicError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Read a circuit from a design file.
#[cfg(feature = "cli")]
pub fn load_file(path: &std::path::Path) -> Result<Circuit> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::LogicError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Design::from_json(&content)?.to_circuit()
}
