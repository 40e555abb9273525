//! Exhaustive truth-table enumeration.

use std::fmt::Write as _;

use log::info;
use serde::Serialize;

use super::propagate::{propagate, SimConfig};
use crate::circuit::{Circuit, GateId};
use crate::error::{LogicError, Result};

/// Largest input count enumerated (2^20 rows).
pub const MAX_TRUTH_TABLE_INPUTS: usize = 20;

/// One table column: which gate and what it is labelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    #[serde(skip)]
    pub gate: GateId,
    pub label: String,
}

/// One input assignment and the values it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruthRow {
    /// INPUT values, first input gate first
    pub inputs: Vec<bool>,
    /// Output of every logic gate
    pub gates: Vec<bool>,
    /// Value shown by every OUTPUT gate
    pub outputs: Vec<bool>,
}

/// Every input assignment of a circuit, in increasing binary order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruthTable {
    pub input_columns: Vec<Column>,
    pub gate_columns: Vec<Column>,
    pub output_columns: Vec<Column>,
    pub rows: Vec<TruthRow>,
}

impl TruthTable {
    /// Enumerate all 2^N assignments of the N INPUT gates.
    ///
    /// Row `i` gives input gate `j` (creation order) the bit
    /// `(i >> (N-1-j)) & 1`, so the first input is the most significant bit.
    /// Each row is evaluated with a fresh batch propagation. The INPUT values
    /// present before the call are restored afterwards.
    pub fn generate(circuit: &mut Circuit) -> Result<Self> {
        let inputs: Vec<GateId> = circuit.input_gates().map(|g| g.id).collect();
        let n = inputs.len();
        if n > MAX_TRUTH_TABLE_INPUTS {
            return Err(LogicError::TooManyInputs {
                count: n,
                max: MAX_TRUTH_TABLE_INPUTS,
            });
        }

        let input_columns = inputs
            .iter()
            .enumerate()
            .map(|(i, &gate)| Column {
                gate,
                label: format!("Input {}", i + 1),
            })
            .collect();
        let gate_columns: Vec<Column> = circuit
            .logic_gates()
            .enumerate()
            .map(|(i, g)| Column {
                gate: g.id,
                label: format!("{} {}", g.kind, i + 1),
            })
            .collect();
        let output_columns: Vec<Column> = circuit
            .output_gates()
            .enumerate()
            .map(|(i, g)| Column {
                gate: g.id,
                label: format!("Output {}", i + 1),
            })
            .collect();

        let saved: Vec<bool> = circuit
            .input_gates()
            .map(|g| g.output(0).unwrap_or(false))
            .collect();

        let mut rows = Vec::with_capacity(1 << n);
        for i in 0..(1usize << n) {
            let mut assignment = Vec::with_capacity(n);
            for (j, &gate) in inputs.iter().enumerate() {
                let bit = (i >> (n - 1 - j)) & 1 == 1;
                circuit.set_input(gate, bit)?;
                assignment.push(bit);
            }
            propagate(circuit, SimConfig::batch());

            let gates = gate_columns
                .iter()
                .map(|c| circuit.gate(c.gate).and_then(|g| g.output(0)).unwrap_or(false))
                .collect();
            let outputs = output_columns
                .iter()
                .map(|c| circuit.output_value(c.gate).unwrap_or(false))
                .collect();
            rows.push(TruthRow {
                inputs: assignment,
                gates,
                outputs,
            });
        }

        for (&gate, &value) in inputs.iter().zip(&saved) {
            circuit.set_input(gate, value)?;
        }
        propagate(circuit, SimConfig::batch());

        info!("truth table: {} input(s), {} row(s)", n, rows.len());
        Ok(Self {
            input_columns,
            gate_columns,
            output_columns,
            rows,
        })
    }

    /// Number of rows (2^N).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The OUTPUT columns of every row, for comparing circuits.
    pub fn output_signature(&self) -> Vec<Vec<bool>> {
        self.rows.iter().map(|r| r.outputs.clone()).collect()
    }

    /// Column labels, inputs then logic gates then outputs.
    pub fn headers(&self) -> Vec<&str> {
        self.input_columns
            .iter()
            .chain(&self.gate_columns)
            .chain(&self.output_columns)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// Plain-text rendering, one row per line.
    pub fn render(&self) -> String {
        let headers = self.headers();
        let mut out = headers.join(" | ");
        out.push('\n');
        out.push_str(
            &headers
                .iter()
                .map(|h| "-".repeat(h.len()))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.push('\n');

        for row in &self.rows {
            let cells = row.inputs.iter().chain(&row.gates).chain(&row.outputs);
            let line: Vec<String> = cells
                .zip(&headers)
                .map(|(&v, h)| format!("{:^width$}", v as u8, width = h.len()))
                .collect();
            let _ = writeln!(out, "{}", line.join(" | "));
        }
        out
    }

    /// JSON form for the browser.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
