//! Automatic placement by topological level.
//!
//! INPUT gates form the left-most column. Every logic level gets its own
//! column to the right, and OUTPUT gates share the column after the deepest
//! logic level. Spacing scales with the canvas and gate count, clamped to
//! the configured bounds.

use log::debug;

use crate::circuit::{Circuit, GateId, Levels, Position};

/// Canvas width reserved for margins when deriving column spacing.
const HORIZONTAL_MARGIN: f64 = 300.0;
/// Canvas height reserved for margins when deriving row spacing.
const VERTICAL_MARGIN: f64 = 200.0;

/// Layout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Left edge of the input column
    pub start_x: f64,
    /// Top of every column
    pub start_y: f64,
    pub min_column_spacing: f64,
    pub max_column_spacing: f64,
    pub min_row_spacing: f64,
    pub max_row_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            canvas_height: 800.0,
            start_x: 80.0,
            start_y: 60.0,
            min_column_spacing: 200.0,
            max_column_spacing: 300.0,
            min_row_spacing: 120.0,
            max_row_spacing: 200.0,
        }
    }
}

impl LayoutConfig {
    /// Default bounds for a canvas of the given size.
    pub fn with_canvas(width: f64, height: f64) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            ..Default::default()
        }
    }

    /// Gap between columns. Four columns' worth of canvas are shared out
    /// when OUTPUT gates need a column of their own, three otherwise.
    pub fn column_spacing(&self, has_outputs: bool) -> f64 {
        let columns = if has_outputs { 4.0 } else { 3.0 };
        bounded(
            (self.canvas_width - HORIZONTAL_MARGIN) / columns,
            self.min_column_spacing,
            self.max_column_spacing,
        )
    }

    /// Gap between gates in one column.
    pub fn row_spacing(&self, gates_per_column: usize) -> f64 {
        bounded(
            (self.canvas_height - VERTICAL_MARGIN) / gates_per_column.max(1) as f64,
            self.min_row_spacing,
            self.max_row_spacing,
        )
    }
}

/// Lower bound wins if the bounds cross.
fn bounded(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Summary of a computed arrangement.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub positions: Vec<(GateId, Position)>,
    pub column_spacing: f64,
    pub row_spacing: f64,
    /// Columns used, including the input and output columns
    pub columns: usize,
}

/// Compute positions for every gate without moving anything.
pub fn plan(circuit: &Circuit, config: &LayoutConfig) -> Placement {
    let levels = Levels::compute(circuit);
    let total = circuit.gate_count();
    let gates_per_column = ((total as f64).sqrt().ceil() as usize).max(3);
    let has_outputs = circuit.output_gates().next().is_some();

    let column_spacing = config.column_spacing(has_outputs);
    let row_spacing = config.row_spacing(gates_per_column);
    let row = |index: usize| config.start_y + index as f64 * row_spacing;
    let column = |level: usize| config.start_x + level as f64 * column_spacing;

    let mut positions = Vec::with_capacity(total);
    for (i, gate) in circuit.input_gates().enumerate() {
        positions.push((gate.id, Position::new(column(0), row(i))));
    }

    // Logic gates, grouped by level in creation order.
    let mut per_level: Vec<usize> = Vec::new();
    let mut deepest = 0;
    for gate in circuit.logic_gates() {
        let level = levels.get(gate.id).unwrap_or(1).max(1);
        if per_level.len() <= level {
            per_level.resize(level + 1, 0);
        }
        let index = per_level[level];
        per_level[level] += 1;
        deepest = deepest.max(level);
        positions.push((gate.id, Position::new(column(level), row(index))));
    }

    let output_level = deepest + 1;
    for (i, gate) in circuit.output_gates().enumerate() {
        positions.push((gate.id, Position::new(column(output_level), row(i))));
    }

    Placement {
        positions,
        column_spacing,
        row_spacing,
        columns: if has_outputs { output_level + 1 } else { deepest + 1 },
    }
}

/// Move every gate to its planned position.
pub fn arrange(circuit: &mut Circuit, config: &LayoutConfig) -> Placement {
    let placement = plan(circuit, config);
    for &(id, position) in &placement.positions {
        if let Some(gate) = circuit.gate_mut(id) {
            gate.position = position;
        }
    }
    debug!(
        "arranged {} gate(s) in {} column(s)",
        placement.positions.len(),
        placement.columns
    );
    placement
}
