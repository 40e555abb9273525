//! WASM bindings for Logicsim Core.
//!
//! The editor's JavaScript keeps drawing, dragging and animation to itself
//! and calls into this module for everything that touches circuit state.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmWorkbench } from 'logicsim_core';
//!
//! await init();
//!
//! const bench = new WasmWorkbench();
//! const a = bench.create_gate('INPUT', 80, 60);
//! const n = bench.create_gate('NOT', 300, 60);
//! bench.connect(a, 0, n, 0);
//!
//! // Animated run: one iteration per frame.
//! bench.begin_simulation();
//! function frame() {
//!   const report = JSON.parse(bench.step_simulation());
//!   redraw(report);
//!   if (!report.finished) requestAnimationFrame(frame);
//! }
//! requestAnimationFrame(frame);
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::circuit::{GateId, GateKind, PinRef, Position};
use crate::error::LogicError;
use crate::hdl::{Diagnostic, GeneratorOptions, Severity};
use crate::layout::LayoutConfig;
use crate::sim::{SimConfig, Step};
use crate::workbench::Workbench;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: LogicError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn gate_id(id: &str) -> Result<GateId, JsValue> {
    id.parse().map_err(to_js)
}

#[derive(Serialize)]
struct DiagnosticView<'a> {
    line: usize,
    severity: &'static str,
    message: &'a str,
}

fn diagnostics_json(diagnostics: &[Diagnostic]) -> Result<String, JsValue> {
    let views: Vec<DiagnosticView<'_>> = diagnostics
        .iter()
        .map(|d| DiagnosticView {
            line: d.line,
            severity: match d.severity {
                Severity::Warning => "warning",
                Severity::Error => "error",
            },
            message: &d.message,
        })
        .collect();
    json(&views)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepView {
    iteration: usize,
    finished: bool,
    converged: bool,
    wires_changed: Vec<usize>,
    gates_changed: Vec<String>,
}

/// WASM-compatible editing session.
///
/// Gate ids cross the boundary as strings (`"gate_3"`); structured results
/// are returned as JSON text.
#[wasm_bindgen]
pub struct WasmWorkbench {
    bench: Workbench,
}

#[wasm_bindgen]
impl WasmWorkbench {
    /// Create an empty session for a canvas of the default size.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmWorkbench {
        WasmWorkbench {
            bench: Workbench::new(),
        }
    }

    /// Create an empty session that lays out for a `width` x `height`
    /// canvas.
    #[wasm_bindgen]
    pub fn with_canvas(width: f64, height: f64) -> WasmWorkbench {
        WasmWorkbench {
            bench: Workbench::new().with_layout(LayoutConfig::with_canvas(width, height)),
        }
    }

    /// Override the interactive iteration cap.
    #[wasm_bindgen]
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        let bench = std::mem::take(&mut self.bench);
        self.bench = bench.with_sim_config(SimConfig::interactive().with_max_iterations(max_iterations));
    }

    /// Add a gate of kind `kind` (`"AND"`, `"not"`, ...) and return its id.
    #[wasm_bindgen]
    pub fn create_gate(&mut self, kind: &str, x: f64, y: f64) -> Result<String, JsValue> {
        let kind: GateKind = kind.parse().map_err(to_js)?;
        let id = self.bench.create_gate(kind, Position::new(x, y)).map_err(to_js)?;
        Ok(id.to_string())
    }

    #[wasm_bindgen]
    pub fn delete_gate(&mut self, id: &str) -> Result<(), JsValue> {
        self.bench.delete_gate(gate_id(id)?).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn move_gate(&mut self, id: &str, x: f64, y: f64) -> Result<(), JsValue> {
        self.bench.move_gate(gate_id(id)?, Position::new(x, y)).map_err(to_js)
    }

    /// Wire an output pin to an input pin.
    #[wasm_bindgen]
    pub fn connect(&mut self, from: &str, from_pin: usize, to: &str, to_pin: usize) -> Result<(), JsValue> {
        let a = PinRef::output(gate_id(from)?, from_pin);
        let b = PinRef::input(gate_id(to)?, to_pin);
        self.bench.connect(a, b).map_err(to_js)
    }

    /// Remove the wire feeding `to_pin` of `to`. False if there was none.
    #[wasm_bindgen]
    pub fn disconnect(&mut self, to: &str, to_pin: usize) -> Result<bool, JsValue> {
        let target = gate_id(to)?;
        let wire = match self.bench.circuit().driver_of(target, to_pin) {
            Some(wire) => wire.clone(),
            None => return Ok(false),
        };
        self.bench.delete_wire(&wire).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn set_input(&mut self, id: &str, value: bool) -> Result<(), JsValue> {
        self.bench.set_input(gate_id(id)?, value).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn toggle_input(&mut self, id: &str) -> Result<bool, JsValue> {
        self.bench.toggle_input(gate_id(id)?).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.bench.clear();
    }

    /// Run to completion. Returns `{ "iterations", "converged" }`.
    #[wasm_bindgen]
    pub fn simulate(&mut self) -> Result<String, JsValue> {
        let outcome = self.bench.simulate().map_err(to_js)?;
        json(&outcome)
    }

    #[wasm_bindgen]
    pub fn begin_simulation(&mut self) -> Result<(), JsValue> {
        self.bench.begin_simulation().map_err(to_js)
    }

    /// Advance the stepped run by one iteration; see the module example.
    #[wasm_bindgen]
    pub fn step_simulation(&mut self) -> Result<String, JsValue> {
        let view = match self.bench.step_simulation().map_err(to_js)? {
            Step::Iterated(report) => StepView {
                iteration: report.iteration,
                finished: false,
                converged: false,
                wires_changed: report.wires_changed,
                gates_changed: report.gates_changed.iter().map(|g| g.to_string()).collect(),
            },
            Step::Finished(outcome) => StepView {
                iteration: outcome.iterations,
                finished: true,
                converged: outcome.converged,
                wires_changed: Vec::new(),
                gates_changed: Vec::new(),
            },
        };
        json(&view)
    }

    #[wasm_bindgen]
    pub fn cancel_simulation(&mut self) -> bool {
        self.bench.cancel_simulation()
    }

    #[wasm_bindgen]
    pub fn is_simulating(&self) -> bool {
        self.bench.is_simulating()
    }

    /// Value shown by an OUTPUT gate (or any gate's first output).
    #[wasm_bindgen]
    pub fn output_value(&self, id: &str) -> Result<bool, JsValue> {
        let id = gate_id(id)?;
        self.bench
            .circuit()
            .gate(id)
            .and_then(|g| g.output(0).or_else(|| g.input(0)))
            .ok_or_else(|| to_js(LogicError::GateNotFound { id }))
    }

    /// Full truth table as JSON.
    #[wasm_bindgen]
    pub fn truth_table(&mut self) -> Result<String, JsValue> {
        self.bench.truth_table().and_then(|t| t.to_json()).map_err(to_js)
    }

    /// Assignment-style source for the current circuit.
    #[wasm_bindgen]
    pub fn generate_hdl(&self, module_name: Option<String>) -> String {
        let mut options = GeneratorOptions::default();
        if let Some(name) = module_name {
            options.module_name = name;
        }
        self.bench.generate_hdl(&options)
    }

    #[wasm_bindgen]
    pub fn generate_netlist(&self) -> String {
        self.bench.generate_netlist()
    }

    /// Replace the circuit from source text. Returns the diagnostics as
    /// JSON; fails only when no module header is found.
    #[wasm_bindgen]
    pub fn load_hdl(&mut self, text: &str) -> Result<String, JsValue> {
        let diagnostics = self.bench.load_hdl(text).map_err(to_js)?;
        diagnostics_json(&diagnostics)
    }

    #[wasm_bindgen]
    pub fn save_json(&self) -> Result<String, JsValue> {
        self.bench.save_json().map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn load_json(&mut self, text: &str) -> Result<(), JsValue> {
        self.bench.load_json(text).map_err(to_js)
    }

    #[wasm_bindgen]
    pub fn auto_arrange(&mut self) {
        self.bench.auto_arrange();
    }

    /// Gate/wire counts, depth and loop flag as JSON.
    #[wasm_bindgen]
    pub fn summary(&self) -> Result<String, JsValue> {
        json(&self.bench.summary())
    }
}

impl Default for WasmWorkbench {
    fn default() -> Self {
        Self::new()
    }
}
