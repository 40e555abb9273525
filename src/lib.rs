//! # Logicsim Core
//!
//! The engine behind a browser-based digital logic circuit editor.
//!
//! This library provides:
//! - A gate-and-wire circuit model with checked connections
//! - Bounded level-synchronous propagation, in one shot or step by step
//! - Exhaustive truth-table enumeration
//! - A Verilog-style text codec (parse, elaborate, generate) for a
//!   combinational subset
//! - Automatic layout by topological level and JSON design persistence
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Gate/wire graph, topology and saved designs
//! - [`sim`] - Gate functions, propagation and truth tables
//! - [`hdl`] - Lexer, parser, elaboration and text generation
//! - [`layout`] - Placement by topological level
//! - [`workbench`] - Editing session that serialises simulation runs
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! logicsim table half_adder.v
//! logicsim simulate half_adder.v --set a=1,b=1
//! logicsim generate design.json --netlist
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmWorkbench } from 'logicsim_core';
//!
//! const bench = new WasmWorkbench();
//! const diagnostics = bench.load_hdl(source);
//! const table = JSON.parse(bench.truth_table());
//! ```
//!
//! ## Simulation Method
//!
//! Every run first zeroes all non-INPUT pins. Each iteration then copies
//! every wire's source value onto its target pin, and afterwards recomputes
//! every logic gate from its pins. The run stops after the first iteration
//! that changes nothing, or at the iteration cap (15 for interactive runs,
//! 10 per truth-table row). Circuits that oscillate simply end at the cap.

pub mod circuit;
pub mod error;
pub mod hdl;
pub mod layout;
pub mod sim;
pub mod workbench;

// Re-export main types for convenience
pub use circuit::{Circuit, GateId, GateKind, PinRef, Position};
pub use error::{LogicError, Result};
pub use sim::{propagate, SimConfig, TruthTable};
pub use workbench::Workbench;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmWorkbench;
