//! Circuit graph representation and analysis.
//!
//! This module provides the editable gate graph. The [`Circuit`] struct owns
//! every gate and wire; topology queries, validation and the persisted design
//! format are derived views over it.

pub mod design;
mod graph;
pub mod topology;
mod types;
mod validate;

pub use design::Design;
pub use graph::{Circuit, Gate, Wire, DEFAULT_WIRE_COLOR};
pub use topology::{find_cycle, Levels};
pub use types::*;
pub use validate::validate_circuit;
