//! Combinational simulation engine.
//!
//! Values move through the circuit in lock-step iterations:
//!
//! 1. Every non-INPUT gate is reset to 0
//! 2. Each iteration copies every wire's source value to its target pin,
//!    then recomputes every gate from its inputs
//! 3. The run stops after the first iteration that changes nothing, or at
//!    the iteration cap
//!
//! The cap bounds combinational loops; such a run ends with
//! [`Propagation::converged`] set to false and whatever state the last
//! iteration left.

mod logic;
mod propagate;
mod truth_table;

pub use logic::evaluate;
pub use propagate::{
    propagate, propagate_observed, reset, IterationReport, Propagation, PropagationObserver, Propagator,
    SimConfig, Step,
};
pub use truth_table::{Column, TruthRow, TruthTable, MAX_TRUTH_TABLE_INPUTS};

/// Iteration cap for a user-triggered simulation.
pub const INTERACTIVE_MAX_ITERATIONS: usize = 15;

/// Iteration cap per row of truth-table enumeration.
pub const BATCH_MAX_ITERATIONS: usize = 10;
