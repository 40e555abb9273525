//! Error types for the logic circuit editor core.
//!
//! This module provides a unified error type [`LogicError`] that covers
//! all error conditions that can occur during graph editing, HDL parsing,
//! simulation and design persistence.

use std::fmt;

use thiserror::Error;

use crate::circuit::{GateId, PinRef};

/// Result type alias using [`LogicError`].
pub type Result<T> = std::result::Result<T, LogicError>;

/// Why a proposed wire was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Both pins have the same direction.
    DirectionMismatch,
    /// Source and target belong to the same gate.
    SelfLoop,
    /// The target input pin already has a driver.
    TargetOccupied,
    /// An identical wire already exists.
    DuplicateWire,
    /// The pin index exceeds the gate's arity.
    PinOutOfRange,
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::DirectionMismatch => "a wire must join an output pin to an input pin",
            Self::SelfLoop => "a gate cannot be wired to itself",
            Self::TargetOccupied => "input pin is already driven",
            Self::DuplicateWire => "connection already exists",
            Self::PinOutOfRange => "pin index out of range",
        };
        f.write_str(text)
    }
}

/// Unified error type for all operations of the crate.
#[derive(Error, Debug)]
pub enum LogicError {
    // ============ Structural Errors ============
    /// Gate kind name outside the supported set
    #[error("Invalid gate kind '{kind}'")]
    InvalidGateKind { kind: String },

    /// Gate id not present in the circuit
    #[error("Gate '{id}' not found in circuit")]
    GateNotFound { id: GateId },

    /// Proposed wire violates a wire invariant
    #[error("Cannot connect {from} to {to}: {kind}")]
    Connection {
        kind: ConnectionErrorKind,
        from: PinRef,
        to: PinRef,
    },

    /// Value toggled on a gate that is not an INPUT terminal
    #[error("Gate '{id}' is not an INPUT gate")]
    NotAnInput { id: GateId },

    // ============ HDL Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// The text has no `module <name> ( ... );` header
    #[error("No module declaration found")]
    NoModuleDeclaration,

    // ============ Simulation Errors ============
    /// A stepped simulation run is still in flight
    #[error("A simulation is already in progress")]
    SimulationInProgress,

    /// Asked to advance a stepped run when none was started
    #[error("No simulation is in progress")]
    NoSimulation,

    /// Truth table would be too large to enumerate
    #[error("Truth table over {count} inputs exceeds the limit of {max}")]
    TooManyInputs { count: usize, max: usize },

    // ============ I/O Errors ============
    /// Error reading a source or design file
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a design file
    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed persisted design
    #[error("Invalid design file: {message}")]
    DesignFormat { message: String },
}

impl LogicError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(kind: ConnectionErrorKind, from: PinRef, to: PinRef) -> Self {
        Self::Connection { kind, from, to }
    }

    /// The refused-connection reason, if this is a connection error.
    pub fn connection_kind(&self) -> Option<ConnectionErrorKind> {
        match self {
            Self::Connection { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LogicError {
    fn from(err: serde_json::Error) -> Self {
        Self::DesignFormat {
            message: err.to_string(),
        }
    }
}
