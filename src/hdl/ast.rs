//! Intermediate description produced by the HDL parser.

use std::fmt;

use crate::circuit::GateKind;

/// A parsed module: its ports and the cells driving its signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleAst {
    /// Module name from the header
    pub name: String,
    /// Input port names, in declaration order, without duplicates
    pub inputs: Vec<String>,
    /// Output port names, in declaration order, without duplicates
    pub outputs: Vec<String>,
    /// Intermediate nets declared with `wire`
    pub wires: Vec<String>,
    /// One entry per classified `assign` or primitive instance
    pub cells: Vec<CellDef>,
    /// Line of the module header
    pub line: usize,
}

impl ModuleAst {
    /// Create an empty module description.
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            ..Default::default()
        }
    }

    /// True if at least one input and one output were found.
    pub fn has_ports(&self) -> bool {
        !self.inputs.is_empty() && !self.outputs.is_empty()
    }

    pub(crate) fn add_input(&mut self, name: &str) {
        if !self.inputs.iter().any(|n| n == name) {
            self.inputs.push(name.to_string());
        }
    }

    pub(crate) fn add_output(&mut self, name: &str) {
        if !self.outputs.iter().any(|n| n == name) {
            self.outputs.push(name.to_string());
        }
    }

    pub(crate) fn add_wire(&mut self, name: &str) {
        if !self.wires.iter().any(|n| n == name) {
            self.wires.push(name.to_string());
        }
    }
}

/// What a cell does with its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// A logic gate
    Gate(GateKind),
    /// Direct connection (`assign y = x;`, `buf`)
    Alias,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gate(kind) => write!(f, "{}", kind),
            Self::Alias => f.write_str("WIRE"),
        }
    }
}

/// An operand of a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A named net or port
    Signal(String),
    /// A literal `0`/`1` (`1'b0`, `1'b1`, ...)
    Const(bool),
}

impl Operand {
    pub fn signal(name: impl Into<String>) -> Self {
        Self::Signal(name.into())
    }

    /// The net name, if this is not a constant.
    pub fn as_signal(&self) -> Option<&str> {
        match self {
            Self::Signal(name) => Some(name),
            Self::Const(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(name) => f.write_str(name),
            Self::Const(value) => write!(f, "1'b{}", *value as u8),
        }
    }
}

/// A gate (or alias) driving one net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDef {
    pub kind: CellKind,
    /// Net driven by this cell
    pub output: String,
    /// Operands in pin order
    pub inputs: Vec<Operand>,
    /// Source line for diagnostics
    pub line: usize,
}

impl CellDef {
    /// Operand net names, skipping constants.
    pub fn signal_names(&self) -> Vec<&str> {
        self.inputs.iter().filter_map(Operand::as_signal).collect()
    }
}

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal finding, annotated with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "line {}: {}: {}", self.line, level, self.message)
    }
}

/// Parser output: the module plus every non-fatal finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModule {
    pub module: ModuleAst,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedModule {
    /// True if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}
