//! Core types for circuit representation.

use std::fmt;
use std::str::FromStr;

use crate::error::LogicError;

/// A unique identifier for a gate in the circuit.
/// Ids are assigned in creation order and never reused until the circuit is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(pub usize);

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate_{}", self.0)
    }
}

impl FromStr for GateId {
    type Err = LogicError;

    /// Accepts both `gate_7` and a bare `7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("gate_").unwrap_or(s);
        digits
            .parse::<usize>()
            .map(GateId)
            .map_err(|_| LogicError::DesignFormat {
                message: format!("invalid gate id '{}'", s),
            })
    }
}

/// The closed set of gate kinds the editor supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Circuit input terminal (value set by the user)
    Input,
    /// Circuit output terminal (displays its input)
    Output,
    /// Inverter
    Not,
    /// 2-input AND
    And,
    /// 2-input OR
    Or,
    /// 2-input NAND
    Nand,
    /// 2-input NOR
    Nor,
    /// 2-input XOR
    Xor,
    /// 2-input XNOR
    Xnor,
}

impl GateKind {
    /// Every kind, in palette order.
    pub const ALL: [GateKind; 9] = [
        Self::Input,
        Self::Output,
        Self::Not,
        Self::And,
        Self::Or,
        Self::Nand,
        Self::Nor,
        Self::Xor,
        Self::Xnor,
    ];

    /// Number of input pins.
    pub fn input_count(&self) -> usize {
        match self {
            Self::Input => 0,
            Self::Output | Self::Not => 1,
            Self::And | Self::Or | Self::Nand | Self::Nor | Self::Xor | Self::Xnor => 2,
        }
    }

    /// Number of output pins.
    pub fn output_count(&self) -> usize {
        match self {
            Self::Output => 0,
            _ => 1,
        }
    }

    /// True for the INPUT and OUTPUT terminals.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Input | Self::Output)
    }

    /// Upper-case name used by the persisted design format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::Not => "NOT",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Nand => "NAND",
            Self::Nor => "NOR",
            Self::Xor => "XOR",
            Self::Xnor => "XNOR",
        }
    }

    /// Verilog primitive keyword (`and`, `nor`, ...). None for terminals.
    pub fn primitive(&self) -> Option<&'static str> {
        match self {
            Self::Input | Self::Output => None,
            Self::Not => Some("not"),
            Self::And => Some("and"),
            Self::Or => Some("or"),
            Self::Nand => Some("nand"),
            Self::Nor => Some("nor"),
            Self::Xor => Some("xor"),
            Self::Xnor => Some("xnor"),
        }
    }

    /// Parse a Verilog primitive keyword.
    pub fn from_primitive(keyword: &str) -> Option<Self> {
        match keyword {
            "not" => Some(Self::Not),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "nand" => Some(Self::Nand),
            "nor" => Some(Self::Nor),
            "xor" => Some(Self::Xor),
            "xnor" => Some(Self::Xnor),
            _ => None,
        }
    }

    /// For the inverted binary kinds, the non-inverted counterpart.
    pub fn base(&self) -> Self {
        match self {
            Self::Nand => Self::And,
            Self::Nor => Self::Or,
            Self::Xnor => Self::Xor,
            other => *other,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GateKind {
    type Err = LogicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| LogicError::InvalidGateKind {
                kind: s.to_string(),
            })
    }
}

/// Direction of a pin relative to its gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinDirection {
    Input,
    Output,
}

/// A reference to one pin of one gate. Used as wire endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    pub gate: GateId,
    pub direction: PinDirection,
    pub index: usize,
}

impl PinRef {
    /// Reference to an input pin.
    pub fn input(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            direction: PinDirection::Input,
            index,
        }
    }

    /// Reference to an output pin.
    pub fn output(gate: GateId, index: usize) -> Self {
        Self {
            gate,
            direction: PinDirection::Output,
            index,
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        write!(f, "{}.{}{}", self.gate, dir, self.index)
    }
}

/// Canvas position of a gate. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
