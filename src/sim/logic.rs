//! Gate function table.

use crate::circuit::GateKind;

/// Compute the output of a logic gate from its input values.
///
/// Missing inputs read as 0. Terminals have no function and yield `None`.
pub fn evaluate(kind: GateKind, inputs: &[bool]) -> Option<bool> {
    let a = inputs.first().copied().unwrap_or(false);
    let b = inputs.get(1).copied().unwrap_or(false);
    match kind {
        GateKind::Input | GateKind::Output => None,
        GateKind::Not => Some(!a),
        GateKind::And => Some(a && b),
        GateKind::Or => Some(a || b),
        GateKind::Nand => Some(!(a && b)),
        GateKind::Nor => Some(!(a || b)),
        GateKind::Xor => Some(a ^ b),
        GateKind::Xnor => Some(!(a ^ b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

    fn table(kind: GateKind) -> [bool; 4] {
        let mut out = [false; 4];
        for (i, (a, b)) in PAIRS.iter().enumerate() {
            out[i] = evaluate(kind, &[*a, *b]).unwrap();
        }
        out
    }

    #[test]
    fn test_binary_gates_exhaustive() {
        assert_eq!(table(GateKind::And), [false, false, false, true]);
        assert_eq!(table(GateKind::Or), [false, true, true, true]);
        assert_eq!(table(GateKind::Nand), [true, true, true, false]);
        assert_eq!(table(GateKind::Nor), [true, false, false, false]);
        assert_eq!(table(GateKind::Xor), [false, true, true, false]);
        assert_eq!(table(GateKind::Xnor), [true, false, false, true]);
    }

    #[test]
    fn test_not_and_terminals() {
        assert_eq!(evaluate(GateKind::Not, &[true]), Some(false));
        assert_eq!(evaluate(GateKind::Not, &[false]), Some(true));
        assert_eq!(evaluate(GateKind::Input, &[]), None);
        assert_eq!(evaluate(GateKind::Output, &[true]), None);
    }
}
