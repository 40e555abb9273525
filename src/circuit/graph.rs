//! Circuit graph structure.

use log::debug;

use super::types::{GateId, GateKind, PinDirection, PinRef, Position};
use crate::error::{ConnectionErrorKind, LogicError, Result};

/// Wire colour used when the caller does not pick one.
pub const DEFAULT_WIRE_COLOR: &str = "#48bb78";

/// A gate placed on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    /// Unique id, assigned in creation order
    pub id: GateId,
    /// Gate kind; fixes the pin arity
    pub kind: GateKind,
    /// Canvas position (layout and rendering only)
    pub position: Position,
    /// Current value of each input pin
    input_values: Vec<bool>,
    /// Current value of each output pin
    output_values: Vec<bool>,
}

impl Gate {
    fn new(id: GateId, kind: GateKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            input_values: vec![false; kind.input_count()],
            output_values: vec![false; kind.output_count()],
        }
    }

    /// Values on the input pins.
    pub fn input_values(&self) -> &[bool] {
        &self.input_values
    }

    /// Values on the output pins.
    pub fn output_values(&self) -> &[bool] {
        &self.output_values
    }

    /// Value of input pin `index`, if it exists.
    pub fn input(&self, index: usize) -> Option<bool> {
        self.input_values.get(index).copied()
    }

    /// Value of output pin `index`, if it exists.
    pub fn output(&self, index: usize) -> Option<bool> {
        self.output_values.get(index).copied()
    }

    /// Set input pin `index`. Returns true when the value changed.
    pub(crate) fn set_input_pin(&mut self, index: usize, value: bool) -> bool {
        match self.input_values.get_mut(index) {
            Some(slot) if *slot != value => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// Set output pin `index`. Returns true when the value changed.
    pub(crate) fn set_output_pin(&mut self, index: usize, value: bool) -> bool {
        match self.output_values.get_mut(index) {
            Some(slot) if *slot != value => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// Zero every pin value.
    pub(crate) fn reset_pins(&mut self) {
        self.input_values.iter_mut().for_each(|v| *v = false);
        self.output_values.iter_mut().for_each(|v| *v = false);
    }

    fn has_pin(&self, pin: &PinRef) -> bool {
        match pin.direction {
            PinDirection::Input => pin.index < self.input_values.len(),
            PinDirection::Output => pin.index < self.output_values.len(),
        }
    }
}

/// A directed connection from an output pin to an input pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    /// Driving output pin
    pub source: PinRef,
    /// Driven input pin
    pub target: PinRef,
    /// Display colour (no simulation effect)
    pub color: Option<String>,
}

impl Wire {
    /// True if either endpoint is on `gate`.
    pub fn touches(&self, gate: GateId) -> bool {
        self.source.gate == gate || self.target.gate == gate
    }

    fn same_endpoints(&self, other: &Wire) -> bool {
        self.source == other.source && self.target == other.target
    }
}

/// The circuit being edited: every gate and wire, owned exclusively.
///
/// Gates are kept in creation (id) order. Lookups by id and wire
/// queries are derived on demand rather than stored.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    gates: Vec<Gate>,
    wires: Vec<Wire>,
    next_id: usize,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new gate and return its id.
    pub fn create_gate(&mut self, kind: GateKind, position: Position) -> GateId {
        let id = GateId(self.next_id);
        self.next_id += 1;
        self.gates.push(Gate::new(id, kind, position));
        debug!("created {} {}", kind, id);
        id
    }

    /// Place a new gate given its kind name (`"AND"`, `"input"`, ...).
    pub fn create_gate_named(&mut self, kind: &str, x: f64, y: f64) -> Result<GateId> {
        let kind: GateKind = kind.parse()?;
        Ok(self.create_gate(kind, Position::new(x, y)))
    }

    /// Insert a gate with a caller-chosen id (design loading).
    /// The id counter moves past it so later ids stay unique.
    pub(crate) fn insert_gate(&mut self, id: GateId, kind: GateKind, position: Position) -> Result<&mut Gate> {
        let idx = match self.gates.binary_search_by_key(&id, |g| g.id) {
            Ok(_) => {
                return Err(LogicError::DesignFormat {
                    message: format!("duplicate gate id '{}'", id),
                })
            }
            Err(idx) => idx,
        };
        self.gates.insert(idx, Gate::new(id, kind, position));
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(&mut self.gates[idx])
    }

    /// Remove a gate and every wire touching it.
    pub fn delete_gate(&mut self, id: GateId) -> Result<Gate> {
        let idx = self.index_of(id).ok_or(LogicError::GateNotFound { id })?;
        let before = self.wires.len();
        self.wires.retain(|w| !w.touches(id));
        debug!("deleted {} and {} wire(s)", id, before - self.wires.len());
        Ok(self.gates.remove(idx))
    }

    /// Connect two pins with the default colour.
    ///
    /// The pins may be given in either order; the output pin becomes the
    /// wire source.
    pub fn connect(&mut self, a: PinRef, b: PinRef) -> Result<&Wire> {
        self.connect_with_color(a, b, Some(DEFAULT_WIRE_COLOR.to_string()))
    }

    /// Connect two pins, validating every wire invariant before mutating.
    pub fn connect_with_color(&mut self, a: PinRef, b: PinRef, color: Option<String>) -> Result<&Wire> {
        let (source, target) = match (a.direction, b.direction) {
            (PinDirection::Output, PinDirection::Input) => (a, b),
            (PinDirection::Input, PinDirection::Output) => (b, a),
            _ => return Err(LogicError::connection(ConnectionErrorKind::DirectionMismatch, a, b)),
        };

        let refuse = |kind| LogicError::connection(kind, source, target);

        let source_gate = self
            .gate(source.gate)
            .ok_or(LogicError::GateNotFound { id: source.gate })?;
        let target_gate = self
            .gate(target.gate)
            .ok_or(LogicError::GateNotFound { id: target.gate })?;

        if source.gate == target.gate {
            return Err(refuse(ConnectionErrorKind::SelfLoop));
        }
        if !source_gate.has_pin(&source) || !target_gate.has_pin(&target) {
            return Err(refuse(ConnectionErrorKind::PinOutOfRange));
        }

        let wire = Wire {
            source,
            target,
            color,
        };
        if self.wires.iter().any(|w| w.same_endpoints(&wire)) {
            return Err(refuse(ConnectionErrorKind::DuplicateWire));
        }
        if self.driver_of(target.gate, target.index).is_some() {
            return Err(refuse(ConnectionErrorKind::TargetOccupied));
        }

        debug!("wired {} -> {}", source, target);
        self.wires.push(wire);
        Ok(&self.wires[self.wires.len() - 1])
    }

    /// Convenience: wire output 0 of `from` into input `pin` of `to`.
    pub fn connect_gates(&mut self, from: GateId, to: GateId, pin: usize) -> Result<&Wire> {
        self.connect(PinRef::output(from, 0), PinRef::input(to, pin))
    }

    /// Remove the wire with the same endpoints as `wire`. Idempotent;
    /// returns whether a wire was removed.
    pub fn delete_wire(&mut self, wire: &Wire) -> bool {
        let before = self.wires.len();
        self.wires.retain(|w| !w.same_endpoints(wire));
        before != self.wires.len()
    }

    /// Remove everything and restart id allocation.
    pub fn clear(&mut self) {
        self.gates.clear();
        self.wires.clear();
        self.next_id = 0;
    }

    /// Look up a gate by id.
    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.index_of(id).map(|idx| &self.gates[idx])
    }

    /// Look up a gate by id, mutably. Kept inside the crate: a gate's id
    /// and kind must not change once it is in the sorted gate list.
    pub(crate) fn gate_mut(&mut self, id: GateId) -> Option<&mut Gate> {
        self.index_of(id).map(move |idx| &mut self.gates[idx])
    }

    fn index_of(&self, id: GateId) -> Option<usize> {
        self.gates.binary_search_by_key(&id, |g| g.id).ok()
    }

    /// All gates in creation order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub(crate) fn gates_mut(&mut self) -> &mut [Gate] {
        &mut self.gates
    }

    /// All wires in creation order.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Wires with `gate` as source or target.
    pub fn find_wires(&self, gate: GateId) -> impl Iterator<Item = &Wire> + '_ {
        self.wires.iter().filter(move |w| w.touches(gate))
    }

    /// The wire driving input pin `pin` of `gate`, if any.
    pub fn driver_of(&self, gate: GateId, pin: usize) -> Option<&Wire> {
        self.wires
            .iter()
            .find(|w| w.target.gate == gate && w.target.index == pin)
    }

    /// Gates of one kind, in creation order.
    pub fn gates_of_kind(&self, kind: GateKind) -> impl Iterator<Item = &Gate> + '_ {
        self.gates.iter().filter(move |g| g.kind == kind)
    }

    /// INPUT terminals in creation order.
    pub fn input_gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.gates_of_kind(GateKind::Input)
    }

    /// OUTPUT terminals in creation order.
    pub fn output_gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.gates_of_kind(GateKind::Output)
    }

    /// Non-terminal gates in creation order.
    pub fn logic_gates(&self) -> impl Iterator<Item = &Gate> + '_ {
        self.gates.iter().filter(|g| !g.kind.is_terminal())
    }

    /// Set the value of an INPUT terminal.
    pub fn set_input(&mut self, id: GateId, value: bool) -> Result<()> {
        let gate = self.gate_mut(id).ok_or(LogicError::GateNotFound { id })?;
        if gate.kind != GateKind::Input {
            return Err(LogicError::NotAnInput { id });
        }
        gate.set_output_pin(0, value);
        Ok(())
    }

    /// Value shown by an OUTPUT terminal.
    pub fn output_value(&self, id: GateId) -> Option<bool> {
        self.gate(id)
            .filter(|g| g.kind == GateKind::Output)
            .and_then(|g| g.input(0))
    }

    /// Move a gate on the canvas.
    pub fn set_position(&mut self, id: GateId, position: Position) -> Result<()> {
        let gate = self.gate_mut(id).ok_or(LogicError::GateNotFound { id })?;
        gate.position = position;
        Ok(())
    }

    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and_circuit() -> (Circuit, GateId, GateId, GateId, GateId) {
        let mut c = Circuit::new();
        let a = c.create_gate(GateKind::Input, Position::default());
        let b = c.create_gate(GateKind::Input, Position::default());
        let g = c.create_gate(GateKind::And, Position::default());
        let o = c.create_gate(GateKind::Output, Position::default());
        (c, a, b, g, o)
    }

    #[test]
    fn test_create_gate_arity() {
        let mut c = Circuit::new();
        for kind in GateKind::ALL {
            let id = c.create_gate(kind, Position::new(10.0, 20.0));
            let gate = c.gate(id).unwrap();
            assert_eq!(gate.input_values().len(), kind.input_count());
            assert_eq!(gate.output_values().len(), kind.output_count());
            assert_eq!(gate.position, Position::new(10.0, 20.0));
        }
    }

    #[test]
    fn test_ids_monotonic_and_reset_on_clear() {
        let mut c = Circuit::new();
        let first = c.create_gate(GateKind::Not, Position::default());
        let second = c.create_gate(GateKind::Not, Position::default());
        assert!(second > first);
        c.delete_gate(second).unwrap();
        let third = c.create_gate(GateKind::Not, Position::default());
        assert!(third > second);

        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.create_gate(GateKind::Or, Position::default()), GateId(0));
    }

    #[test]
    fn test_create_gate_named_rejects_unknown_kind() {
        let mut c = Circuit::new();
        assert!(c.create_gate_named("nand", 0.0, 0.0).is_ok());
        let err = c.create_gate_named("MUX", 0.0, 0.0).unwrap_err();
        assert!(matches!(err, LogicError::InvalidGateKind { .. }));
        assert_eq!(c.gate_count(), 1);
    }

    #[test]
    fn test_connect_normalizes_pin_order() {
        let (mut c, a, _, g, _) = and_circuit();
        let wire = c
            .connect(PinRef::input(g, 1), PinRef::output(a, 0))
            .unwrap()
            .clone();
        assert_eq!(wire.source, PinRef::output(a, 0));
        assert_eq!(wire.target, PinRef::input(g, 1));
        assert_eq!(wire.color.as_deref(), Some(DEFAULT_WIRE_COLOR));
    }

    fn refused(result: Result<&Wire>) -> Option<ConnectionErrorKind> {
        result.err().and_then(|e| e.connection_kind())
    }

    #[test]
    fn test_connect_rejections() {
        let (mut c, a, b, g, o) = and_circuit();

        assert_eq!(
            refused(c.connect(PinRef::input(g, 0), PinRef::input(o, 0))),
            Some(ConnectionErrorKind::DirectionMismatch)
        );
        assert_eq!(
            refused(c.connect(PinRef::output(a, 0), PinRef::output(b, 0))),
            Some(ConnectionErrorKind::DirectionMismatch)
        );
        assert_eq!(
            refused(c.connect(PinRef::output(g, 0), PinRef::input(g, 0))),
            Some(ConnectionErrorKind::SelfLoop)
        );
        assert_eq!(
            refused(c.connect(PinRef::output(a, 0), PinRef::input(g, 2))),
            Some(ConnectionErrorKind::PinOutOfRange)
        );

        c.connect_gates(a, g, 0).unwrap();
        assert_eq!(
            refused(c.connect_gates(a, g, 0)),
            Some(ConnectionErrorKind::DuplicateWire)
        );
        assert_eq!(
            refused(c.connect_gates(b, g, 0)),
            Some(ConnectionErrorKind::TargetOccupied)
        );
        assert_eq!(c.wire_count(), 1);
        assert_eq!(c.driver_of(g, 0).unwrap().source.gate, a);
    }

    #[test]
    fn test_connect_missing_gate() {
        let (mut c, a, ..) = and_circuit();
        let err = c.connect_gates(a, GateId(99), 0).unwrap_err();
        assert!(matches!(err, LogicError::GateNotFound { id: GateId(99) }));
    }

    #[test]
    fn test_fan_out_allowed() {
        let (mut c, a, _, g, o) = and_circuit();
        c.connect_gates(a, g, 0).unwrap();
        c.connect_gates(a, g, 1).unwrap();
        c.connect_gates(a, o, 0).unwrap();
        assert_eq!(c.find_wires(a).count(), 3);
    }

    #[test]
    fn test_delete_wire_idempotent() {
        let (mut c, a, _, g, _) = and_circuit();
        let wire = c.connect_gates(a, g, 0).unwrap().clone();
        assert!(c.delete_wire(&wire));
        assert!(!c.delete_wire(&wire));
        assert_eq!(c.wire_count(), 0);
    }

    #[test]
    fn test_delete_missing_gate() {
        let mut c = Circuit::new();
        assert!(matches!(
            c.delete_gate(GateId(3)),
            Err(LogicError::GateNotFound { .. })
        ));
    }

    #[test]
    fn test_set_input_only_on_inputs() {
        let (mut c, a, _, g, o) = and_circuit();
        c.set_input(a, true).unwrap();
        assert_eq!(c.gate(a).unwrap().output(0), Some(true));
        assert!(matches!(c.set_input(g, true), Err(LogicError::NotAnInput { .. })));
        assert_eq!(c.output_value(o), Some(false));
        assert_eq!(c.output_value(g), None);
    }

    #[test]
    fn test_category_iterators_keep_creation_order() {
        let (c, a, b, g, o) = and_circuit();
        assert_eq!(c.input_gates().map(|g| g.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(c.logic_gates().map(|g| g.id).collect::<Vec<_>>(), vec![g]);
        assert_eq!(c.output_gates().map(|g| g.id).collect::<Vec<_>>(), vec![o]);
    }
}
