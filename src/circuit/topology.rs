//! Topological depth and loop detection over the wire graph.

use std::collections::{BTreeMap, HashMap};

use super::graph::Circuit;
use super::types::{GateId, GateKind};

/// Topological level of every gate, computed in one pass.
///
/// INPUT gates sit at level 0. Any other gate sits one level past its
/// deepest driver, or at level 1 when nothing drives it. The result is a
/// snapshot and goes stale as soon as the circuit is edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Levels {
    levels: BTreeMap<GateId, usize>,
}

impl Levels {
    /// Compute levels for every gate in `circuit`.
    pub fn compute(circuit: &Circuit) -> Self {
        let mut drivers: HashMap<GateId, Vec<GateId>> = HashMap::new();
        for wire in circuit.wires() {
            drivers
                .entry(wire.target.gate)
                .or_default()
                .push(wire.source.gate);
        }

        let kinds: HashMap<GateId, GateKind> = circuit.gates().iter().map(|g| (g.id, g.kind)).collect();
        let mut levels = BTreeMap::new();
        let mut on_stack = Vec::new();
        for gate in circuit.gates() {
            level_of(gate.id, &kinds, &drivers, &mut levels, &mut on_stack);
        }
        Self { levels }
    }

    /// Level of one gate.
    pub fn get(&self, id: GateId) -> Option<usize> {
        self.levels.get(&id).copied()
    }

    /// Deepest level found, 0 for an empty circuit.
    pub fn max_level(&self) -> usize {
        self.levels.values().copied().max().unwrap_or(0)
    }

    /// Iterate `(gate, level)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GateId, usize)> + '_ {
        self.levels.iter().map(|(id, level)| (*id, *level))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn level_of(
    id: GateId,
    kinds: &HashMap<GateId, GateKind>,
    drivers: &HashMap<GateId, Vec<GateId>>,
    levels: &mut BTreeMap<GateId, usize>,
    on_stack: &mut Vec<GateId>,
) -> usize {
    if let Some(&level) = levels.get(&id) {
        return level;
    }
    // A driver reached again while still being resolved closes a loop;
    // it contributes nothing to the depth.
    if on_stack.contains(&id) {
        return 0;
    }
    if kinds.get(&id) == Some(&GateKind::Input) {
        levels.insert(id, 0);
        return 0;
    }

    on_stack.push(id);
    let deepest = drivers
        .get(&id)
        .map(|sources| {
            sources
                .iter()
                .map(|&src| level_of(src, kinds, drivers, levels, on_stack))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);
    on_stack.pop();

    let level = deepest + 1;
    levels.insert(id, level);
    level
}

/// Find a combinational loop, returned as the gates along it in wire
/// order. `None` means the wire graph is acyclic.
pub fn find_cycle(circuit: &Circuit) -> Option<Vec<GateId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        Active,
        Done,
    }

    let mut fanout: HashMap<GateId, Vec<GateId>> = HashMap::new();
    for wire in circuit.wires() {
        fanout
            .entry(wire.source.gate)
            .or_default()
            .push(wire.target.gate);
    }

    let mut marks: HashMap<GateId, Mark> = circuit.gates().iter().map(|g| (g.id, Mark::Unseen)).collect();

    for root in circuit.gates() {
        if marks[&root.id] != Mark::Unseen {
            continue;
        }
        // Explicit stack of (gate, next fanout index) keeps deep chains
        // off the call stack.
        let mut path: Vec<(GateId, usize)> = vec![(root.id, 0)];
        marks.insert(root.id, Mark::Active);

        while let Some(top) = path.last_mut() {
            let (gate, next) = *top;
            top.1 += 1;
            let successors = fanout.get(&gate).map(Vec::as_slice).unwrap_or(&[]);
            if let Some(&succ) = successors.get(next) {
                match marks.get(&succ).copied().unwrap_or(Mark::Done) {
                    Mark::Unseen => {
                        marks.insert(succ, Mark::Active);
                        path.push((succ, 0));
                    }
                    Mark::Active => {
                        let start = path.iter().position(|(g, _)| *g == succ).unwrap_or(0);
                        return Some(path[start..].iter().map(|(g, _)| *g).collect());
                    }
                    Mark::Done => {}
                }
            } else {
                marks.insert(gate, Mark::Done);
                path.pop();
            }
        }
    }
    None
}
