//! The view of a circuit that box recovery needs.

use std::collections::HashMap;

use crate::{Literal, NodeId};

/// Truth tables of the three cut variables over eight minterms.
pub const CUT_VARIABLES: [u8; 3] = [0xAA, 0xCC, 0xF0];

/// Largest cone `cut_truth_table` will simulate.
const MAX_CONE: usize = 256;

/// A combinational AND-inverter circuit, as seen by box recovery.
pub trait Circuit {
    /// Returns the number of node indices in the circuit.
    fn node_count(&self) -> usize;

    /// Returns the two fanins of a node, if it is an AND gate.
    fn and_fanins(&self, node: NodeId) -> Option<[Literal; 2]>;

    /// Returns true if this node is an AND gate.
    fn is_and(&self, node: NodeId) -> bool {
        self.and_fanins(node).is_some()
    }

    /// Recognise `node` as a two-input XOR built from three AND gates.
    ///
    /// Matches `!(a & b) & !(!a & !b)` in either fanin order and returns the
    /// two XOR inputs.
    fn recognize_xor(&self, node: NodeId) -> Option<(Literal, Literal)> {
        let [x, y] = self.and_fanins(node)?;
        if !x.is_inverted() || !y.is_inverted() {
            return None;
        }

        let [x0, x1] = self.and_fanins(x.node())?;
        let [y0, y1] = self.and_fanins(y.node())?;

        if (x0 == !y0 && x1 == !y1) || (x0 == !y1 && x1 == !y0) {
            Some((x0, x1))
        } else {
            None
        }
    }

    /// Simulate the cone of `root` over up to three cut leaves.
    ///
    /// Leaf `k` takes the truth table `CUT_VARIABLES[k]`; a leaf of 0 is the
    /// constant. Returns `None` if the cone reaches a node that is neither an
    /// AND gate nor a leaf.
    fn cut_truth_table(&self, root: NodeId, leaves: [NodeId; 3]) -> Option<u8> {
        let mut values: HashMap<NodeId, u8> = HashMap::new();
        values.insert(0, 0x00);
        for (leaf, truth) in leaves.iter().zip(CUT_VARIABLES.iter()) {
            if *leaf != 0 {
                values.insert(*leaf, *truth);
            }
        }

        let mask = |phase: bool| if phase { 0xFF } else { 0x00 };

        let mut stack = vec![root];
        while let Some(&node) = stack.last() {
            if values.contains_key(&node) {
                stack.pop();
                continue;
            }

            let [x, y] = self.and_fanins(node)?;
            let pending = [x.node(), y.node()].iter().copied().filter(|fanin| !values.contains_key(fanin)).collect::<Vec<_>>();

            if pending.is_empty() {
                let value = (values[&x.node()] ^ mask(x.is_inverted())) & (values[&y.node()] ^ mask(y.is_inverted()));
                values.insert(node, value);
                stack.pop();
            } else {
                stack.extend(pending);
            }

            if values.len() + stack.len() > MAX_CONE {
                return None;
            }
        }

        values.get(&root).copied()
    }
}
