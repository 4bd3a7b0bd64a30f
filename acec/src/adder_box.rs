//! The adder box: column-ordered adder cells with their leaf and root literals.
//!
//! Building a box resolves the polarity of every boxed adder. Phases start at
//! adders whose carry leaves the tree and flow backwards along carry wires
//! into the adders that drive them. The result is then checked twice: each
//! adder must compute the function its phases claim, and every wire between
//! two boxes must be seen with the same phase from both ends.

use std::collections::HashMap;

use log::debug;

use crate::traits::CUT_VARIABLES;
use crate::{AcecError, AdderRecord, BoxLists, Circuit, Literal, NodeId, Result, XorLeaves};

/// Resolved polarities of one adder box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoxPhase {
    /// Phase of inputs 0 to 2.
    pub inputs: [bool; 3],
    /// Phase of the sum output.
    pub sum: bool,
    /// Phase of the carry output.
    pub carry: bool,
}

impl BoxPhase {
    /// Phases of an adder whose carry is seen with phase `carry`.
    #[must_use]
    pub fn resolve(adder: &AdderRecord, carry: bool) -> Self {
        let inputs = [adder.sign(0) ^ carry, adder.sign(1) ^ carry, adder.sign(2) ^ carry];
        let sum = adder.sign(3) ^ inputs[0] ^ inputs[1] ^ inputs[2];
        Self { inputs, sum, carry }
    }
}

/// Recovered adder tree, column by column.
#[derive(Clone, Debug)]
pub struct AdderBox<'a> {
    adders: &'a [AdderRecord],
    boxes: BoxLists,
    leaf_lits: Vec<Vec<Literal>>,
    root_lits: Vec<Vec<Literal>>,
    phases: Vec<Option<BoxPhase>>,
}

const fn mask(phase: bool) -> u8 {
    if phase {
        0xFF
    } else {
        0x00
    }
}

const fn maj(x: u8, y: u8, z: u8) -> u8 {
    (x & y) | (y & z) | (x & z)
}

fn mark(marks: &mut [bool], node: NodeId) -> Result<()> {
    let node_count = marks.len();
    match marks.get_mut(node as usize) {
        Some(mark) => {
            *mark = true;
            Ok(())
        },
        None => Err(AcecError::NodeOutOfRange { node, node_count }),
    }
}

fn is_marked(marks: &[bool], node: NodeId) -> bool {
    marks.get(node as usize).copied().unwrap_or(false)
}

impl<'a> AdderBox<'a> {
    /// Build the box from the per-column adder lists.
    ///
    /// `boxes`, `leaves` and `roots` come from ranking and leaf collection
    /// and have one entry per column.
    ///
    /// # Errors
    /// Fails if the column lists disagree in length or name a missing adder,
    /// and if a boxed adder never receives a phase, does not compute the
    /// function its phases claim, or disagrees on phase with a box it is wired to.
    pub fn build<C: Circuit + ?Sized>(
        circuit: &C,
        adders: &'a [AdderRecord],
        mut boxes: BoxLists,
        leaves: &XorLeaves,
        roots: &[NodeId],
    ) -> Result<Self> {
        if boxes.len() != roots.len() || leaves.len() != roots.len() {
            return Err(AcecError::ColumnMismatch { boxes: boxes.len(), leaves: leaves.len(), roots: roots.len() });
        }
        boxes.check_bounds(adders.len())?;

        let ranks = roots.len();
        let node_count = circuit.node_count();
        let mut is_leaf = vec![false; node_count];
        let mut is_root = vec![false; node_count];

        for adder in boxes.boxed().map(|index| &adders[index]) {
            for &fanin in &adder.fanins {
                mark(&mut is_leaf, fanin)?;
            }
            mark(&mut is_root, adder.sum)?;
            mark(&mut is_root, adder.carry)?;
        }

        boxes.sort();

        let phases = Self::propagate_phases(adders, &boxes, &is_leaf);

        let mut adder_box = Self {
            adders,
            boxes,
            leaf_lits: vec![Vec::new(); ranks],
            root_lits: vec![Vec::new(); ranks],
            phases,
        };

        adder_box.verify_functions(circuit)?;
        adder_box.verify_links()?;

        mark(&mut is_root, 0)?;
        adder_box.collect_literals(&is_leaf, &is_root)?;

        if let Some(last) = ranks.checked_sub(1) {
            if adder_box.leaf_lits[last].is_empty() {
                adder_box.leaf_lits[last] = leaves.rank(last).iter().map(|&node| Literal::positive(node)).collect();
            }
            adder_box.root_lits[last] = vec![Literal::positive(roots[last])];
        }

        for level in &mut adder_box.leaf_lits {
            level.sort_unstable();
        }
        for level in &mut adder_box.root_lits {
            level.sort_unstable_by_key(|lit| lit.polarity_key());
        }

        Ok(adder_box)
    }

    /// Push carry phases from unconsumed carries back through the boxes that feed them.
    fn propagate_phases(adders: &[AdderRecord], boxes: &BoxLists, is_leaf: &[bool]) -> Vec<Option<BoxPhase>> {
        let carries = boxes.boxed().map(|index| (adders[index].carry, index)).collect::<HashMap<_, _>>();
        let mut phases = vec![None; adders.len()];
        let mut stack = Vec::new();

        for rank in (0..boxes.len()).rev() {
            for &seed in boxes.rank(rank) {
                let adder = &adders[seed];
                if is_marked(is_leaf, adder.carry) {
                    continue;
                }

                debug!("seeding phase of box {} from carry {}", seed, adder.carry);
                stack.push((adder.carry, adder.sign(2)));

                while let Some((node, phase)) = stack.pop() {
                    let index = match carries.get(&node) {
                        Some(&index) if phases[index].is_none() => index,
                        _ => continue,
                    };

                    let adder = &adders[index];
                    let resolved = BoxPhase::resolve(adder, phase);
                    phases[index] = Some(resolved);

                    // Reversed, so input 0 is walked first.
                    for k in (0..3).rev() {
                        if adder.fanins[k] != 0 {
                            stack.push((adder.fanins[k], resolved.inputs[k]));
                        }
                    }
                }
            }
        }

        phases
    }

    fn resolved(&self, adder: usize) -> Result<BoxPhase> {
        self.phases.get(adder).copied().flatten().ok_or(AcecError::UnresolvedPhase { adder })
    }

    /// Check every box against its cone in the circuit.
    fn verify_functions<C: Circuit + ?Sized>(&self, circuit: &C) -> Result<()> {
        for index in self.boxes.boxed() {
            let adder = &self.adders[index];
            let phase = self.resolved(index)?;

            let truth = |node: NodeId| {
                circuit.cut_truth_table(node, adder.fanins).ok_or(AcecError::ConeEscapesCut { adder: index, node })
            };
            let sum = truth(adder.sum)?;
            let carry = truth(adder.carry)?;

            let inputs = [0, 1, 2].map(|k| {
                let variable = if adder.fanins[k] == 0 { 0x00 } else { CUT_VARIABLES[k] };
                variable ^ mask(phase.inputs[k])
            });

            if sum != inputs[0] ^ inputs[1] ^ inputs[2] ^ mask(phase.sum) {
                return Err(AcecError::BoxFunctionMismatch { adder: index, output: "sum" });
            }
            if carry != maj(inputs[0], inputs[1], inputs[2]) ^ mask(phase.carry) {
                return Err(AcecError::BoxFunctionMismatch { adder: index, output: "carry" });
            }
        }

        Ok(())
    }

    /// Check that box outputs feeding other boxes are seen with one phase.
    fn verify_links(&self) -> Result<()> {
        let mut outputs = HashMap::new();
        for index in self.boxes.boxed() {
            let adder = &self.adders[index];
            let phase = self.resolved(index)?;
            outputs.insert(adder.sum, phase.sum);
            outputs.insert(adder.carry, phase.carry);
        }

        for index in self.boxes.boxed() {
            let adder = &self.adders[index];
            let phase = self.resolved(index)?;

            for (input, &node) in adder.fanins.iter().enumerate() {
                if node == 0 {
                    continue;
                }
                if let Some(&expected) = outputs.get(&node) {
                    if expected != phase.inputs[input] {
                        return Err(AcecError::PhaseMismatch {
                            adder: index,
                            input,
                            node,
                            expected,
                            found: phase.inputs[input],
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn collect_literals(&mut self, is_leaf: &[bool], is_root: &[bool]) -> Result<()> {
        for rank in 0..self.boxes.len() {
            for &index in self.boxes.rank(rank) {
                let adder = &self.adders[index];
                let phase = self.resolved(index)?;

                for (k, &node) in adder.fanins.iter().enumerate() {
                    if !is_marked(is_root, node) {
                        self.leaf_lits[rank].push(Literal::new(node, phase.inputs[k]));
                    }
                }

                for (node, output_phase, column) in [(adder.sum, phase.sum, rank), (adder.carry, phase.carry, rank + 1)] {
                    if is_marked(is_leaf, node) {
                        continue;
                    }
                    if self.root_lits.len() <= column {
                        self.root_lits.resize(column + 1, Vec::new());
                    }
                    self.root_lits[column].push(Literal::new(node, output_phase));
                }

                // A constant carry-in seen inverted is a constant one.
                if adder.is_half_adder() && phase.inputs[2] {
                    self.leaf_lits[rank].push(Literal::TRUE);
                }
            }
        }

        Ok(())
    }

    /// The adder records the box indexes into.
    #[must_use]
    pub const fn adders(&self) -> &'a [AdderRecord] {
        self.adders
    }

    /// Adder indices boxed into each column, ascending.
    #[must_use]
    pub const fn boxes(&self) -> &BoxLists {
        &self.boxes
    }

    /// Number of columns (XOR trees).
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.leaf_lits.len()
    }

    /// Returns true if no XOR tree was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaf_lits.is_empty()
    }

    /// Leaf literals of column `rank`, ordered by node then polarity.
    #[must_use]
    pub fn leaf_literals(&self, rank: usize) -> &[Literal] {
        self.leaf_lits.get(rank).map_or(&[], Vec::as_slice)
    }

    /// Root literals of column `rank`, ordered by polarity then node.
    ///
    /// There may be one more root column than there are ranks, holding the
    /// carry out of the most significant adders.
    #[must_use]
    pub fn root_literals(&self, rank: usize) -> &[Literal] {
        self.root_lits.get(rank).map_or(&[], Vec::as_slice)
    }

    /// Leaf literals of every column.
    pub fn leaf_levels(&self) -> impl Iterator<Item = &[Literal]> + '_ {
        self.leaf_lits.iter().map(Vec::as_slice)
    }

    /// Root literals of every column, including the carry-out column.
    pub fn root_levels(&self) -> impl Iterator<Item = &[Literal]> + '_ {
        self.root_lits.iter().map(Vec::as_slice)
    }

    /// Returns the resolved phases of a boxed adder.
    #[must_use]
    pub fn phase(&self, adder: usize) -> Option<BoxPhase> {
        self.phases.get(adder).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Aig;

    fn pos(lit: Literal) -> Literal {
        Literal::positive(lit.node())
    }

    fn neg(lit: Literal) -> Literal {
        Literal::new(lit.node(), true)
    }

    #[test]
    fn inverted_majority_resolves_carry_phase() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let ab = aig.add_xor(a, b);
        let s = aig.add_xor(ab, c);
        let k = aig.add_maj(!a, !b, !c);

        let adders = [AdderRecord::new([a.node(), b.node(), c.node()], s.node(), k.node(), 0b0111)];
        let boxes = BoxLists::from(vec![vec![0]]);
        let leaves = XorLeaves::from(vec![vec![a.node(), b.node(), c.node()]]);
        let adder_box = AdderBox::build(&aig, &adders, boxes, &leaves, &[s.node()]).expect("box to build");

        let phase = adder_box.phase(0).expect("box to have a phase");
        assert_eq!(phase, BoxPhase { inputs: [false; 3], sum: false, carry: true });
        assert_eq!(adder_box.leaf_literals(0), &[pos(a), pos(b), pos(c)]);
        assert_eq!(adder_box.root_literals(0), &[pos(s)]);
        assert_eq!(adder_box.root_literals(1), &[neg(k)]);
    }

    #[test]
    fn inverted_constant_carry_in() {
        // A half adder whose carry enters the next column inverted.
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let s0 = aig.add_xor(a, b);
        let k0 = aig.add_and(a, b);
        let t = aig.add_xor(k0, c);
        let s1 = aig.add_xor(t, d);
        let k1 = aig.add_maj(!k0, c, d);

        let adders = [
            AdderRecord::new([a.node(), b.node(), 0], s0.node(), k0.node(), 0),
            AdderRecord::new([k0.node(), c.node(), d.node()], s1.node(), k1.node(), 0b001),
        ];
        let boxes = BoxLists::from(vec![vec![0], vec![1]]);
        let leaves = XorLeaves::from(vec![vec![a.node(), b.node()], vec![c.node(), d.node()]]);
        let roots = [s0.node(), s1.node()];
        let adder_box = AdderBox::build(&aig, &adders, boxes, &leaves, &roots).expect("box to build");

        assert_eq!(adder_box.phase(0), Some(BoxPhase { inputs: [true; 3], sum: true, carry: true }));
        assert_eq!(adder_box.phase(1), Some(BoxPhase { inputs: [true, false, false], sum: true, carry: false }));

        assert_eq!(adder_box.leaf_literals(0), &[Literal::TRUE, neg(a), neg(b)]);
        assert_eq!(adder_box.root_literals(0), &[neg(s0)]);
        assert_eq!(adder_box.leaf_literals(1), &[pos(c), pos(d)]);
        assert_eq!(adder_box.root_literals(1), &[pos(s1)]);
        assert_eq!(adder_box.root_literals(2), &[pos(k1)]);
    }

    #[test]
    fn wrong_flags() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let ab = aig.add_xor(a, b);
        let s = aig.add_xor(ab, c);
        let k = aig.add_maj(!a, b, c);

        let adders = [AdderRecord::new([a.node(), b.node(), c.node()], s.node(), k.node(), 0)];
        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![0]]),
            &XorLeaves::from(vec![vec![]]),
            &[s.node()],
        );
        assert!(matches!(result, Err(AcecError::BoxFunctionMismatch { adder: 0, output: "carry" })));
    }

    #[test]
    fn sum_outside_cut() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let ab = aig.add_xor(a, b);
        let s = aig.add_xor(ab, c);
        let k = aig.add_and(a, b);

        let adders = [AdderRecord::new([a.node(), b.node(), 0], s.node(), k.node(), 0)];
        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![0]]),
            &XorLeaves::from(vec![vec![]]),
            &[s.node()],
        );
        assert!(matches!(result, Err(AcecError::ConeEscapesCut { adder: 0, node }) if node == s.node()));
    }

    #[test]
    fn carry_loop_is_unresolved() {
        let mut aig = Aig::new();
        let nodes = (0..6).map(|_| aig.add_input().node()).collect::<Vec<_>>();
        let adders = [
            AdderRecord::new([nodes[0], nodes[1], nodes[5]], nodes[2], nodes[4], 0),
            AdderRecord::new([nodes[2], nodes[3], nodes[4]], nodes[1], nodes[5], 0),
        ];
        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![0, 1]]),
            &XorLeaves::from(vec![vec![]]),
            &[nodes[2]],
        );
        assert!(matches!(result, Err(AcecError::UnresolvedPhase { adder: 0 })));
    }

    #[test]
    fn sum_seen_with_two_phases() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let s0 = aig.add_xor(a, b);
        let k0 = aig.add_and(a, b);
        let t = aig.add_xor(s0, c);
        let s1 = aig.add_xor(t, d);
        let k1 = aig.add_maj(!s0, c, d);

        let adders = [
            AdderRecord::new([a.node(), b.node(), 0], s0.node(), k0.node(), 0),
            AdderRecord::new([s0.node(), c.node(), d.node()], s1.node(), k1.node(), 0b001),
        ];
        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![0, 1]]),
            &XorLeaves::from(vec![vec![]]),
            &[s1.node()],
        );
        assert!(matches!(
            result,
            Err(AcecError::PhaseMismatch { adder: 1, input: 0, expected: false, found: true, .. })
        ));
    }

    #[test]
    fn mismatched_columns() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let s = aig.add_xor(a, b);
        let k = aig.add_and(a, b);
        let adders = [AdderRecord::new([a.node(), b.node(), 0], s.node(), k.node(), 0)];

        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![0], vec![]]),
            &XorLeaves::from(vec![vec![]]),
            &[s.node()],
        );
        assert!(matches!(result, Err(AcecError::ColumnMismatch { boxes: 2, leaves: 1, roots: 1 })));

        let result = AdderBox::build(
            &aig,
            &adders,
            BoxLists::from(vec![vec![1]]),
            &XorLeaves::from(vec![vec![]]),
            &[s.node()],
        );
        assert!(matches!(result, Err(AcecError::AdderOutOfRange { adder: 1, adder_count: 1 })));
    }

    #[test]
    fn empty_box() {
        let aig = Aig::new();
        let adder_box = AdderBox::build(&aig, &[], BoxLists::default(), &XorLeaves::default(), &[]).expect("empty box to build");
        assert!(adder_box.is_empty());
        assert_eq!(adder_box.rank_count(), 0);
        assert!(adder_box.root_levels().next().is_none());
    }
}
