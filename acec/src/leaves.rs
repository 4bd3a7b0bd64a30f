//! Sorting XOR tree fanins into free leaves and adder boxes.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::{AcecError, AdderRecord, NodeId, RankMap, Result, XorRecord};

/// Free leaf nodes of every XOR tree, indexed by rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XorLeaves(Vec<Vec<NodeId>>);

impl XorLeaves {
    /// Returns the leaves of tree `rank`.
    #[must_use]
    pub fn rank(&self, rank: usize) -> &[NodeId] {
        self.0.get(rank).map_or(&[], Vec::as_slice)
    }

    /// Number of trees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leaves of every tree, in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        self.0.iter().map(Vec::as_slice)
    }
}

/// Adder record indices boxed into every column, indexed by rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoxLists(Vec<Vec<usize>>);

impl BoxLists {
    /// Returns the boxes of column `rank`.
    #[must_use]
    pub fn rank(&self, rank: usize) -> &[usize] {
        self.0.get(rank).map_or(&[], Vec::as_slice)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boxes of every column, in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.0.iter().map(Vec::as_slice)
    }

    /// Every boxed adder index, column by column.
    pub fn boxed(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().flatten().copied()
    }

    /// Check that every boxed index names one of `adder_count` adder records.
    ///
    /// # Errors
    /// Returns [`AcecError::AdderOutOfRange`] for the first index that does not.
    pub fn check_bounds(&self, adder_count: usize) -> Result<()> {
        match self.boxed().find(|&adder| adder >= adder_count) {
            Some(adder) => Err(AcecError::AdderOutOfRange { adder, adder_count }),
            None => Ok(()),
        }
    }

    pub(crate) fn sort(&mut self) {
        for level in &mut self.0 {
            level.sort_unstable();
        }
    }
}

#[cfg(test)]
impl From<Vec<Vec<usize>>> for BoxLists {
    fn from(lists: Vec<Vec<usize>>) -> Self {
        Self(lists)
    }
}

#[cfg(test)]
impl From<Vec<Vec<NodeId>>> for XorLeaves {
    fn from(lists: Vec<Vec<NodeId>>) -> Self {
        Self(lists)
    }
}

/// Walk every ranked XOR and classify its fanins.
///
/// A fanin that is another XOR of the same tree is internal. A fanin driven by
/// the carry of a ranked adder boxes that adder one column down; anything else
/// is a free leaf of the tree. Nodes shared between trees belong to neither and
/// are skipped. Adders whose sum is a tree root but were not boxed by a carry
/// are boxed into that root's column.
///
/// # Errors
/// Returns [`AcecError::RankMismatch`] if an XOR fanin is an XOR of another tree.
pub fn collect_leaves(
    xors: &[XorRecord],
    adders: &[AdderRecord],
    roots: &[NodeId],
    ranks: &RankMap,
) -> Result<(XorLeaves, BoxLists)> {
    let ranked_xors = xors
        .iter()
        .map(|xor| xor.output)
        .filter(|&output| ranks.rank(output).is_some())
        .collect::<HashSet<_>>();

    // Later records win, as they would in a flat node-indexed map.
    let carry_boxes = adders
        .iter()
        .enumerate()
        .filter(|(_, adder)| ranks.rank(adder.carry).is_some())
        .map(|(index, adder)| (adder.carry, index))
        .collect::<HashMap<_, _>>();

    let mut leaves = vec![Vec::new(); roots.len()];
    let mut boxes = vec![Vec::new(); roots.len()];

    for xor in xors {
        let rank = match ranks.rank(xor.output) {
            Some(rank) if rank < roots.len() => rank,
            _ => continue,
        };

        for fanin in xor.inputs() {
            if ranked_xors.contains(&fanin) {
                let fanin_rank = ranks.rank(fanin);
                if fanin_rank != Some(rank) {
                    return Err(AcecError::RankMismatch { xor: xor.output, rank, fanin, fanin_rank });
                }
                continue;
            }

            if ranks.is_shared(fanin) {
                trace!("skipping shared fanin {} of XOR {}", fanin, xor.output);
                continue;
            }

            match carry_boxes.get(&fanin) {
                None => leaves[rank].push(fanin),
                Some(&adder) if rank > 0 => boxes[rank - 1].push(adder),
                Some(_) => {},
            }
        }
    }

    let boxed = boxes.iter().flatten().copied().collect::<HashSet<_>>();
    for (index, adder) in adders.iter().enumerate() {
        if boxed.contains(&index) {
            continue;
        }
        if let Some(rank) = roots.iter().position(|&root| root == adder.sum) {
            boxes[rank].push(index);
        }
    }

    Ok((XorLeaves(leaves), BoxLists(boxes)))
}
