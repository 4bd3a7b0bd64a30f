//! Finding XOR tree roots and assigning every node to at most one tree.

use std::collections::HashSet;

use itertools::Itertools;

use crate::{AcecError, NodeId, Result, XorRecord};

/// Collect XOR outputs that no XOR consumes, in first-seen order.
#[must_use]
pub fn find_roots(xors: &[XorRecord]) -> Vec<NodeId> {
    let fanins = xors.iter().flat_map(|xor| xor.fanins.iter().copied()).collect::<HashSet<_>>();

    xors.iter()
        .map(|xor| xor.output)
        .filter(|output| !fanins.contains(output))
        .unique()
        .collect()
}

/// The tree (rank) of every node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankMap {
    ranks: Vec<Option<usize>>,
    shared: Vec<bool>,
}

impl RankMap {
    fn new(node_count: usize) -> Self {
        Self {
            ranks: vec![None; node_count],
            shared: vec![false; node_count],
        }
    }

    /// Returns the rank of a node, or `None` if it belongs to no tree.
    #[must_use]
    pub fn rank(&self, node: NodeId) -> Option<usize> {
        self.ranks.get(node as usize).copied().flatten()
    }

    /// Returns true if the node was reached from two trees and excluded from both.
    #[must_use]
    pub fn is_shared(&self, node: NodeId) -> bool {
        self.shared.get(node as usize).copied().unwrap_or(false)
    }

    /// Number of nodes the map covers.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ranks.len()
    }

    /// Iterate over ranked nodes and their ranks.
    // Every index came from a NodeId, so the cast back is lossless.
    #[allow(clippy::cast_possible_truncation)]
    pub fn ranked(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.ranks.iter().enumerate().filter_map(|(node, rank)| rank.map(|rank| (node as NodeId, rank)))
    }
}

/// Assign each node reachable from a root through XOR fanins the root's index.
///
/// XOR records are visited in reverse, so ranks flow from the roots, which the
/// detector emits last, down to the leaves. A node reached from two different
/// trees is shared: it ends up unranked and is reported by
/// [`RankMap::is_shared`].
///
/// # Errors
/// Returns [`AcecError::NodeOutOfRange`] if a record or root names a node past `node_count`.
pub fn rank_trees(node_count: usize, xors: &[XorRecord], roots: &[NodeId]) -> Result<RankMap> {
    let mut map = RankMap::new(node_count);
    let check = |node: NodeId| {
        if (node as usize) < node_count {
            Ok(node as usize)
        } else {
            Err(AcecError::NodeOutOfRange { node, node_count })
        }
    };

    for (rank, &root) in roots.iter().enumerate() {
        map.ranks[check(root)?] = Some(rank);
    }

    let mut doubles = Vec::new();

    for xor in xors.iter().rev() {
        // Skip XORs that are not part of any tree.
        let rank = match map.ranks[check(xor.output)?] {
            Some(rank) => rank,
            None => continue,
        };

        for fanin in xor.inputs() {
            let index = check(fanin)?;
            match map.ranks[index] {
                Some(other) if other == rank => {},
                Some(_) => doubles.push(index),
                None => map.ranks[index] = Some(rank),
            }
        }
    }

    for index in doubles {
        map.ranks[index] = None;
        map.shared[index] = true;
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roots_of_empty_list() {
        assert!(find_roots(&[]).is_empty());
    }

    #[test]
    fn roots_skip_consumed_xors() {
        // 10 = 1 ^ 2 ^ 3 feeds 12 = 10 ^ 4; 11 = 5 ^ 6 stands alone.
        let xors = [
            XorRecord::new(10, 1, 2, 3),
            XorRecord::new(11, 5, 6, 0),
            XorRecord::new(12, 10, 4, 0),
            XorRecord::new(11, 6, 5, 0),
        ];
        assert_eq!(find_roots(&xors), vec![11, 12]);
    }

    #[test]
    fn ranks_follow_fanins() {
        let xors = [
            XorRecord::new(10, 1, 2, 3),
            XorRecord::new(12, 10, 4, 0),
            XorRecord::new(11, 5, 6, 0),
        ];
        let roots = find_roots(&xors);
        assert_eq!(roots, vec![12, 11]);

        let ranks = rank_trees(13, &xors, &roots).expect("ranking to succeed");
        for node in [12, 10, 1, 2, 3, 4] {
            assert_eq!(ranks.rank(node), Some(0), "node {}", node);
        }
        for node in [11, 5, 6] {
            assert_eq!(ranks.rank(node), Some(1), "node {}", node);
        }
        assert_eq!(ranks.rank(0), None);
        assert_eq!(ranks.rank(7), None);
        assert_eq!(ranks.ranked().count(), 9);
    }

    #[test]
    fn shared_node_is_excluded() {
        // Node 3 feeds both trees.
        let xors = [XorRecord::new(10, 1, 3, 0), XorRecord::new(11, 2, 3, 0)];
        let roots = find_roots(&xors);
        let ranks = rank_trees(12, &xors, &roots).expect("ranking to succeed");

        assert_eq!(ranks.rank(3), None);
        assert!(ranks.is_shared(3));
        assert_eq!(ranks.rank(1), Some(0));
        assert_eq!(ranks.rank(2), Some(1));
        assert!(!ranks.is_shared(1));
    }

    #[test]
    fn out_of_range_node() {
        let xors = [XorRecord::new(10, 1, 20, 0)];
        let roots = find_roots(&xors);
        assert!(matches!(
            rank_trees(12, &xors, &roots),
            Err(AcecError::NodeOutOfRange { node: 20, node_count: 12 })
        ));
    }

    fn xor_lists() -> impl Strategy<Value = Vec<XorRecord>> {
        prop::collection::vec((1u32..40, 0u32..40, 0u32..40, 0u32..40), 0..24)
            .prop_map(|records| records.into_iter().map(|(o, a, b, c)| XorRecord::new(o, a, b, c)).collect())
    }

    proptest! {
        #[test]
        fn roots_are_unconsumed_and_distinct(xors in xor_lists()) {
            let roots = find_roots(&xors);
            for root in &roots {
                prop_assert!(xors.iter().all(|xor| !xor.fanins.contains(root)));
            }
            prop_assert_eq!(roots.iter().unique().count(), roots.len());
        }

        #[test]
        fn shared_nodes_have_no_rank(xors in xor_lists()) {
            let roots = find_roots(&xors);
            let ranks = rank_trees(40, &xors, &roots).unwrap();
            for node in 0..40 {
                if ranks.is_shared(node) {
                    prop_assert_eq!(ranks.rank(node), None);
                }
            }
            // Nothing consumes a root, so no other tree can claim it.
            for (index, root) in roots.iter().enumerate() {
                prop_assert_eq!(ranks.rank(*root), Some(index));
            }
        }

        #[test]
        fn ranking_is_deterministic(xors in xor_lists()) {
            let roots = find_roots(&xors);
            prop_assert_eq!(rank_trees(40, &xors, &roots).unwrap(), rank_trees(40, &xors, &roots).unwrap());
        }
    }
}
