//! Putting XOR tree roots into carry-chain order.

use log::{debug, warn};

use crate::{AcecError, AdderRecord, NodeId, RankMap, Result};

/// Reorder `roots` so that every column comes after the column whose carries it consumes.
///
/// An adder whose carry lands in tree `r` and whose inputs sit in tree `q`
/// links `r` to `q`. The chain starts at the least-significant tree: the one
/// that links nowhere but is linked to. Roots that are not on the chain are
/// dropped.
///
/// # Errors
/// Returns [`AcecError::NoChainHead`] if two or more roots have no chain
/// between them.
pub fn order_roots(adders: &[AdderRecord], ranks: &RankMap, roots: &[NodeId]) -> Result<Vec<NodeId>> {
    let mut next: Vec<Option<usize>> = vec![None; roots.len()];

    for adder in adders {
        let carry_rank = match ranks.rank(adder.carry) {
            Some(rank) if rank < roots.len() => rank,
            _ => continue,
        };

        for fanin in adder.fanins.iter() {
            match ranks.rank(*fanin) {
                Some(rank) if rank != carry_rank && rank < roots.len() => next[carry_rank] = Some(rank),
                _ => {},
            }
        }
    }

    debug!("carry links between trees: {:?}", next);

    let head = (0..roots.len()).find(|&rank| next[rank].is_none() && next.contains(&Some(rank)));

    let head = match head {
        Some(head) => head,
        None if roots.len() <= 1 => return Ok(roots.to_vec()),
        None => return Err(AcecError::NoChainHead { roots: roots.len() }),
    };

    // Every rank links to at most one other and the head links nowhere, so
    // walking back from the head visits each rank once.
    let mut order = Vec::with_capacity(roots.len());
    let mut current = head;

    loop {
        order.push(roots[current]);

        match next.iter().position(|&link| link == Some(current)) {
            Some(successor) => current = successor,
            None => break,
        }
    }

    if order.len() < roots.len() {
        warn!("{} of {} XOR trees are not on the adder chain", roots.len() - order.len(), roots.len());
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find_roots, rank_trees, XorRecord};

    // Three ripple-carry columns. Adder k adds a_k, b_k and the carry of
    // adder k - 1. The XOR list is emitted most-significant column first, so
    // the roots come out in the wrong order.
    //
    //   column  a  b  sum  carry
    //   0       1  2  10   11
    //   1       3  4  12   13
    //   2       5  6  14   15
    fn ripple() -> (Vec<XorRecord>, Vec<AdderRecord>) {
        let xors = vec![
            XorRecord::new(14, 5, 6, 13),
            XorRecord::new(12, 3, 4, 11),
            XorRecord::new(10, 1, 2, 0),
        ];
        let adders = vec![
            AdderRecord::new([1, 2, 0], 10, 11, 0),
            AdderRecord::new([3, 4, 11], 12, 13, 0),
            AdderRecord::new([5, 6, 13], 14, 15, 0),
        ];
        (xors, adders)
    }

    #[test]
    fn least_significant_first() {
        let (xors, adders) = ripple();
        let roots = find_roots(&xors);
        assert_eq!(roots, vec![14, 12, 10]);

        let ranks = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        let order = order_roots(&adders, &ranks, &roots).expect("ordering to succeed");
        assert_eq!(order, vec![10, 12, 14]);
    }

    #[test]
    fn reranking_permutes_ranks() {
        let (xors, adders) = ripple();
        let roots = find_roots(&xors);
        let before = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        let order = order_roots(&adders, &before, &roots).expect("ordering to succeed");
        let after = rank_trees(16, &xors, &order).expect("ranking to succeed");

        // Membership is unchanged; only the tree numbering follows the new order.
        for node in 0..16 {
            match (before.rank(node), after.rank(node)) {
                (Some(old), Some(new)) => assert_eq!(order[new], roots[old]),
                (None, None) => {},
                (old, new) => panic!("node {} moved from {:?} to {:?}", node, old, new),
            }
        }
    }

    #[test]
    fn already_ordered() {
        let (mut xors, adders) = ripple();
        xors.reverse();
        let roots = find_roots(&xors);
        let ranks = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        assert_eq!(order_roots(&adders, &ranks, &roots).expect("ordering to succeed"), vec![10, 12, 14]);
    }

    #[test]
    fn trivial_orders() {
        let ranks = rank_trees(16, &[], &[]).expect("ranking to succeed");
        assert!(order_roots(&[], &ranks, &[]).expect("empty ordering to succeed").is_empty());

        let xors = [XorRecord::new(10, 1, 2, 0)];
        let ranks = rank_trees(16, &xors, &[10]).expect("ranking to succeed");
        assert_eq!(order_roots(&[], &ranks, &[10]).expect("single root to succeed"), vec![10]);
    }

    #[test]
    fn unconnected_trees() {
        let xors = [XorRecord::new(10, 1, 2, 0), XorRecord::new(11, 3, 4, 0)];
        let roots = find_roots(&xors);
        let ranks = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        assert!(matches!(order_roots(&[], &ranks, &roots), Err(AcecError::NoChainHead { roots: 2 })));
    }

    #[test]
    fn trees_feeding_each_other() {
        // Each tree takes the other's carry as a leaf, so neither can come first.
        let xors = [XorRecord::new(10, 1, 2, 0), XorRecord::new(12, 3, 4, 0)];
        let adders = [AdderRecord::new([3, 4, 0], 5, 1, 0), AdderRecord::new([1, 2, 0], 6, 3, 0)];
        let roots = find_roots(&xors);
        let ranks = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        assert!(matches!(order_roots(&adders, &ranks, &roots), Err(AcecError::NoChainHead { roots: 2 })));
    }

    #[test]
    fn off_chain_tree_is_dropped() {
        let (mut xors, adders) = ripple();
        xors.push(XorRecord::new(9, 7, 8, 0));
        let roots = find_roots(&xors);
        let ranks = rank_trees(16, &xors, &roots).expect("ranking to succeed");
        assert_eq!(order_roots(&adders, &ranks, &roots).expect("ordering to succeed"), vec![10, 12, 14]);
    }
}
