//! Advisory checks and reports. Nothing here changes the recovered box.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use itertools::Itertools;
use log::{info, warn};

use crate::{AdderBox, AdderRecord, BoxLists, Circuit, NodeId, Result, XorRecord};

/// Findings of [`check_xors`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XorCheckReport {
    /// Nodes with more than one 2-input XOR cut, and how many they have.
    pub multi_cut: Vec<(NodeId, usize)>,
    /// Nodes with one 2-input XOR cut that are not structurally an XOR.
    pub unconfirmed: Vec<NodeId>,
}

/// Cross-check 2-input XOR records against the circuit.
#[must_use]
pub fn check_xors<C: Circuit + ?Sized>(circuit: &C, xors: &[XorRecord]) -> XorCheckReport {
    let mut cuts = BTreeMap::new();
    for xor in xors.iter().filter(|xor| xor.is_two_input()) {
        *cuts.entry(xor.output).or_insert(0_usize) += 1;
    }

    let mut report = XorCheckReport::default();
    for (node, count) in cuts {
        if count > 1 {
            warn!("node {} has {} two-input XOR cuts", node, count);
            report.multi_cut.push((node, count));
        } else if circuit.recognize_xor(node).is_none() {
            warn!("node {} cannot be recognized as XOR", node);
            report.unconfirmed.push(node);
        }
    }

    if report.multi_cut.is_empty() {
        info!("no node has multiple two-input XOR cuts");
    }

    report
}

/// Findings of [`verify_connections`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionReport {
    /// Box outputs consumed by at least one box input.
    pub internal: usize,
    /// Box outputs consumed by more than one box input, and by how many.
    pub fanouts: Vec<(NodeId, usize)>,
}

/// Count how boxed adders feed one another.
///
/// # Errors
/// Returns [`crate::AcecError::AdderOutOfRange`] if a box names a missing adder record.
pub fn verify_connections(adders: &[AdderRecord], boxes: &BoxLists) -> Result<ConnectionReport> {
    boxes.check_bounds(adders.len())?;

    let mut consumers: HashMap<NodeId, usize> = boxes
        .boxed()
        .flat_map(|index| [adders[index].sum, adders[index].carry])
        .map(|node| (node, 0))
        .collect();

    for index in boxes.boxed() {
        for fanin in adders[index].fanins.iter().filter(|&&fanin| fanin != 0) {
            if let Some(count) = consumers.get_mut(fanin) {
                *count += 1;
            }
        }
    }

    let mut report = ConnectionReport {
        internal: consumers.values().filter(|&&count| count > 0).count(),
        fanouts: consumers.into_iter().filter(|&(_, count)| count > 1).collect(),
    };
    report.fanouts.sort_unstable();

    for (node, count) in &report.fanouts {
        warn!("box output {} feeds {} box inputs", node, count);
    }
    info!("{} box outputs feed other boxes", report.internal);

    Ok(report)
}

impl fmt::Display for AdderBox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Adder box with {} ranks:", self.rank_count())?;
        for rank in 0..self.rank_count() {
            writeln!(f, "Rank {:2} : Boxes = {{{}}}", rank, self.boxes().rank(rank).iter().join(" "))?;
            writeln!(f, "          Leaves = {{{}}}", self.leaf_literals(rank).iter().join(" "))?;
            writeln!(f, "          Roots = {{{}}}", self.root_literals(rank).iter().join(" "))?;
        }
        for (rank, roots) in self.root_levels().enumerate().skip(self.rank_count()) {
            writeln!(f, "Rank {:2} : Roots = {{{}}}", rank, roots.iter().join(" "))?;
        }
        Ok(())
    }
}
