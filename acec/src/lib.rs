//! Recovering adder trees from detected XOR and adder cells.
//!
//! Arithmetic circuits such as multipliers reduce to columns of XOR trees,
//! with full and half adders passing carries from one column to the next. Given
//! the XORs and adders a structural detector found in an and-inverter graph,
//! this crate puts the pieces back together into a canonical box: for every
//! column, the adders in it, the literals it consumes and the literals it
//! produces.
//!
//! Recovery runs in stages:
//! - [`find_roots`] picks the outputs of the XOR trees.
//! - [`rank_trees`] assigns every node to at most one tree.
//! - [`order_roots`] sorts the trees along the carry chain, least significant first.
//! - [`collect_leaves`] splits tree fanins into free leaves and adder boxes.
//! - [`AdderBox::build`] resolves carry polarity, checks the result against the
//!   circuit and emits leaf and root literals.
//!
//! [`produce_box`] runs the lot.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

use log::{debug, info};

mod adder_box;
mod aig;
mod config;
mod diagnostics;
mod error;
mod leaves;
mod literal;
mod order;
mod rank;
mod record;
pub mod traits;

pub use adder_box::{AdderBox, BoxPhase};
pub use aig::{Aig, AigNode};
pub use config::Config;
pub use diagnostics::{check_xors, verify_connections, ConnectionReport, XorCheckReport};
pub use error::{AcecError, Result};
pub use leaves::{collect_leaves, BoxLists, XorLeaves};
pub use literal::Literal;
pub use order::order_roots;
pub use rank::{find_roots, rank_trees, RankMap};
pub use record::{check_bounds, count_full_adders, parse_records, AdderRecord, XorRecord};
pub use traits::Circuit;

/// A circuit node index. Node 0 is the constant.
pub type NodeId = u32;

/// Recover the adder box of a circuit from its detected XORs and adders.
///
/// # Errors
/// Fails if a record names a node the circuit lacks, or if the records do not
/// describe a consistent adder tree.
pub fn produce_box<'a, C: Circuit + ?Sized>(
    circuit: &C,
    xors: &[XorRecord],
    adders: &'a [AdderRecord],
    config: &Config,
) -> Result<AdderBox<'a>> {
    let node_count = circuit.node_count();
    check_bounds(node_count, xors, adders)?;

    let roots = find_roots(xors);
    let ranks = rank_trees(node_count, xors, &roots)?;
    debug!("found {} XOR trees", roots.len());

    if config.verbose {
        let full = count_full_adders(adders);
        info!(
            "Detected {} full-adders and {} half-adders. Found {} XOR-cuts.",
            full,
            adders.len() - full,
            xors.len()
        );
    }

    if config.check_xors {
        let report = check_xors(circuit, xors);
        debug!(
            "XOR check: {} nodes with multiple cuts, {} unconfirmed",
            report.multi_cut.len(),
            report.unconfirmed.len()
        );
    }

    let roots = order_roots(adders, &ranks, &roots)?;
    debug!("XOR roots after reordering: {:?}", roots);

    let ranks = rank_trees(node_count, xors, &roots)?;
    let (leaves, boxes) = collect_leaves(xors, adders, &roots, &ranks)?;
    debug!("XOR leaves: {:?}", leaves);
    debug!("adder boxes: {:?}", boxes);

    if config.verify_connections {
        let report = verify_connections(adders, &boxes)?;
        debug!("{} box outputs feed more than one box input", report.fanouts.len());
    }

    let adder_box = AdderBox::build(circuit, adders, boxes, &leaves, &roots)?;

    if config.verbose {
        info!("{}", adder_box);
    }

    Ok(adder_box)
}
