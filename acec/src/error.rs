use thiserror::Error;

use crate::NodeId;

/// The result of a box-recovery operation.
pub type Result<T> = std::result::Result<T, AcecError>;

/// Errors raised while recovering an adder tree.
///
/// Apart from the I/O and parsing variants, every variant means the XOR or
/// adder records handed to us do not describe a genuine adder tree. None of
/// them are recoverable.
#[derive(Debug, Error)]
pub enum AcecError {
    /// A record names a node the circuit does not have.
    #[error("node {node} is out of range for a circuit with {node_count} nodes")]
    NodeOutOfRange {
        /// Offending node.
        node: NodeId,
        /// Number of nodes in the circuit.
        node_count: usize,
    },

    /// A flat record sequence is not a whole number of records.
    #[error("{kind} records need groups of {width} entries, got {len}")]
    MisalignedRecords {
        /// Record kind, `xor` or `adder`.
        kind: &'static str,
        /// Entries per record.
        width: usize,
        /// Length of the flat sequence.
        len: usize,
    },

    /// No rank is fed by a lower rank while feeding a higher one.
    #[error("no adder chain connects the {roots} XOR trees")]
    NoChainHead {
        /// Number of XOR tree roots.
        roots: usize,
    },

    /// Per-column lists handed to the box builder disagree on the column count.
    #[error("column lists disagree: {boxes} box lists, {leaves} leaf lists, {roots} roots")]
    ColumnMismatch {
        /// Number of box lists.
        boxes: usize,
        /// Number of leaf lists.
        leaves: usize,
        /// Number of roots.
        roots: usize,
    },

    /// A box list names an adder record that does not exist.
    #[error("adder box {adder} is out of range for {adder_count} adder records")]
    AdderOutOfRange {
        /// Offending adder index.
        adder: usize,
        /// Number of adder records.
        adder_count: usize,
    },

    /// An XOR fanin that is itself a tree XOR sits in a different tree.
    #[error("XOR {xor} has rank {rank} but its XOR fanin {fanin} has rank {fanin_rank:?}")]
    RankMismatch {
        /// XOR output node.
        xor: NodeId,
        /// Rank of the XOR output.
        rank: usize,
        /// Fanin node.
        fanin: NodeId,
        /// Rank of the fanin.
        fanin_rank: Option<usize>,
    },

    /// Phase propagation never reached a box.
    #[error("adder box {adder} has no resolved phase")]
    UnresolvedPhase {
        /// Adder index.
        adder: usize,
    },

    /// The logic cone of a box output reaches past the box inputs.
    #[error("output {node} of adder box {adder} depends on logic outside its cut")]
    ConeEscapesCut {
        /// Adder index.
        adder: usize,
        /// Output node.
        node: NodeId,
    },

    /// A box output does not compute the function its phases claim.
    #[error("{output} output of adder box {adder} does not match its resolved phases")]
    BoxFunctionMismatch {
        /// Adder index.
        adder: usize,
        /// `sum` or `carry`.
        output: &'static str,
    },

    /// Two boxes disagree on the polarity of a wire between them.
    #[error("input {input} (node {node}) of adder box {adder} has phase {found} but its driver has phase {expected}")]
    PhaseMismatch {
        /// Consuming adder index.
        adder: usize,
        /// Input position, 0 to 2.
        input: usize,
        /// Wire node.
        node: NodeId,
        /// Phase of the driving output.
        expected: bool,
        /// Phase seen at the input.
        found: bool,
    },

    /// A record line could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The AIGER reader rejected its input.
    #[error("aiger: {0}")]
    Aiger(String),

    /// Latches are not part of a combinational adder tree.
    #[error("unsupported AIGER feature: {0}")]
    Unsupported(&'static str),

    /// Just forwarding an I/O error.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
