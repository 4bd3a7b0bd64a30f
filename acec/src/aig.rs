//! AND-inverter graphs stored in petgraph.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use petgraph::{prelude::*, visit::EdgeRef};

use crate::{AcecError, Circuit, Literal, NodeId, Result};

/// What an AIG node is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AigNode {
    /// The constant false node.
    Zero,
    /// Primary input, with its position.
    Input(u32),
    /// Two-input AND gate.
    And,
}

/// An and-inverter graph.
///
/// Node indices are AIGER variable indices, with the constant at 0. Edges run
/// from fanin to gate and carry the inversion of the fanin.
#[derive(Debug)]
pub struct Aig {
    graph: StableGraph<AigNode, bool, Directed>,
    symbol_table: HashMap<u32, String>,
    inputs: Vec<NodeIndex>,
    outputs: Vec<Literal>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create an AIG holding only the constant node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableGraph::new();
        let zero = graph.add_node(AigNode::Zero);
        debug_assert_eq!(zero.index(), 0);

        Self {
            graph,
            symbol_table: HashMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Load an AIGER file.
    ///
    /// # Errors
    /// Fails if the file cannot be opened, does not parse, or has latches.
    pub fn from_aiger<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load AIGER data from a reader.
    ///
    /// # Errors
    /// Fails if the data does not parse or has latches.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = aiger::Reader::from_reader(reader).map_err(|err| AcecError::Aiger(format!("{:?}", err)))?;
        let max_variable = reader.header().m;
        let mut aig = Self::new();

        // Pre-emptively mark every variable as an AND gate - most will be,
        // and inputs get overwritten while we parse.
        for variable in 1..=max_variable {
            let node_index = aig.graph.add_node(AigNode::And);
            debug_assert_eq!(node_index.index(), variable);
        }

        for record in reader.records() {
            match record.map_err(|err| AcecError::Aiger(format!("{:?}", err)))? {
                aiger::Aiger::Input(l) => {
                    let position = u32::try_from(aig.inputs.len()).map_err(|_| AcecError::Unsupported("more than 2^32 inputs"))?;
                    let node = NodeIndex::new(l.variable());
                    aig.graph[node] = AigNode::Input(position);
                    aig.inputs.push(node);
                },
                aiger::Aiger::Latch { output: _, input: _ } => {
                    return Err(AcecError::Unsupported("latches"));
                },
                aiger::Aiger::Output(l) => {
                    aig.outputs.push(Self::literal(l)?);
                },
                aiger::Aiger::AndGate { output, inputs } => {
                    let gate = NodeIndex::new(output.variable());

                    for input in &inputs {
                        aig.graph.add_edge(NodeIndex::new(input.variable()), gate, input.is_inverted());
                    }
                },
                aiger::Aiger::Symbol { type_spec, position, symbol } => {
                    if let aiger::Symbol::Input = type_spec {
                        if let Some(node) = aig.inputs.get(position) {
                            let index = u32::try_from(node.index()).map_err(|_| AcecError::Unsupported("node index past 2^32"))?;
                            aig.symbol_table.insert(index, symbol);
                        }
                    }
                },
            }
        }

        Ok(aig)
    }

    fn literal(l: aiger::Literal) -> Result<Literal> {
        let node = u32::try_from(l.variable()).map_err(|_| AcecError::Unsupported("node index past 2^32"))?;
        Ok(Literal::new(node, l.is_inverted()))
    }

    // Node indices come from our own graph, which never exceeds u32.
    #[allow(clippy::cast_possible_truncation)]
    fn index_literal(node: NodeIndex, inverted: bool) -> Literal {
        Literal::new(node.index() as NodeId, inverted)
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &StableGraph<AigNode, bool> {
        &self.graph
    }

    /// Primary output literals, in file order.
    #[must_use]
    pub fn outputs(&self) -> &[Literal] {
        &self.outputs
    }

    /// Primary input literals, in file order.
    pub fn inputs(&self) -> impl Iterator<Item = Literal> + '_ {
        self.inputs.iter().map(|node| Self::index_literal(*node, false))
    }

    /// Returns the symbol of an input node, if the file named it.
    #[must_use]
    pub fn symbol(&self, node: NodeId) -> Option<&String> {
        self.symbol_table.get(&node)
    }

    /// Append a primary input.
    pub fn add_input(&mut self) -> Literal {
        // Input positions are bounded by node indices, which fit in a literal.
        #[allow(clippy::cast_possible_truncation)]
        let position = self.inputs.len() as u32;
        let node = self.graph.add_node(AigNode::Input(position));
        self.inputs.push(node);
        Self::index_literal(node, false)
    }

    /// Append `x & y`.
    pub fn add_and(&mut self, x: Literal, y: Literal) -> Literal {
        let gate = self.graph.add_node(AigNode::And);
        self.graph.add_edge(NodeIndex::new(x.node() as usize), gate, x.is_inverted());
        self.graph.add_edge(NodeIndex::new(y.node() as usize), gate, y.is_inverted());
        Self::index_literal(gate, false)
    }

    /// Append `x | y`. The result is an inverted literal.
    pub fn add_or(&mut self, x: Literal, y: Literal) -> Literal {
        !self.add_and(!x, !y)
    }

    /// Append `x ^ y` as `!(x & y) & !(!x & !y)`.
    pub fn add_xor(&mut self, x: Literal, y: Literal) -> Literal {
        let both = self.add_and(x, y);
        let neither = self.add_and(!x, !y);
        self.add_and(!both, !neither)
    }

    /// Append `MAJ(x, y, z)` as `(x | y) & (y | z) & (x | z)`, so the result is a positive literal.
    pub fn add_maj(&mut self, x: Literal, y: Literal, z: Literal) -> Literal {
        let xy = self.add_or(x, y);
        let yz = self.add_or(y, z);
        let xz = self.add_or(x, z);
        let left = self.add_and(xy, yz);
        self.add_and(left, xz)
    }

    /// Mark a literal as a primary output.
    pub fn add_output(&mut self, output: Literal) {
        self.outputs.push(output);
    }
}

impl Circuit for Aig {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn and_fanins(&self, node: NodeId) -> Option<[Literal; 2]> {
        let index = NodeIndex::new(node as usize);
        match self.graph.node_weight(index)? {
            AigNode::Zero | AigNode::Input(_) => None,
            AigNode::And => {
                let mut iter = self.graph.edges_directed(index, Incoming);
                match (iter.next(), iter.next(), iter.next()) {
                    // Incoming edges are listed newest first.
                    (Some(y), Some(x), None) => Some([
                        Self::index_literal(x.source(), *x.weight()),
                        Self::index_literal(y.source(), *y.weight()),
                    ]),
                    (_, _, _) => None,
                }
            },
        }
    }
}
