//! XOR and adder records produced by the structural pattern detector.

use crate::{AcecError, NodeId, Result};

/// A detected 2- or 3-input XOR.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct XorRecord {
    /// XOR output node.
    pub output: NodeId,
    /// Fanins A, B and C. C is 0 for a 2-input XOR.
    pub fanins: [NodeId; 3],
}

impl XorRecord {
    const WIDTH: usize = 4;

    /// Record `output = a ^ b ^ c`.
    #[must_use]
    pub const fn new(output: NodeId, a: NodeId, b: NodeId, c: NodeId) -> Self {
        Self { output, fanins: [a, b, c] }
    }

    /// Returns true if fanin C is absent.
    #[must_use]
    pub const fn is_two_input(&self) -> bool {
        self.fanins[2] == 0
    }

    /// Decode a flat `output, A, B, C` sequence.
    ///
    /// # Errors
    /// Returns [`AcecError::MisalignedRecords`] if `flat` is not a whole number of records.
    pub fn from_flat(flat: &[NodeId]) -> Result<Vec<Self>> {
        if flat.len() % Self::WIDTH != 0 {
            return Err(AcecError::MisalignedRecords { kind: "xor", width: Self::WIDTH, len: flat.len() });
        }

        Ok(flat
            .chunks_exact(Self::WIDTH)
            .map(|chunk| Self::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect())
    }

    /// The nonzero fanins, skipping the half-adder marker.
    pub fn inputs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.fanins.iter().copied().filter(|&fanin| fanin != 0)
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.output).chain(self.fanins.iter().copied())
    }
}

/// A detected full or half adder.
///
/// The sign bits in `flags` describe the detected functions: bit `k` for
/// `k < 3` is the polarity of input `k` to the majority, and bit 3 is the
/// polarity of the sum, so that
/// `carry = MAJ(in0 ^ s0, in1 ^ s1, in2 ^ s2)` and `sum = in0 ^ in1 ^ in2 ^ s3`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct AdderRecord {
    /// Inputs. Input 2 is 0 for a half adder.
    pub fanins: [NodeId; 3],
    /// Sum (XOR) output.
    pub sum: NodeId,
    /// Carry (majority) output.
    pub carry: NodeId,
    /// Detector sign bits.
    pub flags: u32,
}

impl AdderRecord {
    const WIDTH: usize = 6;

    /// Record an adder cell.
    #[must_use]
    pub const fn new(fanins: [NodeId; 3], sum: NodeId, carry: NodeId, flags: u32) -> Self {
        Self { fanins, sum, carry, flags }
    }

    /// Returns true if there is no carry-in.
    #[must_use]
    pub const fn is_half_adder(&self) -> bool {
        self.fanins[2] == 0
    }

    /// Detector sign bit `bit`.
    #[must_use]
    pub const fn sign(&self, bit: usize) -> bool {
        (self.flags >> bit) & 1 == 1
    }

    /// Decode a flat `in0, in1, in2, sum, carry, flags` sequence.
    ///
    /// # Errors
    /// Returns [`AcecError::MisalignedRecords`] if `flat` is not a whole number of records.
    pub fn from_flat(flat: &[NodeId]) -> Result<Vec<Self>> {
        if flat.len() % Self::WIDTH != 0 {
            return Err(AcecError::MisalignedRecords { kind: "adder", width: Self::WIDTH, len: flat.len() });
        }

        Ok(flat
            .chunks_exact(Self::WIDTH)
            .map(|chunk| Self::new([chunk[0], chunk[1], chunk[2]], chunk[3], chunk[4], chunk[5]))
            .collect())
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.fanins.iter().copied().chain([self.sum, self.carry])
    }
}

/// Count full adders in a record list.
#[must_use]
pub fn count_full_adders(adders: &[AdderRecord]) -> usize {
    adders.iter().filter(|adder| !adder.is_half_adder()).count()
}

/// Check that every node a record names exists in a circuit of `node_count` nodes.
///
/// # Errors
/// Returns [`AcecError::NodeOutOfRange`] for the first node that does not.
pub fn check_bounds(node_count: usize, xors: &[XorRecord], adders: &[AdderRecord]) -> Result<()> {
    let out_of_range = xors
        .iter()
        .flat_map(XorRecord::nodes)
        .chain(adders.iter().flat_map(AdderRecord::nodes))
        .find(|&node| node as usize >= node_count);

    match out_of_range {
        Some(node) => Err(AcecError::NodeOutOfRange { node, node_count }),
        None => Ok(()),
    }
}

/// Parse the line-oriented record format.
///
/// Each line is `xor OUT A B C` or `add IN0 IN1 IN2 SUM CARRY FLAGS`. Anything
/// after a `#` is a comment, and blank lines are ignored.
///
/// # Errors
/// Returns [`AcecError::Parse`] naming the first bad line.
pub fn parse_records(text: &str) -> Result<(Vec<XorRecord>, Vec<AdderRecord>)> {
    let mut xors = Vec::new();
    let mut adders = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_number = number + 1;
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let mut words = line.split_whitespace();
        let kind = words.next().unwrap_or_default();
        let fields = words
            .map(|word| {
                word.parse::<u32>().map_err(|_| AcecError::Parse {
                    line: line_number,
                    message: format!("`{}` is not a node index", word),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let expected = match kind {
            "xor" => XorRecord::WIDTH,
            "add" => AdderRecord::WIDTH,
            _ => {
                return Err(AcecError::Parse { line: line_number, message: format!("unknown record kind `{}`", kind) });
            }
        };

        if fields.len() != expected {
            return Err(AcecError::Parse {
                line: line_number,
                message: format!("`{}` record needs {} fields, got {}", kind, expected, fields.len()),
            });
        }

        if kind == "xor" {
            xors.extend(XorRecord::from_flat(&fields)?);
        } else {
            adders.extend(AdderRecord::from_flat(&fields)?);
        }
    }

    Ok((xors, adders))
}
