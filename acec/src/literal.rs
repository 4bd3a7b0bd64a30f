use std::fmt;

use crate::NodeId;

/// A reference to a circuit node, possibly inverted.
///
/// The least significant bit signifies inversion state, so the derived ordering
/// sorts by node first and polarity second.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Literal(u32);

impl Literal {
    /// Constant false.
    pub const FALSE: Self = Self(0);
    /// Constant true.
    pub const TRUE: Self = Self(1);

    /// Reference `node`, inverted if `inverted` is set.
    #[must_use]
    pub const fn new(node: NodeId, inverted: bool) -> Self {
        debug_assert!(node < 1 << 31, "node index does not fit in a literal");
        Self((node << 1) | inverted as u32)
    }

    /// Reference `node` without inversion.
    #[must_use]
    pub const fn positive(node: NodeId) -> Self {
        Self::new(node, false)
    }

    /// The referenced node.
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.0 >> 1
    }

    /// Returns true if this literal is inverted.
    #[must_use]
    pub const fn is_inverted(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns this literal with its polarity flipped when `phase` is set.
    #[must_use]
    pub const fn xor_phase(self, phase: bool) -> Self {
        Self(self.0 ^ phase as u32)
    }

    /// Key for ordering by polarity first, as root literal lists are.
    #[must_use]
    pub const fn polarity_key(self) -> (bool, NodeId) {
        (self.is_inverted(), self.node())
    }
}

impl std::ops::Not for Literal {
    type Output = Self;

    fn not(self) -> Self {
        Self(self.0 ^ 1)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inverted() {
            write!(f, "!{}", self.node())
        } else {
            write!(f, "{}", self.node())
        }
    }
}
