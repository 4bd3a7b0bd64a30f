/// Knobs for [`produce_box`](crate::produce_box).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Log adder statistics and the finished box at `info`.
    pub verbose: bool,
    /// Cross-check 2-input XOR records against the circuit before ranking.
    pub check_xors: bool,
    /// Report how boxed adders feed one another before building the box.
    pub verify_connections: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            check_xors: false,
            verify_connections: true,
        }
    }
}
