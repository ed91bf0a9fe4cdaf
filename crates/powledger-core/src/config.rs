use crate::constants::{CALIBRATION_ROUNDS, GENESIS_DATA, GENESIS_DIFFICULTY};

/// Settings used to seed a ledger when the process starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    pub genesis_data: String,
    pub genesis_difficulty: u32,
    /// Number of digests hashed once at startup to estimate local throughput.
    pub calibration_rounds: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_data: GENESIS_DATA.to_string(),
            genesis_difficulty: GENESIS_DIFFICULTY,
            calibration_rounds: CALIBRATION_ROUNDS,
        }
    }
}
