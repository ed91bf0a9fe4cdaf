use clap::Parser;
use powledger_core::constants::{
    CALIBRATION_ROUNDS, DEFAULT_PORT, GENESIS_DATA, GENESIS_DIFFICULTY,
};
use powledger_core::LedgerConfig;
use std::net::SocketAddr;

#[derive(Parser, Debug, Clone)]
#[command(name = "powledger-client")]
#[command(about = "Interactive menu for a proof-of-work ledger node")]
pub struct ClientArgs {
    /// Node to connect to
    #[arg(long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    pub server: SocketAddr,

    /// Keep the ledger in this process instead of talking to a node
    #[arg(long)]
    pub local: bool,

    /// Genesis difficulty for --local
    #[arg(long, default_value_t = GENESIS_DIFFICULTY, requires = "local")]
    pub genesis_difficulty: u32,

    /// Calibration rounds for --local
    #[arg(long, default_value_t = CALIBRATION_ROUNDS, requires = "local")]
    pub calibration_rounds: u64,
}

impl ClientArgs {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            genesis_data: GENESIS_DATA.to_string(),
            genesis_difficulty: self.genesis_difficulty,
            calibration_rounds: self.calibration_rounds,
        }
    }
}
