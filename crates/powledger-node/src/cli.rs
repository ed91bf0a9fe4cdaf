use clap::Parser;
use powledger_core::constants::{
    CALIBRATION_ROUNDS, DEFAULT_PORT, GENESIS_DATA, GENESIS_DIFFICULTY,
};
use powledger_core::LedgerConfig;
use std::net::SocketAddr;

#[derive(Parser, Debug, Clone)]
#[command(name = "powledger-node")]
#[command(about = "Serve a proof-of-work ledger over TCP")]
pub struct NodeArgs {
    /// Address to listen on, e.g. 127.0.0.1:6789
    #[arg(long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    pub listen: SocketAddr,

    /// Leading hex zeros required of the genesis block
    #[arg(long, default_value_t = GENESIS_DIFFICULTY)]
    pub genesis_difficulty: u32,

    /// Hashes computed at startup to estimate hashes per second
    #[arg(long, default_value_t = CALIBRATION_ROUNDS)]
    pub calibration_rounds: u64,
}

impl NodeArgs {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            genesis_data: GENESIS_DATA.to_string(),
            genesis_difficulty: self.genesis_difficulty,
            calibration_rounds: self.calibration_rounds,
        }
    }
}
