//! TCP front end for the ledger: one client at a time, one request at a time.

pub mod cli;
pub mod server;

pub use cli::NodeArgs;
pub use server::{Server, MAX_RECORD_BYTES};
