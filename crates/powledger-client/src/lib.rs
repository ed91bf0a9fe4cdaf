//! Menu-driven client. The same menu runs against a remote node or an
//! in-process ledger.

pub mod cli;
pub mod menu;
pub mod transport;

pub use cli::ClientArgs;
pub use transport::{LocalTransport, TcpTransport, Transport};
