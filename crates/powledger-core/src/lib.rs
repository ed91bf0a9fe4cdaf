//! Proof-of-work hash chain with tamper and repair operations, plus the
//! line-oriented request/response records used to drive it remotely.

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod message;
pub mod pow;
pub mod service;

pub use block::Block;
pub use chain::{Chain, Verification};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use message::{Operation, Request, Response};
pub use service::LedgerService;
