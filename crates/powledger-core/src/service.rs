use crate::chain::Chain;
use crate::config::LedgerConfig;
use crate::constants::MAX_DIFFICULTY;
use crate::error::{LedgerError, Result};
use crate::message::{Operation, Request, Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns the chain for the lifetime of the process and maps requests onto it.
///
/// One instance is shared by every connection in turn, so blocks added by one
/// client are visible to the next.
#[derive(Debug)]
pub struct LedgerService {
    chain: Chain,
}

impl LedgerService {
    /// Mine the genesis block and calibrate hashing throughput.
    pub fn new(config: &LedgerConfig) -> Self {
        let mut chain = Chain::with_genesis(config);
        chain.calibrate(config.calibration_rounds);
        Self::from_chain(chain)
    }

    pub fn from_chain(chain: Chain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Run one request. Rejected requests produce a response carrying only
    /// `error` and leave the chain untouched.
    pub fn handle(&mut self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, ?request, "rejected request");
                Response::rejected(e)
            }
        }
    }

    fn dispatch(&mut self, request: &Request) -> Result<Response> {
        let operation = request.operation()?;
        debug!(%operation, "dispatching");
        let started = Instant::now();
        let mut response = match operation {
            Operation::Status => self.status()?,
            Operation::AddTransaction => {
                let difficulty = request.difficulty()?;
                if difficulty > MAX_DIFFICULTY {
                    return Err(LedgerError::DifficultyTooHigh {
                        requested: difficulty,
                        max: MAX_DIFFICULTY,
                    });
                }
                let block = self.chain.next_block(request.data()?, difficulty);
                let block = self.chain.append(block);
                info!(index = block.index, difficulty, "block added");
                Response::default()
            }
            Operation::Verify => Response {
                verification_result: Some(self.chain.verify().to_string()),
                ..Response::default()
            },
            Operation::View => Response {
                rendered_chain: Some(self.chain.render()?),
                ..Response::default()
            },
            Operation::Corrupt => {
                let index = request.block_index()?;
                let data = request.data()?;
                self.chain.block_mut(index)?.data = data.to_string();
                info!(index, data, "block corrupted");
                Response::default()
            }
            Operation::Repair => {
                self.chain.repair();
                Response::default()
            }
            Operation::Disconnect => Response::default(),
        };
        if operation.is_timed() {
            response.elapsed_time = Some(started.elapsed().as_millis().to_string());
        }
        Ok(response)
    }

    fn status(&self) -> Result<Response> {
        let latest = self.chain.latest()?;
        Ok(Response {
            chain_size: Some(self.chain.size().to_string()),
            recent_difficulty: Some(latest.difficulty.to_string()),
            total_difficulty: Some(self.chain.total_difficulty().to_string()),
            hashes_per_second: Some(self.chain.hashes_per_second().to_string()),
            total_expected_hashes: Some(self.chain.total_expected_hashes().to_string()),
            nonce: Some(latest.nonce.to_string()),
            chain_hash: Some(self.chain.chain_hash().to_string()),
            ..Response::default()
        })
    }
}
