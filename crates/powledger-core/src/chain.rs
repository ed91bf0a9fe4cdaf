use crate::block::{Block, BlockView};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::pow::{self, meets_difficulty};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Outcome of [`Chain::verify`]. Every failure names the block it was found at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    Valid,
    /// The block's recomputed hash lacks the leading zeros its difficulty demands.
    ImproperHash { index: usize, difficulty: u32 },
    /// The block's `previous_hash` does not match its parent's recomputed hash.
    PreviousHashMismatch { index: usize },
    /// The stored chain hash does not match the tip's recomputed hash.
    ChainHashMismatch { index: usize },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }

    /// Index of the block the failure was detected at.
    pub fn failed_block(&self) -> Option<usize> {
        match self {
            Verification::Valid => None,
            Verification::ImproperHash { index, .. }
            | Verification::PreviousHashMismatch { index }
            | Verification::ChainHashMismatch { index } => Some(*index),
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Valid => write!(f, "TRUE"),
            Verification::ImproperHash { index, difficulty } => write!(
                f,
                "FALSE\nImproper hash on node {index} does not begin with {}",
                "0".repeat(*difficulty as usize)
            ),
            Verification::PreviousHashMismatch { index } => {
                write!(f, "FALSE\nBlock {index} previous hash error.")
            }
            Verification::ChainHashMismatch { index } => {
                write!(f, "FALSE\nChain hash error on node {index}.")
            }
        }
    }
}

/// In-memory hash chain.
///
/// Linkage and proof-of-work are not enforced structurally: a block's data can
/// be overwritten through [`Chain::block_mut`], and [`Chain::verify`] re-derives
/// validity from scratch each time it is called.
#[derive(Clone, Debug, Default)]
pub struct Chain {
    blocks: Vec<Block>,
    chain_hash: String,
    hashes_per_second: u64,
}

#[derive(Serialize)]
struct ChainView<'a> {
    blocks: Vec<BlockView<'a>>,
    chain_hash: &'a str,
}

impl Chain {
    /// An empty chain with an empty chain hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain seeded with a mined genesis block.
    pub fn with_genesis(config: &LedgerConfig) -> Self {
        let mut chain = Self::new();
        let genesis = chain.next_block(config.genesis_data.clone(), config.genesis_difficulty);
        chain.append(genesis);
        info!(hash = %chain.chain_hash, "genesis block mined");
        chain
    }

    /// Current instant truncated to the millisecond, so that the rendered
    /// timestamp and the hashed timestamp are the same text.
    pub fn time() -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    /// A fresh block positioned after the current tip, stamped with the current time.
    pub fn next_block(&self, data: impl Into<String>, difficulty: u32) -> Block {
        Block::new(self.blocks.len() as u64, Self::time(), data, difficulty)
    }

    /// Link `block` to the tip, mine it, and make it the new tip.
    pub fn append(&mut self, mut block: Block) -> &Block {
        block.previous_hash = self.chain_hash.clone();
        self.chain_hash = block.mine();
        self.blocks.push(block);
        &self.blocks[self.blocks.len() - 1]
    }

    /// Measure local hashing throughput once and remember it.
    pub fn calibrate(&mut self, rounds: u64) -> u64 {
        self.hashes_per_second = pow::hashes_per_second(rounds);
        self.hashes_per_second
    }

    pub fn hashes_per_second(&self) -> u64 {
        self.hashes_per_second
    }

    pub fn chain_hash(&self) -> &str {
        &self.chain_hash
    }

    pub fn latest(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Result<&Block> {
        let size = self.blocks.len();
        self.blocks
            .get(index)
            .ok_or(LedgerError::BlockIndexOutOfRange { index, size })
    }

    /// Mutable access for tampering. Nothing is re-mined.
    pub fn block_mut(&mut self, index: usize) -> Result<&mut Block> {
        let size = self.blocks.len();
        self.blocks
            .get_mut(index)
            .ok_or(LedgerError::BlockIndexOutOfRange { index, size })
    }

    pub fn total_difficulty(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.difficulty)).sum()
    }

    /// Theoretical work to build the chain: the sum of `16^difficulty`.
    pub fn total_expected_hashes(&self) -> f64 {
        self.blocks
            .iter()
            .map(|b| pow::expected_hashes(b.difficulty))
            .sum()
    }

    /// Check proof-of-work, linkage and the chain hash, stopping at the first failure.
    pub fn verify(&self) -> Verification {
        let Some(genesis) = self.blocks.first() else {
            return if self.chain_hash.is_empty() {
                Verification::Valid
            } else {
                Verification::ChainHashMismatch { index: 0 }
            };
        };

        let genesis_hash = genesis.compute_hash();
        if !meets_difficulty(&genesis_hash, genesis.difficulty) {
            return Verification::ImproperHash {
                index: 0,
                difficulty: genesis.difficulty,
            };
        }

        // a lone genesis block only has its own proof-of-work and the chain hash to check
        if self.blocks.len() == 1 {
            return if self.chain_hash == genesis_hash {
                Verification::Valid
            } else {
                Verification::ChainHashMismatch { index: 0 }
            };
        }

        let mut parent_hash = genesis_hash;
        for (index, block) in self.blocks.iter().enumerate().skip(1) {
            if block.previous_hash != parent_hash {
                return Verification::PreviousHashMismatch { index };
            }
            let hash = block.compute_hash();
            if !meets_difficulty(&hash, block.difficulty) {
                return Verification::ImproperHash {
                    index,
                    difficulty: block.difficulty,
                };
            }
            parent_hash = hash;
        }

        if self.chain_hash != parent_hash {
            return Verification::ChainHashMismatch {
                index: self.blocks.len() - 1,
            };
        }
        Verification::Valid
    }

    /// Relink and re-mine every block from genesis onwards, then reset the chain hash.
    pub fn repair(&mut self) {
        let mut hash = String::new();
        for block in &mut self.blocks {
            block.previous_hash = hash;
            hash = block.mine();
        }
        self.chain_hash = hash;
        info!(blocks = self.blocks.len(), chain_hash = %self.chain_hash, "chain repaired");
    }

    /// Single-line JSON with every block and the chain hash, serialized in one pass.
    pub fn render(&self) -> Result<String> {
        let view = ChainView {
            blocks: self.blocks.iter().map(Block::view).collect(),
            chain_hash: &self.chain_hash,
        };
        Ok(serde_json::to_string(&view)?)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(difficulty: u32) -> LedgerConfig {
        LedgerConfig {
            genesis_difficulty: difficulty,
            calibration_rounds: 0,
            ..LedgerConfig::default()
        }
    }

    fn chain_of(len: usize, difficulty: u32) -> Chain {
        let mut chain = Chain::with_genesis(&config(difficulty));
        for i in 1..len {
            let block = chain.next_block(format!("tx {i}"), difficulty);
            chain.append(block);
        }
        chain
    }

    /// Overwrite a block's data with a value that breaks its proof-of-work.
    fn corrupt(chain: &mut Chain, index: usize) {
        let block = chain.block_mut(index).unwrap();
        for attempt in 0u32.. {
            block.data = format!("tampered {attempt}");
            if !block.meets_difficulty() {
                return;
            }
        }
    }

    #[test]
    fn new_chain_is_empty_and_valid() {
        let chain = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.chain_hash(), "");
        assert!(matches!(chain.latest(), Err(LedgerError::EmptyChain)));
        assert_eq!(chain.verify(), Verification::Valid);
    }

    #[test]
    fn genesis_defaults() {
        let chain = Chain::with_genesis(&LedgerConfig {
            calibration_rounds: 0,
            ..LedgerConfig::default()
        });
        let genesis = chain.latest().unwrap();
        assert_eq!(chain.size(), 1);
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.data, "Genesis");
        assert_eq!(genesis.difficulty, 2);
        assert_eq!(genesis.previous_hash, "");
        assert_eq!(chain.chain_hash(), genesis.compute_hash());
        assert!(chain.chain_hash().starts_with("00"));
    }

    #[test]
    fn append_links_and_grows_by_one() {
        let mut chain = chain_of(1, 1);
        for i in 1..5 {
            let before = chain.size();
            let tip = chain.chain_hash().to_string();
            let block = chain.next_block(format!("tx {i}"), 1);
            let appended = chain.append(block);
            assert_eq!(appended.previous_hash, tip);
            assert_eq!(appended.index, i as u64);
            assert_eq!(chain.size(), before + 1);
            assert_eq!(chain.chain_hash(), chain.latest().unwrap().compute_hash());
        }
    }

    #[test]
    fn fresh_chains_verify() {
        for len in 1..=5 {
            assert_eq!(chain_of(len, 2).verify(), Verification::Valid);
        }
    }

    #[test]
    fn totals_sum_over_blocks() {
        let mut chain = chain_of(1, 2);
        let block = chain.next_block("a", 1);
        chain.append(block);
        let block = chain.next_block("b", 3);
        chain.append(block);
        assert_eq!(chain.total_difficulty(), 6);
        assert_eq!(chain.total_expected_hashes(), 256.0 + 16.0 + 4096.0);
    }

    #[test]
    fn corrupt_lone_genesis_reports_block_zero() {
        let mut chain = chain_of(1, 2);
        corrupt(&mut chain, 0);
        assert_eq!(
            chain.verify(),
            Verification::ImproperHash {
                index: 0,
                difficulty: 2
            }
        );
    }

    #[test]
    fn lone_genesis_with_stale_chain_hash() {
        // data changed but proof-of-work still holds: only the chain hash can catch it
        let mut chain = chain_of(1, 0);
        chain.block_mut(0).unwrap().data = "tampered".into();
        assert_eq!(
            chain.verify(),
            Verification::ChainHashMismatch { index: 0 }
        );
    }

    #[test]
    fn corrupt_genesis_in_longer_chain() {
        let mut chain = chain_of(3, 2);
        corrupt(&mut chain, 0);
        assert_eq!(chain.verify().failed_block(), Some(0));
    }

    #[test]
    fn corrupt_middle_block_is_attributed_to_it() {
        let mut chain = chain_of(5, 2);
        corrupt(&mut chain, 2);
        let result = chain.verify();
        assert_eq!(
            result,
            Verification::ImproperHash {
                index: 2,
                difficulty: 2
            }
        );
        assert!(!result.is_valid());
    }

    #[test]
    fn broken_linkage_is_reported() {
        let mut chain = chain_of(3, 1);
        chain.block_mut(2).unwrap().previous_hash = "f00d".into();
        assert_eq!(
            chain.verify(),
            Verification::PreviousHashMismatch { index: 2 }
        );
    }

    #[test]
    fn corrupt_tip_with_valid_pow_is_a_chain_hash_error() {
        let mut chain = chain_of(3, 0);
        chain.block_mut(2).unwrap().data = "tampered".into();
        assert_eq!(
            chain.verify(),
            Verification::ChainHashMismatch { index: 2 }
        );
    }

    #[test]
    fn repair_restores_validity() {
        let mut chain = chain_of(4, 2);
        corrupt(&mut chain, 1);
        corrupt(&mut chain, 3);
        assert!(!chain.verify().is_valid());
        chain.repair();
        assert_eq!(chain.verify(), Verification::Valid);
        assert_eq!(chain.chain_hash(), chain.latest().unwrap().compute_hash());
        // repair re-mines but keeps the tampered payload
        assert!(chain.block(1).unwrap().data.starts_with("tampered"));
    }

    #[test]
    fn repair_on_valid_chain_stays_valid() {
        let mut chain = chain_of(3, 1);
        chain.repair();
        assert!(chain.verify().is_valid());
        assert_eq!(chain.block(0).unwrap().previous_hash, "");
    }

    #[test]
    fn repair_on_empty_chain_clears_hash() {
        let mut chain = Chain::new();
        chain.repair();
        assert_eq!(chain.chain_hash(), "");
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let mut chain = chain_of(2, 0);
        assert!(matches!(
            chain.block_mut(2),
            Err(LedgerError::BlockIndexOutOfRange { index: 2, size: 2 })
        ));
        assert!(chain.block(7).is_err());
    }

    #[test]
    fn render_is_flat_json() {
        let mut chain = chain_of(2, 1);
        chain.block_mut(1).unwrap().data = "A pays B 10".into();
        let text = chain.render().unwrap();
        assert!(!text.contains('\\'));
        assert!(!text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(value["blocks"][1]["data"], "A pays B 10");
        assert_eq!(value["chain_hash"], chain.chain_hash());
        assert_eq!(chain.to_string(), text);
    }

    #[test]
    fn verification_messages() {
        assert_eq!(Verification::Valid.to_string(), "TRUE");
        assert_eq!(
            Verification::ImproperHash {
                index: 3,
                difficulty: 2
            }
            .to_string(),
            "FALSE\nImproper hash on node 3 does not begin with 00"
        );
        assert_eq!(
            Verification::PreviousHashMismatch { index: 1 }.to_string(),
            "FALSE\nBlock 1 previous hash error."
        );
        assert_eq!(
            Verification::ChainHashMismatch { index: 0 }.to_string(),
            "FALSE\nChain hash error on node 0."
        );
    }
}
