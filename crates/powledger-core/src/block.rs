use crate::constants::TIMESTAMP_FORMAT;
use crate::pow::{meets_difficulty, sha256_hex};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// A single ledger entry.
///
/// Fields are plain and public: changing `data` after mining leaves the old
/// nonce in place, which is exactly how a block gets corrupted. Only
/// [`Block::mine`] brings the hash back in line with the difficulty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Position in the chain; the genesis block is 0.
    pub index: u64,
    /// Creation instant, captured by the chain at millisecond precision.
    pub timestamp: DateTime<Utc>,
    /// Opaque transaction payload.
    pub data: String,
    /// Hex hash of the parent block, empty for genesis.
    pub previous_hash: String,
    /// Found by [`Block::mine`]; unbounded so any difficulty can be searched.
    pub nonce: BigUint,
    /// Number of leading hex zeros the hash must carry.
    pub difficulty: u32,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        data: impl Into<String>,
        difficulty: u32,
    ) -> Self {
        Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: String::new(),
            nonce: BigUint::default(),
            difficulty,
        }
    }

    /// Timestamp text used both for hashing and rendering.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The comma-joined field string that gets hashed.
    pub fn hash_input(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.index,
            self.timestamp_text(),
            self.data,
            self.previous_hash,
            self.nonce,
            self.difficulty
        )
    }

    /// Hex SHA-256 of the current field values. Pure.
    pub fn compute_hash(&self) -> String {
        sha256_hex(self.hash_input().as_bytes())
    }

    /// Whether the current fields hash to something that satisfies `difficulty`.
    pub fn meets_difficulty(&self) -> bool {
        meets_difficulty(&self.compute_hash(), self.difficulty)
    }

    /// Reset the nonce and count upwards until the hash has `difficulty`
    /// leading hex zeros. Returns the winning hash.
    ///
    /// Expected cost is `16^difficulty` hash evaluations and there is no
    /// upper bound on the search.
    pub fn mine(&mut self) -> String {
        self.nonce = BigUint::default();
        let mut hash = self.compute_hash();
        while !meets_difficulty(&hash, self.difficulty) {
            self.nonce += 1u32;
            hash = self.compute_hash();
        }
        debug!(
            index = self.index,
            nonce = %self.nonce,
            difficulty = self.difficulty,
            %hash,
            "mined block"
        );
        hash
    }

    pub(crate) fn view(&self) -> BlockView<'_> {
        BlockView {
            index: self.index,
            timestamp: self.timestamp_text(),
            data: &self.data,
            previous_hash: &self.previous_hash,
            nonce: self.nonce.to_string(),
            difficulty: self.difficulty,
        }
    }
}

/// Serializable rendering of a block. The nonce is text because it may not
/// fit any JSON number.
#[derive(Serialize)]
pub(crate) struct BlockView<'a> {
    index: u64,
    timestamp: String,
    data: &'a str,
    previous_hash: &'a str,
    nonce: String,
    difficulty: u32,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.view()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sha2::{Digest, Sha256};

    fn fixed_block(data: &str, difficulty: u32) -> Block {
        let ts = Utc.with_ymd_and_hms(2023, 10, 27, 14, 3, 12).unwrap();
        Block::new(1, ts, data, difficulty)
    }

    #[test]
    fn timestamp_text_has_millisecond_precision() {
        let block = fixed_block("x", 0);
        assert_eq!(block.timestamp_text(), "2023-10-27 14:03:12.000");
    }

    #[test]
    fn hash_input_joins_fields_with_commas() {
        let mut block = fixed_block("A pays B 10", 2);
        block.previous_hash = "00ab".to_string();
        block.nonce = BigUint::from(42u32);
        assert_eq!(
            block.hash_input(),
            "1,2023-10-27 14:03:12.000,A pays B 10,00ab,42,2"
        );
    }

    #[test]
    fn compute_hash_is_sha256_of_hash_input() {
        let block = fixed_block("A pays B 10", 2);
        let expected = hex::encode(Sha256::digest(block.hash_input().as_bytes()));
        assert_eq!(block.compute_hash(), expected);
        assert_eq!(block.compute_hash().len(), 64);
    }

    #[test]
    fn compute_hash_is_deterministic() {
        let block = fixed_block("payload", 1);
        assert_eq!(block.compute_hash(), block.compute_hash());
        assert_eq!(block.clone().compute_hash(), block.compute_hash());
    }

    #[test]
    fn mined_hash_meets_difficulty_and_reproduces() {
        for difficulty in 0..=3 {
            let mut block = fixed_block("mine me", difficulty);
            let hash = block.mine();
            assert!(hash.starts_with(&"0".repeat(difficulty as usize)));
            assert_eq!(block.compute_hash(), hash);
            assert!(block.meets_difficulty());
        }
    }

    #[test]
    fn mine_at_difficulty_zero_keeps_nonce_zero() {
        let mut block = fixed_block("free", 0);
        block.nonce = BigUint::from(99u32);
        block.mine();
        assert_eq!(block.nonce, BigUint::default());
    }

    #[test]
    fn changing_data_does_not_remine() {
        let mut block = fixed_block("original", 2);
        let hash = block.mine();
        let nonce = block.nonce.clone();
        block.data = "tampered".to_string();
        assert_eq!(block.nonce, nonce);
        assert_ne!(block.compute_hash(), hash);
    }

    #[test]
    fn display_is_single_line_json() {
        let mut block = fixed_block("say \"hi\", then leave", 0);
        block.nonce = BigUint::from(7u32);
        let text = block.to_string();
        assert!(!text.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["index"], 1);
        assert_eq!(value["data"], "say \"hi\", then leave");
        assert_eq!(value["nonce"], "7");
        assert_eq!(value["previous_hash"], "");
        assert_eq!(value["timestamp"], "2023-10-27 14:03:12.000");
    }
}
