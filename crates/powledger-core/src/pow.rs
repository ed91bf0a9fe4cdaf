use crate::constants::CALIBRATION_INPUT;
use sha2::{Digest, Sha256};
use std::hint::black_box;
use std::time::{Duration, Instant};
use tracing::info;

/// SHA-256 of `message`, hex encoded.
pub fn sha256_hex(message: &[u8]) -> String {
    hex::encode(Sha256::digest(message))
}

/// Count the leading `'0'` characters of a hex digest.
pub fn count_leading_hex_zeros(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// True when `hash` starts with at least `difficulty` hex zeros.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    count_leading_hex_zeros(hash) >= difficulty as usize
}

/// Expected number of trials needed to mine a block at `difficulty`.
pub fn expected_hashes(difficulty: u32) -> f64 {
    16f64.powi(difficulty as i32)
}

/// Hash a fixed input `rounds` times and report the achieved rate.
pub fn hashes_per_second(rounds: u64) -> u64 {
    let start = Instant::now();
    for _ in 0..rounds {
        black_box(Sha256::digest(black_box(CALIBRATION_INPUT)));
    }
    // a zero-length measurement would divide by zero on very small round counts
    let elapsed = start.elapsed().max(Duration::from_nanos(1));
    let rate = (rounds as f64 / elapsed.as_secs_f64()) as u64;
    info!(rounds, ?elapsed, rate, "calibrated hashing throughput");
    rate
}
