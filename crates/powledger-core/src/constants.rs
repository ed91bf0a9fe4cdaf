pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// A difficulty above this can never be met by a hex SHA-256 digest.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_PORT: u16 = 6789;
pub const GENESIS_DATA: &str = "Genesis";
pub const GENESIS_DIFFICULTY: u32 = 2;
pub const CALIBRATION_ROUNDS: u64 = 2_000_000;
pub const CALIBRATION_INPUT: &[u8] = b"00000000";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
