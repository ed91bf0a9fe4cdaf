use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block index {index} is out of range for a chain of {size} blocks")]
    BlockIndexOutOfRange { index: usize, size: usize },

    #[error("the chain has no blocks")]
    EmptyChain,

    #[error("unknown operation code {0:?}")]
    UnknownOperation(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value {value:?} for field `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("difficulty {requested} exceeds the maximum of {max}")]
    DifficultyTooHigh { requested: u32, max: u32 },

    #[error("malformed wire record: {0}")]
    Codec(#[from] serde_json::Error),
}
