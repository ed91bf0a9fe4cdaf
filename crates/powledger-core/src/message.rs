//! Request/response records exchanged between client and node.
//!
//! Every field is optional text so one flat record shape serves all
//! operations. Fields that do not apply are left out of the encoded line
//! entirely, which keeps "not applicable" distinct from an empty string.
//! A record encodes to exactly one line of JSON; string escaping keeps any
//! newline in a payload from splitting the frame.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Status,
    AddTransaction,
    Verify,
    View,
    Corrupt,
    Repair,
    Disconnect,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Status,
        Operation::AddTransaction,
        Operation::Verify,
        Operation::View,
        Operation::Corrupt,
        Operation::Repair,
        Operation::Disconnect,
    ];

    pub fn code(self) -> u8 {
        match self {
            Operation::Status => 0,
            Operation::AddTransaction => 1,
            Operation::Verify => 2,
            Operation::View => 3,
            Operation::Corrupt => 4,
            Operation::Repair => 5,
            Operation::Disconnect => 6,
        }
    }

    /// Whether the node reports wall-clock time for this operation.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Operation::AddTransaction | Operation::Verify | Operation::Repair
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Operation {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let code: u8 = s
            .trim()
            .parse()
            .map_err(|_| LedgerError::UnknownOperation(s.to_string()))?;
        Operation::ALL
            .into_iter()
            .find(|op| op.code() == code)
            .ok_or_else(|| LedgerError::UnknownOperation(s.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<String>,
}

impl Request {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation_code: Some(operation.to_string()),
            ..Self::default()
        }
    }

    pub fn add_transaction(difficulty: u32, data: impl Into<String>) -> Self {
        Self {
            difficulty: Some(difficulty.to_string()),
            data: Some(data.into()),
            ..Self::new(Operation::AddTransaction)
        }
    }

    pub fn corrupt(block_index: usize, data: impl Into<String>) -> Self {
        Self {
            block_index: Some(block_index.to_string()),
            data: Some(data.into()),
            ..Self::new(Operation::Corrupt)
        }
    }

    pub fn operation(&self) -> Result<Operation> {
        required("operation_code", &self.operation_code)?.parse()
    }

    pub fn difficulty(&self) -> Result<u32> {
        parse_field("difficulty", &self.difficulty)
    }

    pub fn block_index(&self) -> Result<usize> {
        parse_field("block_index", &self.block_index)
    }

    pub fn data(&self) -> Result<&str> {
        required("data", &self.data)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    /// Milliseconds spent on the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_chain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes_per_second: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expected_hashes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_hash: Option<String>,
    /// Set instead of the normal fields when the request was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    value.as_deref().ok_or(LedgerError::MissingField(field))
}

fn parse_field<T: FromStr>(field: &'static str, value: &Option<String>) -> Result<T> {
    let raw = required(field, value)?;
    raw.trim().parse().map_err(|_| LedgerError::InvalidField {
        field,
        value: raw.to_string(),
    })
}
