//! Typed responses returned to the ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::codes::ResultCode;
use crate::error::RouterError;

/// Result of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TransactionResponse {
    #[cfg_attr(feature = "typescript", ts(type = "number"))]
    pub code: ResultCode,
    pub log: String,
    pub gas_used: i64,
    /// Path to normalized JSON of every entity the transaction touched
    pub tags: BTreeMap<String, Vec<u8>>,
}

impl TransactionResponse {
    pub fn success(log: impl Into<String>, gas_used: i64, tags: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            code: ResultCode::Successful,
            log: log.into(),
            gas_used,
            tags,
        }
    }

    pub fn failure(code: ResultCode, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
            gas_used: 0,
            tags: BTreeMap::new(),
        }
    }
}

impl From<RouterError> for TransactionResponse {
    fn from(err: RouterError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Result of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct QueryResponse {
    #[cfg_attr(feature = "typescript", ts(type = "number"))]
    pub code: ResultCode,
    pub log: String,
    /// Path that was queried
    pub key: String,
    /// Normalized JSON of the result
    pub value: Vec<u8>,
}

impl QueryResponse {
    pub fn success(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            code: ResultCode::Successful,
            log: "success".to_string(),
            key: key.into(),
            value,
        }
    }

    pub fn failure(code: ResultCode, key: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            code,
            log: log.into(),
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// Decode `value` as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.value)
    }
}
