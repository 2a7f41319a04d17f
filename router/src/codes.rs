//! Result codes carried by every response.

use serde::{Deserialize, Serialize};

/// Outcome of a transaction or query, serialised as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum ResultCode {
    Successful = 0,
    NotFound = 1,
    ServerError = 2,
    Unauthorized = 3,
    Unauthenticated = 4,
    RouteNotFound = 5,
    InvalidRoute = 6,
    InvalidRequest = 7,
}

impl ResultCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Successful)
    }
}

impl From<ResultCode> for u32 {
    fn from(code: ResultCode) -> Self {
        code as u32
    }
}

impl TryFrom<u32> for ResultCode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ResultCode::Successful,
            1 => ResultCode::NotFound,
            2 => ResultCode::ServerError,
            3 => ResultCode::Unauthorized,
            4 => ResultCode::Unauthenticated,
            5 => ResultCode::RouteNotFound,
            6 => ResultCode::InvalidRoute,
            7 => ResultCode::InvalidRequest,
            other => return Err(format!("unknown result code {}", other)),
        })
    }
}
