//! Byte encoding of storable forms.
//!
//! The store never looks inside stored bytes; it only hands them back to the
//! owning representation. Which codec writes them is a node-level choice.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{EntityError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    #[default]
    Json,
    /// MessagePack with named struct fields
    MessagePack,
}

impl Codec {
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            Codec::Json => serde_json::to_vec(value).map_err(EntityError::from),
            Codec::MessagePack => rmp_serde::to_vec_named(value)
                .map_err(|e| EntityError::Serialization(e.to_string())),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            Codec::Json => serde_json::from_slice(bytes).map_err(EntityError::from),
            Codec::MessagePack => rmp_serde::from_slice(bytes)
                .map_err(|e| EntityError::Serialization(e.to_string())),
        }
    }
}
