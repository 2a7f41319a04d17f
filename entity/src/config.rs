//! Store configuration

use serde::{Deserialize, Serialize};

use crate::codec::Codec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Encoding of stored records
    #[serde(default)]
    pub codec: Codec,

    /// Page size used when a query does not ask for one
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
}

fn default_page_size() -> i64 {
    20
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            codec: Codec::default(),
            default_page_size: default_page_size(),
        }
    }
}
