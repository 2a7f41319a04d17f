//! Node configuration
//!
//! ```yaml
//! store:
//!   codec: message_pack
//!   default_page_size: 20
//! governance:
//!   threshold: { type: share_ratio, percent: 50 }
//! router:
//!   role_key: stakeholders
//!   trusted_role_key: administrators
//!   gas_price_per_kb: 1
//! genesis:
//!   stakeholders:
//!     - { name: alice, public_key: "…", shares: 60 }
//!   roles:
//!     - { key: stakeholders, members: [alice], write_patterns: ["/requests.*"] }
//! ```

use std::path::Path;

use entity::StoreConfig;
use governance::GovernanceConfig;
use serde::{Deserialize, Serialize};

use crate::genesis::Genesis;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub governance: GovernanceConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub genesis: Genesis,
}

impl NodeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Load config from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = self
            .to_yaml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Role governance writes (proposals, votes) are authorized against
    #[serde(default = "default_role_key")]
    pub role_key: String,

    /// Role allowed to write entities directly, bypassing votes
    #[serde(default = "default_trusted_role_key")]
    pub trusted_role_key: String,

    /// Gas charged per started kilobyte of response data
    #[serde(default = "default_gas_price")]
    pub gas_price_per_kb: i64,
}

fn default_role_key() -> String {
    "stakeholders".to_string()
}

fn default_trusted_role_key() -> String {
    "administrators".to_string()
}

fn default_gas_price() -> i64 {
    1
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            role_key: default_role_key(),
            trusted_role_key: default_trusted_role_key(),
            gas_price_per_kb: default_gas_price(),
        }
    }
}
