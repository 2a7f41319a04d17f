//! Governance configuration

use entity::{Model, Repository, Result, UNBOUNDED};
use serde::{Deserialize, Serialize};

use crate::user::User;

/// How a request's approval threshold is fixed at proposal time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// A constant amount of voting power
    Fixed { power: u64 },
    /// A percentage of all stakeholder shares, rounded up
    ShareRatio { percent: u8 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::ShareRatio { percent: 50 }
    }
}

impl ThresholdPolicy {
    /// Evaluate against the current stakeholders. Never below 1.
    pub fn threshold(&self, repository: &Repository<'_>) -> Result<u64> {
        let threshold = match self {
            ThresholdPolicy::Fixed { power } => *power,
            ThresholdPolicy::ShareRatio { percent } => {
                let users = repository.fetch_set_by_keyname::<User>(User::KEYNAME, 0, UNBOUNDED)?;
                let total = users
                    .instances()
                    .iter()
                    .fold(0u128, |sum, user| sum + u128::from(user.shares));
                let scaled = total * u128::from(*percent);
                let threshold = scaled.div_ceil(100);
                u64::try_from(threshold).unwrap_or(u64::MAX)
            }
        };
        Ok(threshold.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub threshold: ThresholdPolicy,

    /// Group new keynames are filed under when a proposal names none
    #[serde(default = "default_group")]
    pub default_group: String,
}

fn default_group() -> String {
    "core".to_string()
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::default(),
            default_group: default_group(),
        }
    }
}
