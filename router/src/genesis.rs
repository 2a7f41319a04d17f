//! Trusted bootstrap of stakeholders and role grants.
//!
//! Genesis is the one path that writes to the store without a vote: it
//! registers the initial signers, stores their `User` records and installs
//! the role table, all in a single transaction.

use entity::{DataStore, Registry, Service};
use governance::User;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crypto::PublicKey;
use crate::error::{Result, RouterError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub stakeholders: Vec<GenesisStakeholder>,

    #[serde(default)]
    pub roles: Vec<GenesisRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisStakeholder {
    pub name: String,
    /// Hex-encoded Ed25519 public key
    pub public_key: String,
    pub shares: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRole {
    pub key: String,
    /// Stakeholder names
    #[serde(default)]
    pub members: Vec<String>,
    /// Path regexes the role may write to
    #[serde(default)]
    pub write_patterns: Vec<String>,
}

impl Genesis {
    pub fn is_empty(&self) -> bool {
        self.stakeholders.is_empty() && self.roles.is_empty()
    }

    pub fn apply(&self, store: &mut DataStore, registry: &Registry) -> Result<()> {
        store.transaction(|store| {
            let mut keys = Vec::with_capacity(self.stakeholders.len());
            for stakeholder in &self.stakeholders {
                let key = PublicKey::from_hex(&stakeholder.public_key)?.to_hex();
                store.register_user(key.clone());
                let user = User::new(stakeholder.name.clone(), key.clone(), stakeholder.shares);
                Service::new(store, registry).insert(&user)?;
                keys.push((stakeholder.name.as_str(), key));
            }

            for role in &self.roles {
                let members = role
                    .members
                    .iter()
                    .map(|name| {
                        keys.iter()
                            .find(|(known, _)| known == name)
                            .map(|(_, key)| key.clone())
                            .ok_or_else(|| {
                                RouterError::Config(format!(
                                    "role {} names unknown stakeholder {}",
                                    role.key, name
                                ))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;

                for pattern in &role.write_patterns {
                    Regex::new(pattern).map_err(|e| {
                        RouterError::Config(format!(
                            "role {} has invalid write pattern {}: {}",
                            role.key, pattern, e
                        ))
                    })?;
                }

                store.add_role_members(&role.key, members);
                store.enable_write_access(&role.key, &role.write_patterns);
            }

            info!(
                stakeholders = self.stakeholders.len(),
                roles = self.roles.len(),
                "Genesis applied"
            );
            Ok(())
        })
    }
}
