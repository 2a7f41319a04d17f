//! Users and roles tables.
//!
//! Both hold hex-encoded public keys; the store treats them as opaque
//! strings and leaves signature checks to the caller.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use tracing::warn;

/// Registered signer identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Users {
    keys: BTreeSet<String>,
}

impl Users {
    pub fn insert(&mut self, pub_key: impl Into<String>) -> bool {
        self.keys.insert(pub_key.into())
    }

    pub fn remove(&mut self, pub_key: &str) -> bool {
        self.keys.remove(pub_key)
    }

    pub fn contains(&self, pub_key: &str) -> bool {
        self.keys.contains(pub_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// A write pattern compiled for whole-path matching.
#[derive(Debug, Clone)]
struct WritePattern {
    source: String,
    regex: Regex,
}

impl WritePattern {
    fn compile(source: &str) -> Option<Self> {
        match Regex::new(&format!("^(?:{})$", source)) {
            Ok(regex) => Some(Self {
                source: source.to_string(),
                regex,
            }),
            Err(e) => {
                warn!(pattern = %source, error = %e, "Skipping invalid write pattern");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Role {
    members: BTreeSet<String>,
    write_patterns: Vec<WritePattern>,
}

impl Role {
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn write_patterns(&self) -> impl Iterator<Item = &str> {
        self.write_patterns.iter().map(|p| p.source.as_str())
    }

    pub fn is_member(&self, pub_key: &str) -> bool {
        self.members.contains(pub_key)
    }

    /// True if any write pattern matches the whole path.
    pub fn can_write(&self, path: &str) -> bool {
        self.write_patterns.iter().any(|p| p.regex.is_match(path))
    }
}

/// Role key to members and write grants.
#[derive(Debug, Clone, Default)]
pub struct Roles {
    roles: BTreeMap<String, Role>,
}

impl PartialEq for Roles {
    fn eq(&self, other: &Self) -> bool {
        self.roles.len() == other.roles.len()
            && self.roles.iter().zip(other.roles.iter()).all(|((ka, a), (kb, b))| {
                ka == kb
                    && a.members == b.members
                    && a.write_patterns().eq(b.write_patterns())
            })
    }
}

impl Eq for Roles {}

impl Roles {
    pub fn get(&self, key: &str) -> Option<&Role> {
        self.roles.get(key)
    }

    pub fn add_members<I, S>(&mut self, key: &str, pub_keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let role = self.roles.entry(key.to_string()).or_default();
        pub_keys
            .into_iter()
            .map(Into::into)
            .filter(|pk: &String| role.members.insert(pk.clone()))
            .count()
    }

    /// Grant `key` write access on every valid pattern. Returns how many
    /// new patterns were added.
    pub fn enable_write_access<I, S>(&mut self, key: &str, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let role = self.roles.entry(key.to_string()).or_default();
        let mut added = 0;
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if role.write_patterns.iter().any(|p| p.source == pattern) {
                continue;
            }
            if let Some(compiled) = WritePattern::compile(pattern) {
                role.write_patterns.push(compiled);
                added += 1;
            }
        }
        added
    }

    pub fn disable_write_access<I, S>(&mut self, key: &str, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(role) = self.roles.get_mut(key) else {
            return 0;
        };
        let before = role.write_patterns.len();
        for pattern in patterns {
            role.write_patterns.retain(|p| p.source != pattern.as_ref());
        }
        before - role.write_patterns.len()
    }

    /// Signer is a member of `key` and one of its patterns matches `path`.
    pub fn has_write_access(&self, key: &str, pub_key: &str, path: &str) -> bool {
        self.roles
            .get(key)
            .map(|role| role.is_member(pub_key) && role.can_write(path))
            .unwrap_or(false)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Role)> {
        self.roles.iter().map(|(k, r)| (k.as_str(), r))
    }
}
