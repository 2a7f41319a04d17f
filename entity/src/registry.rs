//! Proposal type registry.
//!
//! Maps the keyname name a request is filed under to the representation
//! that knows how to rebuild, store and index the proposed entity. Built
//! once at startup and shared by reference; there is no global table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EntityError, Result};
use crate::model::Model;
use crate::representation::{ModelRepresentation, Representation};

#[derive(Clone, Default)]
pub struct Registry {
    representations: BTreeMap<String, Arc<dyn Representation>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        keyname: impl Into<String>,
        representation: Arc<dyn Representation>,
    ) -> Result<()> {
        let keyname = keyname.into();
        if self.representations.contains_key(&keyname) {
            return Err(EntityError::AlreadyExists(format!(
                "keyname {} is already registered",
                keyname
            )));
        }
        self.representations.insert(keyname, representation);
        Ok(())
    }

    /// Register `M` under its own `KEYNAME`.
    pub fn with_model<M: Model>(mut self) -> Result<Self> {
        self.register(M::KEYNAME, ModelRepresentation::<M>::shared())?;
        Ok(self)
    }

    pub fn representation(&self, keyname: &str) -> Result<&Arc<dyn Representation>> {
        self.representations
            .get(keyname)
            .ok_or_else(|| EntityError::UnknownKeyname(keyname.to_string()))
    }

    pub fn contains(&self, keyname: &str) -> bool {
        self.representations.contains_key(keyname)
    }

    pub fn keynames(&self) -> impl Iterator<Item = &str> {
        self.representations.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Representation>)> {
        self.representations.iter().map(|(k, r)| (k.as_str(), r))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keynames", &self.representations.keys().collect::<Vec<_>>())
            .finish()
    }
}
