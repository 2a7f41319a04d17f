//! Requests: proposed mutations awaiting a vote.

mod active;
mod completed;

pub use active::{ActiveRequest, NormalizedActiveRequest, StorableActiveRequest};
pub use completed::{CompletedRequest, NormalizedCompletedRequest, Outcome};

use std::fmt;
use std::sync::Arc;

use entity::{
    DynEntity, Entity, EntityError, Model, Registry, Representation, Repository, Result, Service,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keyname::{Keyname, NormalizedKeyname};
use crate::user::User;

/// The mutation a request asks for.
#[derive(Debug, Clone)]
pub enum Proposal {
    /// Store a new entity
    Save(DynEntity),
    /// Remove an existing entity
    Delete(DynEntity),
}

impl Proposal {
    pub fn entity(&self) -> &DynEntity {
        match self {
            Proposal::Save(ins) | Proposal::Delete(ins) => ins,
        }
    }
}

/// A proposed save or delete of an entity filed under a keyname.
///
/// The keyname's name selects the registered representation that stores,
/// indexes and serialises the proposed entity.
#[derive(Clone)]
pub struct Request {
    pub id: Uuid,
    pub from: User,
    pub proposal: Proposal,
    pub reason: String,
    pub keyname: Keyname,
    representation: Arc<dyn Representation>,
}

entity::impl_entity!(Request);

#[derive(Debug, Serialize, Deserialize)]
pub struct StorableRequest {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub keyname_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub new_entity: Option<serde_json::Value>,
    #[serde(default)]
    pub target_entity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRequest {
    pub id: Uuid,
    pub from: User,
    pub keyname: NormalizedKeyname,
    pub reason: String,
    #[serde(default)]
    pub new_entity: Option<serde_json::Value>,
    #[serde(default)]
    pub target_entity: Option<serde_json::Value>,
}

impl Request {
    /// Build a request, resolving the proposal's representation from the
    /// registry by keyname name.
    pub fn new(
        id: Uuid,
        from: User,
        proposal: Proposal,
        reason: impl Into<String>,
        keyname: Keyname,
        registry: &Registry,
    ) -> Result<Self> {
        let representation = registry.representation(&keyname.name)?.clone();
        Ok(Self {
            id,
            from,
            proposal,
            reason: reason.into(),
            keyname,
            representation,
        })
    }

    /// Representation of the proposed entity.
    pub fn representation(&self) -> &dyn Representation {
        self.representation.as_ref()
    }

    pub fn by_from(user_id: Uuid) -> String {
        format!("{}:by_from:{}", Self::KEYNAME, user_id)
    }

    pub fn by_keyname(keyname_id: Uuid) -> String {
        format!("{}:by_keyname:{}", Self::KEYNAME, keyname_id)
    }

    /// Requests still on file for the entity `id` of type `keyname`.
    pub fn by_target(keyname: &str, id: Uuid) -> String {
        format!("{}:by_target:{}:{}", Self::KEYNAME, keyname, id)
    }

    fn target(&self) -> String {
        Self::by_target(self.representation.meta_data().keyname(), self.proposal.entity().id())
    }

    fn normalize_proposal(&self) -> Result<(Option<serde_json::Value>, Option<serde_json::Value>)> {
        let meta = self.representation.meta_data();
        let value = meta.normalize(self.proposal.entity().as_ref())?;
        Ok(match self.proposal {
            Proposal::Save(_) => (Some(value), None),
            Proposal::Delete(_) => (None, Some(value)),
        })
    }

    fn denormalize_proposal(
        registry: &Registry,
        keyname: &Keyname,
        new_entity: Option<serde_json::Value>,
        target_entity: Option<serde_json::Value>,
    ) -> Result<Proposal> {
        let meta = registry.representation(&keyname.name)?.meta_data();
        match (new_entity, target_entity) {
            (Some(value), None) => Ok(Proposal::Save(meta.denormalize(registry, value)?)),
            (None, Some(value)) => Ok(Proposal::Delete(meta.denormalize(registry, value)?)),
            _ => Err(EntityError::InvalidEntity(
                "a request needs exactly one of new_entity or target_entity".into(),
            )),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("from", &self.from.name)
            .field("proposal", &self.proposal)
            .field("reason", &self.reason)
            .field("keyname", &self.keyname.name)
            .finish()
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        match (self.normalize(), other.normalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Model for Request {
    const NAME: &'static str = "Request";
    const KEYNAME: &'static str = "requests";

    type Storable = StorableRequest;
    type Normalized = NormalizedRequest;

    fn to_storable(&self) -> Result<StorableRequest> {
        let (new_entity, target_entity) = self.normalize_proposal()?;
        Ok(StorableRequest {
            id: self.id,
            from_user_id: self.from.id,
            keyname_id: self.keyname.id,
            reason: self.reason.clone(),
            new_entity,
            target_entity,
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableRequest) -> Result<Self> {
        let registry = repository.registry();
        let keyname: Keyname = repository.fetch(storable.keyname_id)?;
        let proposal = Self::denormalize_proposal(
            registry,
            &keyname,
            storable.new_entity,
            storable.target_entity,
        )?;
        Self::new(
            storable.id,
            repository.fetch(storable.from_user_id)?,
            proposal,
            storable.reason,
            keyname,
            registry,
        )
    }

    fn normalize(&self) -> Result<NormalizedRequest> {
        let (new_entity, target_entity) = self.normalize_proposal()?;
        Ok(NormalizedRequest {
            id: self.id,
            from: self.from.normalize()?,
            keyname: self.keyname.normalize()?,
            reason: self.reason.clone(),
            new_entity,
            target_entity,
        })
    }

    fn denormalize(normalized: NormalizedRequest, registry: &Registry) -> Result<Self> {
        let keyname = Keyname::denormalize(normalized.keyname, registry)?;
        let proposal = Self::denormalize_proposal(
            registry,
            &keyname,
            normalized.new_entity,
            normalized.target_entity,
        )?;
        Self::new(
            normalized.id,
            User::denormalize(normalized.from, registry)?,
            proposal,
            normalized.reason,
            keyname,
            registry,
        )
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_from(self.from.id),
            Self::by_keyname(self.keyname.id),
            self.target(),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        let repository = service.repository();
        if !repository.exists(User::KEYNAME, self.from.id) {
            return Err(EntityError::Integrity(format!(
                "request {} is proposed by unknown user {}",
                self.id, self.from.id
            )));
        }

        let meta = self.representation.meta_data();
        let target = self.proposal.entity().id();
        let stored = repository.exists(meta.keyname(), target);
        match self.proposal {
            Proposal::Save(_) if stored => {
                return Err(EntityError::AlreadyExists(format!("{} {}", meta.name(), target)));
            }
            Proposal::Delete(_) if !stored => {
                return Err(EntityError::NotFound(format!("{} {}", meta.name(), target)));
            }
            _ => {}
        }

        // Resolved requests are deleted, so this only sees open ones.
        if repository.count(&self.target()) > 0 {
            return Err(EntityError::AlreadyExists(format!(
                "an open request already targets {} {}",
                meta.name(),
                target
            )));
        }

        service.insert_if_absent(&self.keyname)?;
        Ok(())
    }
}
