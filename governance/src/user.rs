//! Stakeholders.

use entity::{impl_entity, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;

/// A registered identity whose shares are its voting power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// At least three of `[a-zA-Z0-9-]`
    pub name: String,
    /// Hex-encoded public key
    pub pub_key: String,
    pub shares: u64,
}

impl_entity!(User);

impl User {
    pub fn new(name: impl Into<String>, pub_key: impl Into<String>, shares: u64) -> Self {
        let pub_key = pub_key.into();
        Self {
            id: ids::user_id(&pub_key),
            name: name.into(),
            pub_key,
            shares,
        }
    }

    pub fn by_pub_key(pub_key: &str) -> String {
        format!("{}:by_pub_key:{}", Self::KEYNAME, pub_key)
    }

    pub fn by_name(name: &str) -> String {
        format!("{}:by_name:{}", Self::KEYNAME, name)
    }

    /// Look up the stakeholder owning `pub_key`.
    pub fn find_by_pub_key(repository: &Repository<'_>, pub_key: &str) -> Result<Option<User>> {
        repository.find_by_intersect(&[Self::KEYNAME.to_string(), Self::by_pub_key(pub_key)])
    }

    fn validate(&self) -> Result<()> {
        let valid_name = self.name.len() >= 3
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_name {
            return Err(EntityError::InvalidEntity(format!(
                "user name {:?} must be at least 3 of [a-zA-Z0-9-]",
                self.name
            )));
        }
        if self.pub_key.is_empty() {
            return Err(EntityError::InvalidEntity("user public key is empty".into()));
        }
        Ok(())
    }
}

impl Model for User {
    const NAME: &'static str = "User";
    const KEYNAME: &'static str = "users";

    type Storable = User;
    type Normalized = User;

    fn to_storable(&self) -> Result<User> {
        Ok(self.clone())
    }

    fn from_storable(_repository: &Repository<'_>, storable: User) -> Result<Self> {
        Ok(storable)
    }

    fn normalize(&self) -> Result<User> {
        Ok(self.clone())
    }

    fn denormalize(normalized: User, _registry: &Registry) -> Result<Self> {
        normalized.validate()?;
        Ok(normalized)
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_pub_key(&self.pub_key),
            Self::by_name(&self.name),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        self.validate()?;
        let repository = service.repository();
        if repository.count(&Self::by_name(&self.name)) > 0 {
            return Err(EntityError::AlreadyExists(format!("user named {}", self.name)));
        }
        if repository.count(&Self::by_pub_key(&self.pub_key)) > 0 {
            return Err(EntityError::AlreadyExists(format!(
                "user with public key {}",
                self.pub_key
            )));
        }
        Ok(())
    }
}
