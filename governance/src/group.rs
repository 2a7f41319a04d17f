//! Groups of keynames.

use entity::{impl_entity, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids;

/// Top-level namespace for keynames. Names are globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
}

impl_entity!(Group);

impl Group {
    /// Group with the ID every replica derives for `name`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ids::group_id(&name),
            name,
        }
    }

    pub fn by_name(name: &str) -> String {
        format!("{}:by_name:{}", Self::KEYNAME, name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EntityError::InvalidEntity("group name is empty".into()));
        }
        Ok(())
    }
}

impl Model for Group {
    const NAME: &'static str = "Group";
    const KEYNAME: &'static str = "groups";

    type Storable = Group;
    type Normalized = Group;

    fn to_storable(&self) -> Result<Group> {
        Ok(self.clone())
    }

    fn from_storable(_repository: &Repository<'_>, storable: Group) -> Result<Self> {
        Ok(storable)
    }

    fn normalize(&self) -> Result<Group> {
        Ok(self.clone())
    }

    fn denormalize(normalized: Group, _registry: &Registry) -> Result<Self> {
        normalized.validate()?;
        Ok(normalized)
    }

    fn keynames(&self) -> Vec<String> {
        vec![Self::KEYNAME.to_string(), Self::by_name(&self.name)]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        self.validate()?;
        if service.repository().count(&Self::by_name(&self.name)) > 0 {
            return Err(EntityError::AlreadyExists(format!("group named {}", self.name)));
        }
        Ok(())
    }
}
