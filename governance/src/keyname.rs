//! Keynames: the categories requests are filed under.

use entity::{impl_entity, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::group::Group;
use crate::ids;

/// A name unique within its group. Saving a keyname whose group does not
/// exist yet creates the group in the same commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyname {
    pub id: Uuid,
    pub group: Group,
    pub name: String,
}

impl_entity!(Keyname);

#[derive(Debug, Serialize, Deserialize)]
pub struct StorableKeyname {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedKeyname {
    pub id: Uuid,
    pub group: Group,
    pub name: String,
}

impl Keyname {
    /// Keyname with the ID every replica derives for `group`/`name`.
    pub fn named(group: Group, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ids::keyname_id(&group.name, &name),
            group,
            name,
        }
    }

    pub fn by_name(name: &str) -> String {
        format!("{}:by_name:{}", Self::KEYNAME, name)
    }

    pub fn by_group(group_id: Uuid) -> String {
        format!("{}:by_group:{}", Self::KEYNAME, group_id)
    }
}

impl Model for Keyname {
    const NAME: &'static str = "Keyname";
    const KEYNAME: &'static str = "keynames";

    type Storable = StorableKeyname;
    type Normalized = NormalizedKeyname;

    fn to_storable(&self) -> Result<StorableKeyname> {
        Ok(StorableKeyname {
            id: self.id,
            group_id: self.group.id,
            name: self.name.clone(),
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableKeyname) -> Result<Self> {
        Ok(Self {
            id: storable.id,
            group: repository.fetch(storable.group_id)?,
            name: storable.name,
        })
    }

    fn normalize(&self) -> Result<NormalizedKeyname> {
        Ok(NormalizedKeyname {
            id: self.id,
            group: self.group.clone(),
            name: self.name.clone(),
        })
    }

    fn denormalize(normalized: NormalizedKeyname, registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            group: Group::denormalize(normalized.group, registry)?,
            name: normalized.name,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_name(&self.name),
            Self::by_group(self.group.id),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EntityError::InvalidEntity("keyname is empty".into()));
        }

        let tags = [Self::by_name(&self.name), Self::by_group(self.group.id)];
        if !service.repository().store().sets().intersect(&tags).is_empty() {
            return Err(EntityError::AlreadyExists(format!(
                "keyname {} in group {}",
                self.name, self.group.name
            )));
        }

        service.insert_if_absent(&self.group)?;
        Ok(())
    }
}
