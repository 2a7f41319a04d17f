//! Entity and Model traits.
//!
//! `Entity` is the object-safe view the store works with: something with a
//! stable UUID that can be downcast back to its concrete type. `Model` is the
//! typed contract each record type implements once; [`ModelRepresentation`]
//! turns it into the object-safe pipeline the generic store consumes.
//!
//! [`ModelRepresentation`]: crate::representation::ModelRepresentation

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::{EntityError, Result};
use crate::registry::Registry;
use crate::repository::Repository;
use crate::service::Service;

/// A persisted record with a stable identifier.
pub trait Entity: Any + Debug + Send + Sync {
    fn id(&self) -> Uuid;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle on an entity of unknown concrete type.
pub type DynEntity = Arc<dyn Entity>;

/// Typed description of a record kind.
///
/// Three forms of the same logical record exist:
///
/// ```text
///            to_storable                       normalize
///   Storable <----------- Self (in memory) -----------> Normalized
///      |     ------------>                 <-----------    (JSON, wire)
///      |     from_storable (store-aware)     denormalize
///      v
///   Codec bytes in the DataStore
/// ```
///
/// The storable form references other entities by ID; the normalized form
/// embeds them so it can be shipped without a store.
pub trait Model: Entity + Clone + Sized {
    /// Human-readable type name used in errors and logs
    const NAME: &'static str;

    /// Tag namespace and object key prefix
    const KEYNAME: &'static str;

    type Storable: Serialize + DeserializeOwned;
    type Normalized: Serialize + DeserializeOwned;

    fn to_storable(&self) -> Result<Self::Storable>;

    fn from_storable(repository: &Repository<'_>, storable: Self::Storable) -> Result<Self>;

    fn normalize(&self) -> Result<Self::Normalized>;

    fn denormalize(normalized: Self::Normalized, registry: &Registry) -> Result<Self>;

    /// Tags this instance is indexed under.
    fn keynames(&self) -> Vec<String> {
        vec![Self::KEYNAME.to_string()]
    }

    /// Runs inside the save transaction, before the record is written.
    fn on_save(&self, _service: &mut Service<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs inside the delete transaction, before the record is removed.
    fn on_delete(&self, _service: &mut Service<'_>) -> Result<()> {
        Ok(())
    }
}

/// Downcast a dynamic entity to a concrete model.
pub fn downcast<M: Model>(ins: &dyn Entity) -> Result<&M> {
    ins.as_any().downcast_ref::<M>().ok_or_else(|| {
        EntityError::InvalidEntity(format!("{} is not a {}", ins.id(), M::NAME))
    })
}

/// Implements [`Entity`] for a struct with an `id: Uuid` field.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty) => {
        impl $crate::Entity for $ty {
            fn id(&self) -> $crate::Uuid {
                self.id
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

/// Object key of a record: `{keyname}:by_id:{uuid}`.
pub fn object_key(keyname: &str, id: Uuid) -> String {
    format!("{}:by_id:{}", keyname, id)
}
