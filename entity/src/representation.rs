//! Object-safe pipeline the generic store consumes.
//!
//! The store, the router and the governance engine only ever see
//! `&dyn MetaData` / `&dyn Representation`; they never branch on a concrete
//! record type.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::Codec;
use crate::error::Result;
use crate::model::{downcast, DynEntity, Entity, Model};
use crate::registry::Registry;
use crate::repository::Repository;
use crate::service::Service;

/// Input to [`MetaData::to_entity`].
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Bytes written by the store codec
    Storable(&'a [u8]),
    /// Normalized JSON received in a transaction
    Wire(&'a [u8]),
}

pub trait MetaData: Send + Sync {
    fn name(&self) -> &'static str;

    fn keyname(&self) -> &'static str;

    /// Rebuild an entity from local storage bytes or a wire payload.
    fn to_entity(&self, repository: &Repository<'_>, payload: Payload<'_>) -> Result<DynEntity>;

    fn normalize(&self, ins: &dyn Entity) -> Result<serde_json::Value>;

    fn denormalize(&self, registry: &Registry, normalized: serde_json::Value) -> Result<DynEntity>;
}

pub trait Representation: Send + Sync {
    fn meta_data(&self) -> &dyn MetaData;

    fn to_storable(&self, codec: Codec, ins: &dyn Entity) -> Result<Vec<u8>>;

    fn keynames(&self, ins: &dyn Entity) -> Result<Vec<String>>;

    fn on_save(&self, service: &mut Service<'_>, ins: &dyn Entity) -> Result<()>;

    fn on_delete(&self, service: &mut Service<'_>, ins: &dyn Entity) -> Result<()>;
}

/// Adapts a [`Model`] to [`MetaData`] and [`Representation`].
pub struct ModelRepresentation<M>(PhantomData<fn() -> M>);

impl<M: Model> ModelRepresentation<M> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    pub fn shared() -> Arc<dyn Representation> {
        Arc::new(Self::new())
    }
}

impl<M: Model> Default for ModelRepresentation<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for ModelRepresentation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelRepresentation")
            .field(&std::any::type_name::<M>())
            .finish()
    }
}

impl<M: Model> MetaData for ModelRepresentation<M> {
    fn name(&self) -> &'static str {
        M::NAME
    }

    fn keyname(&self) -> &'static str {
        M::KEYNAME
    }

    fn to_entity(&self, repository: &Repository<'_>, payload: Payload<'_>) -> Result<DynEntity> {
        let ins = match payload {
            Payload::Storable(bytes) => {
                let storable = repository.codec().decode::<M::Storable>(bytes)?;
                M::from_storable(repository, storable)?
            }
            Payload::Wire(bytes) => {
                let normalized = serde_json::from_slice::<M::Normalized>(bytes)?;
                M::denormalize(normalized, repository.registry())?
            }
        };
        Ok(Arc::new(ins))
    }

    fn normalize(&self, ins: &dyn Entity) -> Result<serde_json::Value> {
        let normalized = downcast::<M>(ins)?.normalize()?;
        Ok(serde_json::to_value(normalized)?)
    }

    fn denormalize(&self, registry: &Registry, normalized: serde_json::Value) -> Result<DynEntity> {
        let normalized = serde_json::from_value::<M::Normalized>(normalized)?;
        Ok(Arc::new(M::denormalize(normalized, registry)?))
    }
}

impl<M: Model> Representation for ModelRepresentation<M> {
    fn meta_data(&self) -> &dyn MetaData {
        self
    }

    fn to_storable(&self, codec: Codec, ins: &dyn Entity) -> Result<Vec<u8>> {
        codec.encode(&downcast::<M>(ins)?.to_storable()?)
    }

    fn keynames(&self, ins: &dyn Entity) -> Result<Vec<String>> {
        Ok(downcast::<M>(ins)?.keynames())
    }

    fn on_save(&self, service: &mut Service<'_>, ins: &dyn Entity) -> Result<()> {
        downcast::<M>(ins)?.on_save(service)
    }

    fn on_delete(&self, service: &mut Service<'_>, ins: &dyn Entity) -> Result<()> {
        downcast::<M>(ins)?.on_delete(service)
    }
}
