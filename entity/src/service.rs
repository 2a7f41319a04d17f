//! Write side of the entity store.
//!
//! Every save and delete runs inside a store transaction together with the
//! representation hooks it triggers, so a failing uniqueness check or a
//! failing cascade leaves the store exactly as it was.

use tracing::debug;

use crate::datastore::DataStore;
use crate::error::{EntityError, Result};
use crate::model::{object_key, Entity, Model};
use crate::registry::Registry;
use crate::repository::Repository;
use crate::representation::{ModelRepresentation, Representation};

pub struct Service<'a> {
    store: &'a mut DataStore,
    registry: &'a Registry,
}

impl<'a> Service<'a> {
    pub fn new(store: &'a mut DataStore, registry: &'a Registry) -> Self {
        Self { store, registry }
    }

    pub fn repository(&self) -> Repository<'_> {
        Repository::new(&*self.store, self.registry)
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn store(&self) -> &DataStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut DataStore {
        &mut *self.store
    }

    /// Run `f` as one unit: everything it writes is undone if it fails.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Service<'_>) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let registry = self.registry;
        self.store
            .transaction(|store| f(&mut Service::new(store, registry)))
    }

    /// Persist a new instance and index it under its keynames.
    pub fn save(&mut self, ins: &dyn Entity, representation: &dyn Representation) -> Result<()> {
        self.atomically(|service| service.save_in_place(ins, representation))
    }

    fn save_in_place(&mut self, ins: &dyn Entity, representation: &dyn Representation) -> Result<()> {
        let meta = representation.meta_data();
        let id = ins.id();
        let key = object_key(meta.keyname(), id);
        if self.store.contains_object(&key) {
            return Err(EntityError::AlreadyExists(format!("{} {}", meta.name(), id)));
        }

        representation.on_save(self, ins)?;

        // A hook may have cascaded into the same key.
        if self.store.contains_object(&key) {
            return Err(EntityError::AlreadyExists(format!("{} {}", meta.name(), id)));
        }

        let bytes = representation.to_storable(self.store.codec(), ins)?;
        let mut tags = representation.keynames(ins)?;
        dedup_in_order(&mut tags);

        debug!(entity = meta.name(), id = %id, tags = tags.len(), "Saving entity");
        self.store.insert_record(key, id, bytes, tags);
        Ok(())
    }

    /// Remove an instance and every tag membership it was saved with.
    pub fn delete(&mut self, ins: &dyn Entity, representation: &dyn Representation) -> Result<()> {
        self.atomically(|service| service.delete_in_place(ins, representation))
    }

    fn delete_in_place(&mut self, ins: &dyn Entity, representation: &dyn Representation) -> Result<()> {
        let meta = representation.meta_data();
        let id = ins.id();
        let key = object_key(meta.keyname(), id);
        if !self.store.contains_object(&key) {
            return Err(EntityError::NotFound(format!("{} {}", meta.name(), id)));
        }

        representation.on_delete(self, ins)?;

        debug!(entity = meta.name(), id = %id, "Deleting entity");
        if !self.store.remove_record(&key, id) {
            return Err(EntityError::NotFound(format!("{} {}", meta.name(), id)));
        }
        Ok(())
    }

    /// Typed shorthand for [`save`](Self::save).
    pub fn insert<M: Model>(&mut self, ins: &M) -> Result<()> {
        self.save(ins, &ModelRepresentation::<M>::new())
    }

    /// Typed shorthand for [`delete`](Self::delete).
    pub fn remove<M: Model>(&mut self, ins: &M) -> Result<()> {
        self.delete(ins, &ModelRepresentation::<M>::new())
    }

    /// Save `ins` unless an entity with the same ID already exists.
    pub fn insert_if_absent<M: Model>(&mut self, ins: &M) -> Result<bool> {
        if self.repository().exists(M::KEYNAME, ins.id()) {
            return Ok(false);
        }
        self.insert(ins)?;
        Ok(true)
    }
}

fn dedup_in_order(tags: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
}
