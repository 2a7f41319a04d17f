//! Read side of the entity store.

use tracing::trace;
use uuid::Uuid;

use crate::codec::Codec;
use crate::datastore::DataStore;
use crate::error::{EntityError, Result};
use crate::model::{object_key, DynEntity, Model};
use crate::partial_set::{window, PartialSet};
use crate::registry::Registry;
use crate::representation::{MetaData, Payload};

/// Borrowed read view over a [`DataStore`].
#[derive(Clone, Copy)]
pub struct Repository<'a> {
    store: &'a DataStore,
    registry: &'a Registry,
}

impl<'a> Repository<'a> {
    pub fn new(store: &'a DataStore, registry: &'a Registry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &'a DataStore {
        self.store
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn codec(&self) -> Codec {
        self.store.codec()
    }

    pub fn exists(&self, keyname: &str, id: Uuid) -> bool {
        self.store.contains_object(&object_key(keyname, id))
    }

    fn raw(&self, keyname: &str, name: &str, id: Uuid) -> Result<&'a [u8]> {
        self.store
            .object(&object_key(keyname, id))
            .ok_or_else(|| EntityError::NotFound(format!("{} {}", name, id)))
    }

    /// IDs matching every tag; `NotFound` when nothing does.
    fn intersect<S: AsRef<str>>(&self, name: &str, tags: &[S]) -> Result<Vec<Uuid>> {
        let ids = self.store.sets().intersect(tags);
        if ids.is_empty() {
            return Err(EntityError::NotFound(format!(
                "{} matching {}",
                name,
                join_tags(tags)
            )));
        }
        Ok(ids)
    }

    fn single<S: AsRef<str>>(&self, name: &str, tags: &[S]) -> Result<Uuid> {
        let ids = self.intersect(name, tags)?;
        match ids.as_slice() {
            [id] => Ok(*id),
            _ => Err(EntityError::Ambiguous {
                tags: join_tags(tags),
                count: ids.len(),
            }),
        }
    }

    fn page<T>(
        &self,
        ids: &[Uuid],
        index: usize,
        amount: i64,
        mut load: impl FnMut(Uuid) -> Result<T>,
    ) -> Result<PartialSet<T>> {
        let selected = window(ids, index, amount)?;
        trace!(total = ids.len(), index, amount, selected = selected.len(), "Loading page");
        let instances = selected
            .iter()
            .map(|id| load(*id))
            .collect::<Result<Vec<_>>>()?;
        PartialSet::new(instances, index, amount, ids.len())
    }

    // ========================================================================
    // Dynamic retrieval
    // ========================================================================

    pub fn retrieve_by_id(&self, meta: &dyn MetaData, id: Uuid) -> Result<DynEntity> {
        let bytes = self.raw(meta.keyname(), meta.name(), id)?;
        meta.to_entity(self, Payload::Storable(bytes))
    }

    /// The single entity tagged with every keyname.
    pub fn retrieve_by_intersect_keynames<S: AsRef<str>>(
        &self,
        meta: &dyn MetaData,
        keynames: &[S],
    ) -> Result<DynEntity> {
        let id = self.single(meta.name(), keynames)?;
        self.retrieve_by_id(meta, id)
    }

    /// A page of the entities tagged with `keyname`; empty for an unknown tag.
    pub fn retrieve_set_by_keyname(
        &self,
        meta: &dyn MetaData,
        keyname: &str,
        index: usize,
        amount: i64,
    ) -> Result<PartialSet<DynEntity>> {
        let ids = self.store.sets().members(keyname);
        self.page(ids, index, amount, |id| self.retrieve_by_id(meta, id))
    }

    pub fn retrieve_set_by_intersect_keynames<S: AsRef<str>>(
        &self,
        meta: &dyn MetaData,
        keynames: &[S],
        index: usize,
        amount: i64,
    ) -> Result<PartialSet<DynEntity>> {
        let ids = self.intersect(meta.name(), keynames)?;
        self.page(&ids, index, amount, |id| self.retrieve_by_id(meta, id))
    }

    // ========================================================================
    // Typed retrieval
    // ========================================================================

    pub fn fetch<M: Model>(&self, id: Uuid) -> Result<M> {
        let bytes = self.raw(M::KEYNAME, M::NAME, id)?;
        let storable = self.codec().decode::<M::Storable>(bytes)?;
        M::from_storable(self, storable)
    }

    pub fn fetch_by_intersect<M: Model, S: AsRef<str>>(&self, keynames: &[S]) -> Result<M> {
        let id = self.single(M::NAME, keynames)?;
        self.fetch(id)
    }

    /// Like [`fetch_by_intersect`](Self::fetch_by_intersect) but `None`
    /// when nothing matches.
    pub fn find_by_intersect<M: Model, S: AsRef<str>>(&self, keynames: &[S]) -> Result<Option<M>> {
        match self.fetch_by_intersect(keynames) {
            Ok(ins) => Ok(Some(ins)),
            Err(EntityError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn fetch_set_by_keyname<M: Model>(
        &self,
        keyname: &str,
        index: usize,
        amount: i64,
    ) -> Result<PartialSet<M>> {
        let ids = self.store.sets().members(keyname);
        self.page(ids, index, amount, |id| self.fetch(id))
    }

    pub fn fetch_set_by_intersect<M: Model, S: AsRef<str>>(
        &self,
        keynames: &[S],
        index: usize,
        amount: i64,
    ) -> Result<PartialSet<M>> {
        let ids = self.intersect(M::NAME, keynames)?;
        self.page(&ids, index, amount, |id| self.fetch(id))
    }

    /// Number of entities tagged with `keyname`.
    pub fn count(&self, keyname: &str) -> usize {
        self.store.sets().len(keyname)
    }
}

fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}
