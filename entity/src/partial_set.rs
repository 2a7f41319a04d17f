//! Paginated query results.

use serde::{Deserialize, Serialize};

use crate::error::{EntityError, Result};
use crate::model::DynEntity;
use crate::registry::Registry;
use crate::representation::MetaData;

/// Page size meaning "everything from `index` on".
pub const UNBOUNDED: i64 = -1;

/// One page of an ordered result set.
#[derive(Debug, Clone)]
pub struct PartialSet<T> {
    instances: Vec<T>,
    index: usize,
    amount: i64,
    total_amount: usize,
}

impl<T> PartialSet<T> {
    pub fn new(instances: Vec<T>, index: usize, amount: i64, total_amount: usize) -> Result<Self> {
        if index.saturating_add(instances.len()) > total_amount && !instances.is_empty() {
            return Err(EntityError::InvalidPagination(format!(
                "page of {} at index {} exceeds total {}",
                instances.len(),
                index,
                total_amount
            )));
        }

        Ok(Self {
            instances,
            index,
            amount,
            total_amount,
        })
    }

    pub fn instances(&self) -> &[T] {
        &self.instances
    }

    pub fn into_instances(self) -> Vec<T> {
        self.instances
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Requested page size, [`UNBOUNDED`] for no limit.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn total_amount(&self) -> usize {
        self.total_amount
    }

    pub fn is_last(&self) -> bool {
        self.index.saturating_add(self.instances.len()) >= self.total_amount
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<PartialSet<U>> {
        let instances = self.instances.into_iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(PartialSet {
            instances,
            index: self.index,
            amount: self.amount,
            total_amount: self.total_amount,
        })
    }
}

/// Serialisable form of a page of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPartialSet {
    pub index: usize,
    pub amount: i64,
    pub total_amount: usize,
    pub is_last: bool,
    pub instances: Vec<serde_json::Value>,
}

impl PartialSet<DynEntity> {
    pub fn normalize(&self, meta: &dyn MetaData) -> Result<NormalizedPartialSet> {
        let instances = self
            .instances
            .iter()
            .map(|ins| meta.normalize(ins.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(NormalizedPartialSet {
            index: self.index,
            amount: self.amount,
            total_amount: self.total_amount,
            is_last: self.is_last(),
            instances,
        })
    }
}

impl NormalizedPartialSet {
    pub fn denormalize(
        self,
        meta: &dyn MetaData,
        registry: &Registry,
    ) -> Result<PartialSet<DynEntity>> {
        let instances = self
            .instances
            .into_iter()
            .map(|value| meta.denormalize(registry, value))
            .collect::<Result<Vec<_>>>()?;
        PartialSet::new(instances, self.index, self.amount, self.total_amount)
    }
}

/// Select the `[index, index + amount)` window of `ids`.
pub(crate) fn window<T>(ids: &[T], index: usize, amount: i64) -> Result<&[T]> {
    if amount < UNBOUNDED {
        return Err(EntityError::InvalidPagination(format!(
            "amount must be {} or positive, got {}",
            UNBOUNDED, amount
        )));
    }

    if amount == 0 || index >= ids.len() {
        return Ok(&[]);
    }

    let end = if amount == UNBOUNDED {
        ids.len()
    } else {
        index.saturating_add(amount as usize).min(ids.len())
    };
    Ok(&ids[index..end])
}
