//! Route tables built on top of the entity and governance crates.
//!
//! | prefix                       | controller                | writes authorized by |
//! |------------------------------|---------------------------|---------------------|
//! | `/<keyname>`                 | [`EntityControllers`]     | trusted role        |
//! | `/requests`, `/users`,       | [`GovernanceControllers`] | router default role |
//! | `/completed-requests`        |                           |                     |

mod entities;
mod voting;

pub use entities::EntityControllers;
pub use voting::{GovernanceControllers, ProposalPayload, VotePayload};

use entity::{EntityError, Model, NormalizedPartialSet, PartialSet};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::{Result, RouterError};
use crate::pattern::Params;
use crate::resource::{Resource, ResourcePointer};
use crate::route::TransactionContext;

pub(crate) const UUID: &str = "[0-9a-fA-F-]{36}";
pub(crate) const TAG: &str = "[A-Za-z0-9:_.-]+";
pub(crate) const TAGS: &str = "[A-Za-z0-9:_.,-]+";
pub(crate) const INDEX: &str = "[0-9]+";
pub(crate) const AMOUNT: &str = "-1|[0-9]+";

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| RouterError::Entity(EntityError::Serialization(e.to_string())))
}

pub(crate) fn parse_json<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data)
        .map_err(|e| RouterError::InvalidRequest(format!("malformed payload: {}", e)))
}

fn param<'p>(params: &'p Params, name: &str) -> Result<&'p str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| RouterError::InvalidRequest(format!("missing path parameter {}", name)))
}

pub(crate) fn param_uuid(params: &Params, name: &str) -> Result<Uuid> {
    let value = param(params, name)?;
    Uuid::parse_str(value)
        .map_err(|e| RouterError::InvalidRequest(format!("{} is not a UUID: {}", value, e)))
}

/// `index`/`amount` path parameters, falling back to the first page of
/// `default_amount` when the route has none.
pub(crate) fn param_page(params: &Params, default_amount: i64) -> Result<(usize, i64)> {
    let index = match params.get("index") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|e| RouterError::InvalidRequest(format!("bad index {}: {}", value, e)))?,
        None => 0,
    };
    let amount = match params.get("amount") {
        Some(value) => value
            .parse::<i64>()
            .map_err(|e| RouterError::InvalidRequest(format!("bad amount {}: {}", value, e)))?,
        None => default_amount,
    };
    Ok((index, amount))
}

/// Comma-separated tag list from the `keynames` parameter.
pub(crate) fn param_tags(params: &Params) -> Result<Vec<String>> {
    let tags = param(params, "keynames")?
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if tags.is_empty() {
        return Err(RouterError::InvalidRequest("no keynames given".into()));
    }
    Ok(tags)
}

/// Gas for `len` bytes of response data: every started kilobyte costs
/// `price_per_kb`.
pub(crate) fn gas_for(len: usize, price_per_kb: i64) -> i64 {
    let kilobytes = i64::try_from(len.div_ceil(1024)).unwrap_or(i64::MAX);
    kilobytes.saturating_mul(price_per_kb)
}

/// Hash of the signed save resource behind `ctx`; seeds derived IDs.
pub(crate) fn resource_hash(ctx: &TransactionContext<'_>, data: &[u8]) -> String {
    Resource::new(ResourcePointer::new(*ctx.signer, ctx.path), data.to_vec()).hash()
}

pub(crate) fn normalize_page<M: Model>(page: PartialSet<M>) -> Result<NormalizedPartialSet> {
    let is_last = page.is_last();
    let (index, amount, total_amount) = (page.index(), page.amount(), page.total_amount());
    let instances = page
        .into_instances()
        .iter()
        .map(|ins| {
            let normalized = ins.normalize()?;
            serde_json::to_value(normalized).map_err(EntityError::from)
        })
        .collect::<entity::Result<Vec<_>>>()?;

    Ok(NormalizedPartialSet {
        index,
        amount,
        total_amount,
        is_last,
        instances,
    })
}
