//! Proposals, votes and the governance read side.

use std::collections::BTreeMap;

use entity::{EntityError, Model, UNBOUNDED};
use governance::{
    ids, ActiveRequest, ActiveVote, CompletedRequest, GovernanceConfig, Group, Keyname, Proposal,
    Request, RequestService, User, Vote, VoteChoice, VoteService, VoteStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{gas_for, normalize_page, param_page, param_uuid, parse_json, resource_hash, to_json, AMOUNT, INDEX, UUID};
use crate::error::{Result, RouterError};
use crate::response::{QueryResponse, TransactionResponse};
use crate::route::{Route, TransactionContext};

/// Body of a `Save /requests` transaction.
///
/// Exactly one of `new_entity` (normalized JSON of the entity to save) and
/// `target_id` (entity to delete) must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalPayload {
    /// Request ID; derived from the signed resource when absent
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Group the keyname is filed under; the configured default when absent
    #[serde(default)]
    pub group: Option<String>,
    /// Keyname of the registered type the proposal is about
    pub keyname: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub new_entity: Option<serde_json::Value>,
    #[serde(default)]
    pub target_id: Option<Uuid>,
}

/// Body of a `Save /requests/<id>/votes` transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePayload {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub reason: String,
    pub is_approved: bool,
    #[serde(default)]
    pub is_neutral: bool,
}

/// ```text
/// Save     /requests                                propose
/// Save     /requests/<id>/votes                     vote
/// Retrieve /requests[/set/<index>/<amount>]         open requests
/// Retrieve /requests/<id>
/// Retrieve /requests/<id>/votes
/// Retrieve /completed-requests[/set/<index>/<amount>]
/// Retrieve /completed-requests/<id>
/// Retrieve /users[/set/<index>/<amount>]
/// Retrieve /users/<pub_key>
/// ```
#[derive(Debug, Clone)]
pub struct GovernanceControllers {
    config: GovernanceConfig,
    default_page_size: i64,
    gas_price_per_kb: i64,
}

impl GovernanceControllers {
    pub fn new(config: GovernanceConfig, default_page_size: i64, gas_price_per_kb: i64) -> Self {
        Self {
            config,
            default_page_size,
            gas_price_per_kb,
        }
    }

    pub fn routes(&self) -> Result<Vec<Route>> {
        let page = format!("/set/<index|{}>/<amount|{}>", INDEX, AMOUNT);
        let element = |prefix: &str| format!("{}/<id|{}>", prefix, UUID);

        Ok(vec![
            self.propose()?,
            self.vote()?,
            self.list::<ActiveRequest>("/requests")?,
            self.list::<ActiveRequest>(&format!("/requests{}", page))?,
            self.get::<ActiveRequest>(&element("/requests"))?,
            Route::query(&format!("/requests/<id|{}>/votes", UUID), |ctx| {
                let id = param_uuid(ctx.params, "id")?;
                let votes = ctx.repository().fetch_set_by_keyname::<ActiveVote>(
                    &ActiveVote::by_request(id),
                    0,
                    UNBOUNDED,
                )?;
                Ok(QueryResponse::success(ctx.path, to_json(&normalize_page(votes)?)?))
            })?,
            self.list::<CompletedRequest>("/completed-requests")?,
            self.list::<CompletedRequest>(&format!("/completed-requests{}", page))?,
            self.get::<CompletedRequest>(&element("/completed-requests"))?,
            self.list::<User>("/users")?,
            self.list::<User>(&format!("/users{}", page))?,
            Route::query("/users/<pub_key|[0-9a-f]{64}>", |ctx| {
                let pub_key = ctx.params.get("pub_key").map(String::as_str).unwrap_or_default();
                let user = User::find_by_pub_key(&ctx.repository(), pub_key)?
                    .ok_or_else(|| EntityError::NotFound(format!("User {}", pub_key)))?;
                Ok(QueryResponse::success(ctx.path, to_json(&user.normalize()?)?))
            })?,
        ])
    }

    fn propose(&self) -> Result<Route> {
        let config = self.config.clone();
        let price = self.gas_price_per_kb;
        Route::save("/requests", move |ctx, data| {
            let payload: ProposalPayload = parse_json(data)?;
            let from = proposer(ctx)?;
            let meta = ctx.registry.representation(&payload.keyname)?.meta_data();

            let proposal = match (payload.new_entity, payload.target_id) {
                (Some(value), None) => Proposal::Save(meta.denormalize(ctx.registry, value)?),
                (None, Some(id)) => Proposal::Delete(ctx.repository().retrieve_by_id(meta, id)?),
                _ => {
                    return Err(RouterError::InvalidRequest(
                        "a proposal needs exactly one of new_entity and target_id".into(),
                    ))
                }
            };

            let group = Group::named(payload.group.unwrap_or_else(|| config.default_group.clone()));
            let keyname = Keyname::named(group, payload.keyname);
            let id = payload
                .id
                .unwrap_or_else(|| ids::derive("request", &resource_hash(ctx, data)));
            let request = Request::new(id, from, proposal, payload.reason, keyname, ctx.registry)?;

            let active = RequestService::new(&mut *ctx.store, ctx.registry)
                .propose(request, &config.threshold)?;

            let body = to_json(&active.normalize()?)?;
            let gas = gas_for(body.len(), price);
            let mut tags = BTreeMap::new();
            tags.insert(format!("/requests/{}", active.id), body);
            Ok(TransactionResponse::success(
                format!("request {} open, threshold {}", active.id, active.threshold),
                gas,
                tags,
            ))
        })
    }

    fn vote(&self) -> Result<Route> {
        let price = self.gas_price_per_kb;
        Route::save(&format!("/requests/<id|{}>/votes", UUID), move |ctx, data| {
            let payload: VotePayload = parse_json(data)?;
            let choice = VoteChoice::from_flags(payload.is_approved, payload.is_neutral)
                .map_err(|e| RouterError::InvalidRequest(e.to_string()))?;
            let voter = proposer(ctx)?;
            let active: ActiveRequest = ctx.repository().fetch(param_uuid(ctx.params, "id")?)?;
            let representation = ctx.registry.representation(&active.request.keyname.name)?.clone();

            let vote = Vote {
                id: payload
                    .id
                    .unwrap_or_else(|| ids::derive("vote", &resource_hash(ctx, data))),
                request: active.clone(),
                voter: voter.clone(),
                reason: payload.reason,
                choice,
            };
            let ballot = ActiveVote::new(vote, voter.shares);
            let outcome = VoteService::new(&mut *ctx.store, ctx.registry)
                .save(&ballot, representation.as_ref())?;

            let mut tags = BTreeMap::new();
            tags.insert(
                format!("/requests/{}/votes/{}", active.id, ballot.id),
                to_json(&ballot.normalize()?)?,
            );
            tags.insert(
                format!("/requests/{}/tally", active.id),
                to_json(&json!({
                    "approved": outcome.tally.approved,
                    "disapproved": outcome.tally.disapproved,
                    "neutral": outcome.tally.neutral,
                    "threshold": outcome.threshold,
                    "status": outcome.status.as_str(),
                }))?,
            );
            if let Some(completed) = &outcome.completed {
                if outcome.status == VoteStatus::Committed {
                    if let Proposal::Save(ins) = &completed.request.proposal {
                        let meta = representation.meta_data();
                        tags.insert(
                            format!("/{}/{}", meta.keyname(), ins.id()),
                            to_json(&meta.normalize(ins.as_ref())?)?,
                        );
                    }
                }
                tags.insert(
                    format!("/completed-requests/{}", completed.id),
                    to_json(&completed.normalize()?)?,
                );
            }
            debug!(request = %active.id, status = outcome.status.as_str(), "Vote handled");

            let gas = gas_for(tags.values().map(Vec::len).sum(), price);
            Ok(TransactionResponse::success(
                format!("vote {} recorded, request {}", ballot.id, outcome.status.as_str()),
                gas,
                tags,
            ))
        })
    }

    fn list<M: Model>(&self, pattern: &str) -> Result<Route> {
        let page_size = self.default_page_size;
        Route::query(pattern, move |ctx| {
            let (index, amount) = param_page(ctx.params, page_size)?;
            let page = ctx
                .repository()
                .fetch_set_by_keyname::<M>(M::KEYNAME, index, amount)?;
            Ok(QueryResponse::success(ctx.path, to_json(&normalize_page(page)?)?))
        })
    }

    fn get<M: Model>(&self, pattern: &str) -> Result<Route> {
        Route::query(pattern, |ctx| {
            let ins: M = ctx.repository().fetch(param_uuid(ctx.params, "id")?)?;
            Ok(QueryResponse::success(ctx.path, to_json(&ins.normalize()?)?))
        })
    }
}

/// The stakeholder behind the transaction signer.
fn proposer(ctx: &TransactionContext<'_>) -> Result<User> {
    let pub_key = ctx.signer.to_hex();
    User::find_by_pub_key(&ctx.repository(), &pub_key)?
        .ok_or_else(|| RouterError::Unauthorized(format!("{} is not a stakeholder", pub_key)))
}
