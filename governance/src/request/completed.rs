use entity::{impl_entity, Model, Registry, Repository, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NormalizedRequest, Request};
use crate::ids;
use crate::vote::Tally;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Approved and the proposed mutation was applied
    Committed,
    /// Resolved without approval; nothing was applied
    Discarded,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Committed => "committed",
            Outcome::Discarded => "discarded",
        }
    }
}

/// Log entry for a resolved request.
///
/// The request itself is deleted at resolution, so the log keeps its own
/// normalized copy instead of a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRequest {
    pub id: Uuid,
    pub request: Request,
    pub threshold: u64,
    pub tally: Tally,
    pub outcome: Outcome,
}

impl_entity!(CompletedRequest);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCompletedRequest {
    pub id: Uuid,
    pub request: NormalizedRequest,
    pub threshold: u64,
    pub approved: u64,
    pub disapproved: u64,
    pub neutral: u64,
    pub outcome: Outcome,
}

impl CompletedRequest {
    pub fn new(request: Request, threshold: u64, tally: Tally, outcome: Outcome) -> Self {
        Self {
            id: ids::completed_request_id(request.id),
            request,
            threshold,
            tally,
            outcome,
        }
    }

    pub fn by_request(request_id: Uuid) -> String {
        format!("{}:by_request:{}", Self::KEYNAME, request_id)
    }

    pub fn by_from(user_id: Uuid) -> String {
        format!("{}:by_from:{}", Self::KEYNAME, user_id)
    }

    pub fn by_keyname(keyname_id: Uuid) -> String {
        format!("{}:by_keyname:{}", Self::KEYNAME, keyname_id)
    }

    pub fn by_outcome(outcome: Outcome) -> String {
        format!("{}:outcome:{}", Self::KEYNAME, outcome.as_str())
    }
}

impl Model for CompletedRequest {
    const NAME: &'static str = "CompletedRequest";
    const KEYNAME: &'static str = "completed_requests";

    type Storable = NormalizedCompletedRequest;
    type Normalized = NormalizedCompletedRequest;

    fn to_storable(&self) -> Result<NormalizedCompletedRequest> {
        self.normalize()
    }

    fn from_storable(
        repository: &Repository<'_>,
        storable: NormalizedCompletedRequest,
    ) -> Result<Self> {
        Self::denormalize(storable, repository.registry())
    }

    fn normalize(&self) -> Result<NormalizedCompletedRequest> {
        Ok(NormalizedCompletedRequest {
            id: self.id,
            request: self.request.normalize()?,
            threshold: self.threshold,
            approved: self.tally.approved,
            disapproved: self.tally.disapproved,
            neutral: self.tally.neutral,
            outcome: self.outcome,
        })
    }

    fn denormalize(normalized: NormalizedCompletedRequest, registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            request: Request::denormalize(normalized.request, registry)?,
            threshold: normalized.threshold,
            tally: Tally {
                approved: normalized.approved,
                disapproved: normalized.disapproved,
                neutral: normalized.neutral,
            },
            outcome: normalized.outcome,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_request(self.request.id),
            Self::by_from(self.request.from.id),
            Self::by_keyname(self.request.keyname.id),
            Self::by_outcome(self.outcome),
        ]
    }
}
