//! Votes on active requests.

mod active;
mod tally;

pub use active::{ActiveVote, NormalizedActiveVote, StorableActiveVote};
pub use tally::{Resolution, Tally};

use entity::{impl_entity, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::{ActiveRequest, NormalizedActiveRequest};
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Disapprove,
    Neutral,
}

impl VoteChoice {
    /// Read the `is_approved` / `is_neutral` flag pair used on the wire.
    /// Both set is contradictory; neither set is a disapproval.
    pub fn from_flags(is_approved: bool, is_neutral: bool) -> Result<Self> {
        match (is_approved, is_neutral) {
            (true, false) => Ok(VoteChoice::Approve),
            (false, true) => Ok(VoteChoice::Neutral),
            (false, false) => Ok(VoteChoice::Disapprove),
            (true, true) => Err(EntityError::InvalidEntity(
                "a vote cannot be both approved and neutral".into(),
            )),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, VoteChoice::Approve)
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, VoteChoice::Neutral)
    }
}

/// One stakeholder's vote on an active request.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub id: Uuid,
    pub request: ActiveRequest,
    pub voter: User,
    pub reason: String,
    pub choice: VoteChoice,
}

impl_entity!(Vote);

#[derive(Debug, Serialize, Deserialize)]
pub struct StorableVote {
    pub id: Uuid,
    pub request_id: Uuid,
    pub voter_id: Uuid,
    pub reason: String,
    pub is_approved: bool,
    pub is_neutral: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVote {
    pub id: Uuid,
    pub request: NormalizedActiveRequest,
    pub voter: User,
    pub reason: String,
    pub is_approved: bool,
    pub is_neutral: bool,
}

impl Vote {
    pub fn by_request(active_request_id: Uuid) -> String {
        format!("{}:by_request:{}", Self::KEYNAME, active_request_id)
    }

    pub fn by_voter(user_id: Uuid) -> String {
        format!("{}:by_voter:{}", Self::KEYNAME, user_id)
    }
}

impl Model for Vote {
    const NAME: &'static str = "Vote";
    const KEYNAME: &'static str = "votes";

    type Storable = StorableVote;
    type Normalized = NormalizedVote;

    fn to_storable(&self) -> Result<StorableVote> {
        Ok(StorableVote {
            id: self.id,
            request_id: self.request.id,
            voter_id: self.voter.id,
            reason: self.reason.clone(),
            is_approved: self.choice.is_approved(),
            is_neutral: self.choice.is_neutral(),
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableVote) -> Result<Self> {
        Ok(Self {
            id: storable.id,
            request: repository.fetch(storable.request_id)?,
            voter: repository.fetch(storable.voter_id)?,
            reason: storable.reason,
            choice: VoteChoice::from_flags(storable.is_approved, storable.is_neutral)?,
        })
    }

    fn normalize(&self) -> Result<NormalizedVote> {
        Ok(NormalizedVote {
            id: self.id,
            request: self.request.normalize()?,
            voter: self.voter.normalize()?,
            reason: self.reason.clone(),
            is_approved: self.choice.is_approved(),
            is_neutral: self.choice.is_neutral(),
        })
    }

    fn denormalize(normalized: NormalizedVote, registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            request: ActiveRequest::denormalize(normalized.request, registry)?,
            voter: User::denormalize(normalized.voter, registry)?,
            reason: normalized.reason,
            choice: VoteChoice::from_flags(normalized.is_approved, normalized.is_neutral)?,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_request(self.request.id),
            Self::by_voter(self.voter.id),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        let repository = service.repository();
        if !repository.exists(ActiveRequest::KEYNAME, self.request.id) {
            return Err(EntityError::NotFound(format!(
                "active request {} for vote {}",
                self.request.id, self.id
            )));
        }
        if !repository.exists(User::KEYNAME, self.voter.id) {
            return Err(EntityError::Integrity(format!(
                "vote {} is cast by unknown user {}",
                self.id, self.voter.id
            )));
        }
        Ok(())
    }
}
