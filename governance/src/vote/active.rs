use entity::{impl_entity, DataStore, EntityError, Model, Registry, Repository, Result, Service};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NormalizedVote, Vote};
use crate::ids;

/// A vote together with the voting power the voter held when casting it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVote {
    pub id: Uuid,
    pub vote: Vote,
    pub power: u64,
}

impl_entity!(ActiveVote);

#[derive(Debug, Serialize, Deserialize)]
pub struct StorableActiveVote {
    pub id: Uuid,
    pub vote_id: Uuid,
    pub power: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedActiveVote {
    pub id: Uuid,
    pub vote: NormalizedVote,
    pub power: u64,
}

impl ActiveVote {
    pub fn new(vote: Vote, power: u64) -> Self {
        Self {
            id: ids::active_vote_id(vote.id),
            vote,
            power,
        }
    }

    pub fn by_vote(vote_id: Uuid) -> String {
        format!("{}:by_vote:{}", Self::KEYNAME, vote_id)
    }

    pub fn by_request(active_request_id: Uuid) -> String {
        format!("{}:by_request:{}", Self::KEYNAME, active_request_id)
    }

    pub fn by_voter(user_id: Uuid) -> String {
        format!("{}:by_voter:{}", Self::KEYNAME, user_id)
    }

    pub fn is_approved(value: bool) -> String {
        format!("{}:is_approved:{}", Self::KEYNAME, value)
    }

    pub fn is_neutral(value: bool) -> String {
        format!("{}:is_neutral:{}", Self::KEYNAME, value)
    }

    /// `DuplicateVote` if the voter already has a ballot on this request.
    pub fn ensure_first_ballot(&self, store: &DataStore) -> Result<()> {
        let tags = [
            Self::by_request(self.vote.request.id),
            Self::by_voter(self.vote.voter.id),
        ];
        if store.sets().intersect(&tags).is_empty() {
            return Ok(());
        }
        Err(EntityError::DuplicateVote(format!(
            "user {} already voted on request {}",
            self.vote.voter.name, self.vote.request.id
        )))
    }
}

impl Model for ActiveVote {
    const NAME: &'static str = "ActiveVote";
    const KEYNAME: &'static str = "active_votes";

    type Storable = StorableActiveVote;
    type Normalized = NormalizedActiveVote;

    fn to_storable(&self) -> Result<StorableActiveVote> {
        Ok(StorableActiveVote {
            id: self.id,
            vote_id: self.vote.id,
            power: self.power,
        })
    }

    fn from_storable(repository: &Repository<'_>, storable: StorableActiveVote) -> Result<Self> {
        Ok(Self {
            id: storable.id,
            vote: repository.fetch(storable.vote_id)?,
            power: storable.power,
        })
    }

    fn normalize(&self) -> Result<NormalizedActiveVote> {
        Ok(NormalizedActiveVote {
            id: self.id,
            vote: self.vote.normalize()?,
            power: self.power,
        })
    }

    fn denormalize(normalized: NormalizedActiveVote, registry: &Registry) -> Result<Self> {
        Ok(Self {
            id: normalized.id,
            vote: Vote::denormalize(normalized.vote, registry)?,
            power: normalized.power,
        })
    }

    fn keynames(&self) -> Vec<String> {
        vec![
            Self::KEYNAME.to_string(),
            Self::by_vote(self.vote.id),
            Self::by_request(self.vote.request.id),
            Self::by_voter(self.vote.voter.id),
            Self::is_approved(self.vote.choice.is_approved()),
            Self::is_neutral(self.vote.choice.is_neutral()),
        ]
    }

    fn on_save(&self, service: &mut Service<'_>) -> Result<()> {
        self.ensure_first_ballot(service.store())?;

        if service.repository().exists(Vote::KEYNAME, self.vote.id) {
            return Err(EntityError::AlreadyExists(format!("vote {}", self.vote.id)));
        }

        service.insert(&self.vote)
    }

    fn on_delete(&self, service: &mut Service<'_>) -> Result<()> {
        if service.repository().exists(Vote::KEYNAME, self.vote.id) {
            service.remove(&self.vote)?;
        }
        Ok(())
    }
}
