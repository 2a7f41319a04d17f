//! Request and vote services.
//!
//! ```text
//! propose ──> ActiveRequest (threshold fixed) ──> Request ──> Keyname ──> Group
//!
//! vote ──> ActiveVote ──> Vote
//!   └─> tally all ActiveVotes of the request
//!         ├─ below threshold ........ Open
//!         ├─ approved >= threshold .. apply proposal, clean up, Committed
//!         └─ otherwise .............. clean up, Discarded
//! ```
//!
//! Each call is one store transaction: a failed commit of the proposed
//! mutation also undoes the vote that triggered it.

use entity::{DataStore, Entity, Registry, Representation, Service, UNBOUNDED};
use tracing::{debug, info, warn};

use crate::config::ThresholdPolicy;
use crate::error::{GovernanceError, Result};
use crate::request::{ActiveRequest, CompletedRequest, Outcome, Proposal, Request};
use crate::vote::{ActiveVote, Tally};

pub struct RequestService<'a> {
    service: Service<'a>,
}

impl<'a> RequestService<'a> {
    pub fn new(store: &'a mut DataStore, registry: &'a Registry) -> Self {
        Self {
            service: Service::new(store, registry),
        }
    }

    /// Persist an active request together with its core request.
    pub fn save(&mut self, request: &ActiveRequest) -> Result<()> {
        self.service.insert(request)?;
        info!(
            request_id = %request.request.id,
            active_request_id = %request.id,
            keyname = %request.request.keyname.name,
            threshold = request.threshold,
            "Request opened for voting"
        );
        Ok(())
    }

    /// Fix the threshold from `policy` and open `request` for voting.
    pub fn propose(&mut self, request: Request, policy: &ThresholdPolicy) -> Result<ActiveRequest> {
        let threshold = policy.threshold(&self.service.repository())?;
        let active = ActiveRequest::new(request, threshold);
        self.save(&active)?;
        Ok(active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteStatus {
    Open,
    Committed,
    Discarded,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStatus::Open => "open",
            VoteStatus::Committed => "committed",
            VoteStatus::Discarded => "discarded",
        }
    }
}

/// State of a request after a vote was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    pub tally: Tally,
    pub threshold: u64,
    pub status: VoteStatus,
    /// Log entry written when the vote resolved the request
    pub completed: Option<CompletedRequest>,
}

pub struct VoteService<'a> {
    service: Service<'a>,
}

impl<'a> VoteService<'a> {
    pub fn new(store: &'a mut DataStore, registry: &'a Registry) -> Self {
        Self {
            service: Service::new(store, registry),
        }
    }

    /// Record a vote and resolve the request if the threshold is met.
    ///
    /// `representation` applies the proposed mutation on approval; it must
    /// describe the same type the request was filed for.
    pub fn save(
        &mut self,
        vote: &ActiveVote,
        representation: &dyn Representation,
    ) -> Result<VoteOutcome> {
        self.service
            .atomically(|service| cast(service, vote, representation))
    }
}

fn cast(
    service: &mut Service<'_>,
    vote: &ActiveVote,
    representation: &dyn Representation,
) -> Result<VoteOutcome> {
    let active: ActiveRequest = service.repository().fetch(vote.vote.request.id)?;
    let expected = active.request.representation().meta_data().name();
    if representation.meta_data().name() != expected {
        return Err(GovernanceError::InvalidRequest(format!(
            "request {} proposes a {}, not a {}",
            active.request.id,
            expected,
            representation.meta_data().name()
        )));
    }

    // Ahead of the ID check in insert, so a resubmitted ballot is a duplicate.
    vote.ensure_first_ballot(service.store())?;
    service.insert(vote)?;
    debug!(
        request_id = %active.request.id,
        voter = %vote.vote.voter.name,
        power = vote.power,
        choice = ?vote.vote.choice,
        "Vote recorded"
    );

    let votes = service.repository().fetch_set_by_keyname::<ActiveVote>(
        &ActiveVote::by_request(active.id),
        0,
        UNBOUNDED,
    )?;
    let tally = Tally::from_votes(votes.instances());
    let resolution = tally.resolve(active.threshold);

    if !resolution.consensus_reached {
        return Ok(VoteOutcome {
            tally,
            threshold: active.threshold,
            status: VoteStatus::Open,
            completed: None,
        });
    }

    let outcome = if resolution.is_approved {
        apply(service, &active.request, representation).map_err(|source| {
            GovernanceError::Commit {
                request_id: active.request.id,
                source,
            }
        })?;
        Outcome::Committed
    } else {
        Outcome::Discarded
    };

    for resolved in votes.instances() {
        if let Err(e) = service.remove(resolved) {
            warn!(vote_id = %resolved.id, error = %e, "Failed to delete resolved vote");
        }
    }

    let completed = CompletedRequest::new(active.request.clone(), active.threshold, tally, outcome);
    service.insert(&completed)?;

    if let Err(e) = service.remove(&active) {
        warn!(active_request_id = %active.id, error = %e, "Failed to delete resolved request");
    }

    info!(
        request_id = %active.request.id,
        outcome = outcome.as_str(),
        approved = tally.approved,
        disapproved = tally.disapproved,
        neutral = tally.neutral,
        threshold = active.threshold,
        "Request resolved"
    );

    Ok(VoteOutcome {
        tally,
        threshold: active.threshold,
        status: match outcome {
            Outcome::Committed => VoteStatus::Committed,
            Outcome::Discarded => VoteStatus::Discarded,
        },
        completed: Some(completed),
    })
}

fn apply(
    service: &mut Service<'_>,
    request: &Request,
    representation: &dyn Representation,
) -> entity::Result<()> {
    match &request.proposal {
        Proposal::Save(ins) => {
            debug!(entity = representation.meta_data().name(), id = %ins.id(), "Committing save");
            service.save(ins.as_ref(), representation)
        }
        Proposal::Delete(ins) => {
            debug!(entity = representation.meta_data().name(), id = %ins.id(), "Committing delete");
            service.delete(ins.as_ref(), representation)
        }
    }
}
