//! Governance - vote-gated mutations of the entity store
//!
//! Nothing changes in the store without a vote. A stakeholder files a
//! [`Request`] proposing to save or delete an entity; it becomes an
//! [`ActiveRequest`] with a threshold fixed at that moment. Stakeholders cast
//! [`Vote`]s, each wrapped in an [`ActiveVote`] that freezes the voter's
//! power. Once enough power has voted the request is resolved:
//!
//! | Tally                         | Result                                  |
//! |-------------------------------|-----------------------------------------|
//! | total < threshold             | stays open                              |
//! | approved >= threshold         | mutation applied, votes + request gone  |
//! | total >= threshold, otherwise | discarded, votes + request gone         |
//!
//! Either way a [`CompletedRequest`] records the outcome.

pub mod config;
pub mod error;
pub mod group;
pub mod ids;
pub mod keyname;
pub mod request;
pub mod service;
pub mod user;
pub mod vote;

pub use config::{GovernanceConfig, ThresholdPolicy};
pub use error::{GovernanceError, Result};
pub use group::Group;
pub use keyname::{Keyname, NormalizedKeyname};
pub use request::{
    ActiveRequest, CompletedRequest, NormalizedActiveRequest, NormalizedCompletedRequest,
    NormalizedRequest, Outcome, Proposal, Request,
};
pub use service::{RequestService, VoteOutcome, VoteService, VoteStatus};
pub use user::User;
pub use vote::{ActiveVote, NormalizedActiveVote, NormalizedVote, Resolution, Tally, Vote, VoteChoice};
