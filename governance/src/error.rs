//! Error types for the governance engine

use entity::EntityError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to commit request {request_id}: {source}")]
    Commit {
        request_id: Uuid,
        #[source]
        source: EntityError,
    },
}

impl GovernanceError {
    pub fn is_duplicate_vote(&self) -> bool {
        matches!(self, GovernanceError::Entity(EntityError::DuplicateVote(_)))
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
