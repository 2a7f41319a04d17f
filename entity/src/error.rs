//! Error types for the entity store

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Duplicate vote: {0}")]
    DuplicateVote(String),

    #[error("Ambiguous lookup: {count} entities match {tags}")]
    Ambiguous { tags: String, count: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Unknown keyname: {0}")]
    UnknownKeyname(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl From<serde_json::Error> for EntityError {
    fn from(err: serde_json::Error) -> Self {
        EntityError::Serialization(err.to_string())
    }
}

impl EntityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntityError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, EntityError>;
