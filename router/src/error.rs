//! Error types for routing and dispatch

use entity::EntityError;
use governance::GovernanceError;
use thiserror::Error;

use crate::codes::ResultCode;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}

impl RouterError {
    /// Code reported to the caller for this error.
    pub fn code(&self) -> ResultCode {
        match self {
            RouterError::RouteNotFound(_) => ResultCode::RouteNotFound,
            RouterError::InvalidRoute(_) => ResultCode::InvalidRoute,
            RouterError::InvalidRequest(_) => ResultCode::InvalidRequest,
            RouterError::Unauthenticated(_) | RouterError::Crypto(_) => {
                ResultCode::Unauthenticated
            }
            RouterError::Unauthorized(_) => ResultCode::Unauthorized,
            RouterError::InvalidPattern { .. }
            | RouterError::Config(_)
            | RouterError::Server(_)
            | RouterError::Io(_) => ResultCode::ServerError,
            RouterError::Entity(err) => entity_code(err),
            RouterError::Governance(err) => match err {
                GovernanceError::Entity(err) => entity_code(err),
                GovernanceError::InvalidRequest(_) => ResultCode::InvalidRequest,
                GovernanceError::Commit { .. } => ResultCode::ServerError,
            },
        }
    }
}

fn entity_code(err: &EntityError) -> ResultCode {
    match err {
        EntityError::NotFound(_) => ResultCode::NotFound,
        EntityError::Integrity(_) => ResultCode::ServerError,
        EntityError::AlreadyExists(_)
        | EntityError::DuplicateVote(_)
        | EntityError::Ambiguous { .. }
        | EntityError::Serialization(_)
        | EntityError::InvalidEntity(_)
        | EntityError::UnknownKeyname(_)
        | EntityError::InvalidPagination(_) => ResultCode::InvalidRequest,
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
