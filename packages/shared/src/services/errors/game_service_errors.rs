use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repositories::errors::game_repository_errors::GameRepositoryError;

/// Transport-neutral classification of a failure. Adapters map these onto
/// their own status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    BadRequest,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameServiceError {
    #[error("max must be higher than the min")]
    InvalidRange { min: i64, max: i64 },
    #[error("the requested game does not exist")]
    GameNotFound(String),
    #[error("guess is out of bounds, must be between {min} and {max}")]
    OutOfBounds { min: i64, max: i64 },
    #[error("Repository error: {0}")]
    RepositoryError(GameRepositoryError),
}

impl GameServiceError {
    pub fn severity(&self) -> Severity {
        match self {
            GameServiceError::InvalidRange { .. } => Severity::BadRequest,
            GameServiceError::GameNotFound(_) => Severity::NotFound,
            GameServiceError::OutOfBounds { .. } => Severity::BadRequest,
            GameServiceError::RepositoryError(_) => Severity::Internal,
        }
    }
}

impl From<GameRepositoryError> for GameServiceError {
    fn from(err: GameRepositoryError) -> Self {
        GameServiceError::RepositoryError(err)
    }
}
