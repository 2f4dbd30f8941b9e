use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameRepositoryError {
    #[error("Game not found: {0}")]
    NotFound(String),
    #[error("Game already exists: {0}")]
    AlreadyExists(String),
}
