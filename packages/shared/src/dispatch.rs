//! Shared request pipeline: decode, validate, run the operation, classify
//! any failure and encode the result.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::services::errors::game_service_errors::{GameServiceError, Severity};

/// Structural checks on a decoded request, run before the operation.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("invalid request body: {0}")]
    DecodeFailed(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error(transparent)]
    Game(#[from] GameServiceError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn severity(&self) -> Severity {
        match self {
            DispatchError::DecodeFailed(_) | DispatchError::ValidationFailed(_) => {
                Severity::BadRequest
            }
            DispatchError::Game(err) => err.severity(),
            DispatchError::Internal(_) => Severity::Internal,
        }
    }
}

/// Runs `operation` on a JSON payload.
///
/// The operation is only invoked once the payload decodes into `I` and
/// passes validation. Its output is returned as a JSON value.
pub async fn dispatch<I, O, F, Fut>(payload: &[u8], operation: F) -> Result<Value, DispatchError>
where
    I: DeserializeOwned + Validate,
    O: Serialize,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<O, GameServiceError>>,
{
    let input: I = serde_json::from_slice(payload)
        .map_err(|e| DispatchError::DecodeFailed(e.to_string()))?;
    input.validate().map_err(DispatchError::ValidationFailed)?;

    let output = operation(input).await?;

    serde_json::to_value(output).map_err(|e| DispatchError::Internal(e.to_string()))
}
