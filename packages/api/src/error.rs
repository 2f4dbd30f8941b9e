use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::dispatch::DispatchError;
use shared::services::errors::game_service_errors::{GameServiceError, Severity};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    GameService(#[from] GameServiceError),
}

impl ApiError {
    pub fn severity(&self) -> Severity {
        match self {
            ApiError::Dispatch(err) => err.severity(),
            ApiError::GameService(err) => err.severity(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.severity() {
            Severity::BadRequest => StatusCode::BAD_REQUEST,
            Severity::NotFound => StatusCode::NOT_FOUND,
            Severity::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
