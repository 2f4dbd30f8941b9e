use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::{error::ApiError, state::AppState};

/// Liveness plus a count of stored games. A store that cannot be listed
/// fails the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub games: usize,
}

#[instrument(skip(state))]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let games = state.game_service.list_games().await.map_err(|e| {
        error!("Health check could not list games: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        games: games.len(),
    }))
}
