use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::{error::ApiError, state::AppState};
use shared::models::game::GameRecord;

/// Every stored game with its answer. Only mounted when diagnostics are
/// enabled in [`crate::config::Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    pub games: Vec<GameRecord>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/games", get(game_state))
}

#[instrument(skip(state))]
async fn game_state(
    State(state): State<AppState>,
) -> Result<Json<GameStateResponse>, ApiError> {
    state
        .game_service
        .game_records()
        .await
        .map(|games| Json(GameStateResponse { games }))
        .map_err(|e| {
            error!("Failed to read game state: {}", e);
            ApiError::from(e)
        })
}
