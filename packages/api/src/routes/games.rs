use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{error, instrument, warn};

use crate::{error::ApiError, state::AppState};
use shared::dispatch::dispatch;
use shared::models::game::GameView;
use shared::models::requests::{CreateGameRequest, GuessRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/game", post(create_game))
        .route("/guess", post(guess))
        .route("/games", get(list_games))
}

#[instrument(skip(state, body))]
async fn create_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let service = state.game_service.clone();
    dispatch(&body, |request: CreateGameRequest| async move {
        service
            .create_game(request.range())
            .await
            .map(|game| game.view())
    })
    .await
    .map(Json)
    .map_err(|e| {
        warn!("Failed to create game: {}", e);
        ApiError::from(e)
    })
}

#[instrument(skip(state, body))]
async fn guess(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let service = state.game_service.clone();
    dispatch(&body, |request: GuessRequest| async move {
        let (game_id, value) = request.into_parts();
        service
            .submit_guess(&game_id, value)
            .await
            .map(|game| game.view())
    })
    .await
    .map(Json)
    .map_err(|e| {
        warn!("Failed to evaluate guess: {}", e);
        ApiError::from(e)
    })
}

#[instrument(skip(state))]
async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<HashMap<String, GameView>>, ApiError> {
    state.game_service.list_games().await.map(Json).map_err(|e| {
        error!("Failed to list games: {}", e);
        ApiError::from(e)
    })
}
