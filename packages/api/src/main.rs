use std::sync::Arc;

use api::{config::Config, create_app, state::AppState};
use shared::repositories::game_repository::InMemoryGameRepository;
use shared::services::game_service::GameService;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting, stand by");
    let config = Config::from_env()?;

    let game_repository = Arc::new(InMemoryGameRepository::new());
    let game_service = Arc::new(GameService::new(game_repository.clone()));

    if config.seed_games > 0 {
        let games = game_service.seed_games(config.seed_games).await?;
        info!(
            "Seeded {} games, store holds {}",
            games.len(),
            game_repository.len()
        );
    }
    if config.diagnostics_enabled {
        warn!("Diagnostics enabled, GET /admin/games exposes game answers");
    }

    let app = create_app(AppState { game_service }, &config);

    let listener = TcpListener::bind(config.socket_addr()).await?;
    info!("Server is up on {}! Go play :)", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
