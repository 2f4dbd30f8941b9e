use crate::models::game::Game;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[cfg(test)]
use mockall::automock;

/// Storage for game records, keyed by game id.
///
/// Implementations must be linearizable per key: a reader never observes a
/// record that is only partly written.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn put_game(&self, game: &Game) -> Result<(), GameRepositoryError>;
    async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError>;
    async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError>;
    async fn list_games(&self) -> Result<Vec<Game>, GameRepositoryError>;
}

/// Process-lifetime store. Records are cloned in and out, so callers never
/// hold a reference into the map.
#[derive(Debug, Default)]
pub struct InMemoryGameRepository {
    games: DashMap<String, Game>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn put_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        match self.games.entry(game.id.clone()) {
            Entry::Occupied(_) => Err(GameRepositoryError::AlreadyExists(game.id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(game.clone());
                Ok(())
            }
        }
    }

    async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError> {
        self.games
            .get(game_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GameRepositoryError::NotFound(game_id.to_string()))
    }

    async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        match self.games.get_mut(&game.id) {
            Some(mut entry) => {
                *entry = game.clone();
                Ok(())
            }
            None => Err(GameRepositoryError::NotFound(game.id.clone())),
        }
    }

    async fn list_games(&self) -> Result<Vec<Game>, GameRepositoryError> {
        Ok(self
            .games
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
