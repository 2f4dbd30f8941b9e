use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::models::game::{
    Game, GameRange, GameRecord, GameView, Outcome, TOO_HIGH_MESSAGE, TOO_LOW_MESSAGE,
    WIN_MESSAGE,
};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::GameRepository;
use crate::services::errors::game_service_errors::GameServiceError;

/// Range used for games created at startup.
pub const SEED_RANGE: GameRange = GameRange { min: 0, max: 100 };

/// Game rules on top of a [`GameRepository`].
///
/// Guesses against one game are serialized through a per-game mutex so the
/// fetch, evaluate and store steps act as one update. Guesses against
/// different games do not contend.
#[derive(Clone)]
pub struct GameService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    guess_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl GameService {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>) -> Self {
        GameService {
            repository,
            guess_locks: Arc::new(DashMap::new()),
        }
    }

    #[instrument(skip(self))]
    pub async fn create_game(&self, range: GameRange) -> Result<Game, GameServiceError> {
        if !range.is_valid() {
            return Err(GameServiceError::InvalidRange {
                min: range.min,
                max: range.max,
            });
        }

        let game = Game::new(range);
        self.repository.put_game(&game).await?;
        // A guess may already have created the lock once the record became
        // visible; never replace it.
        self.guess_locks.entry(game.id.clone()).or_default();

        info!(
            "Created game {} with range {}..{}",
            game.id, range.min, range.max
        );
        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn submit_guess(&self, game_id: &str, value: i64) -> Result<Game, GameServiceError> {
        let lock = self.guess_lock(game_id).await?;
        let _guard = lock.lock().await;

        let game = self.fetch_game(game_id).await?;
        if game.ended {
            debug!("Game {} already ended, returning final state", game_id);
            return Ok(game);
        }
        if !game.range.contains(value) {
            return Err(GameServiceError::OutOfBounds {
                min: game.range.min,
                max: game.range.max,
            });
        }

        let updated = evaluate_guess(&game, value);
        self.repository.update_game(&updated).await?;

        if updated.ended {
            info!("Game {} won with guess {}", game_id, value);
        } else {
            debug!("Game {} guess {} was {}", game_id, value, updated.outcome);
        }
        Ok(updated)
    }

    /// Public projection of every stored game, keyed by id.
    pub async fn list_games(&self) -> Result<HashMap<String, GameView>, GameServiceError> {
        let games = self.repository.list_games().await?;
        Ok(games
            .iter()
            .map(|game| (game.id.clone(), game.view()))
            .collect())
    }

    /// Full state of every stored game, answer included.
    pub async fn game_records(&self) -> Result<Vec<GameRecord>, GameServiceError> {
        let games = self.repository.list_games().await?;
        Ok(games.iter().map(GameRecord::from).collect())
    }

    pub async fn seed_games(&self, count: usize) -> Result<Vec<Game>, GameServiceError> {
        let mut games = Vec::with_capacity(count);
        for _ in 0..count {
            games.push(self.create_game(SEED_RANGE).await?);
        }
        Ok(games)
    }

    /// Looks up the mutex for a game. Games stored by some other writer get
    /// one on first use; unknown ids never allocate an entry.
    async fn guess_lock(&self, game_id: &str) -> Result<Arc<Mutex<()>>, GameServiceError> {
        let existing = self
            .guess_locks
            .get(game_id)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(lock) = existing {
            return Ok(lock);
        }

        self.fetch_game(game_id).await?;
        Ok(Arc::clone(
            self.guess_locks
                .entry(game_id.to_string())
                .or_default()
                .value(),
        ))
    }

    async fn fetch_game(&self, game_id: &str) -> Result<Game, GameServiceError> {
        self.repository
            .get_game(game_id)
            .await
            .map_err(|e| match e {
                GameRepositoryError::NotFound(id) => GameServiceError::GameNotFound(id),
                _ => GameServiceError::from(e),
            })
    }
}

/// Applies an in-bounds guess to a running game.
fn evaluate_guess(game: &Game, value: i64) -> Game {
    let (outcome, message) = match value.cmp(&game.answer) {
        Ordering::Equal => (Outcome::Equal, WIN_MESSAGE),
        Ordering::Greater => (Outcome::TooHigh, TOO_HIGH_MESSAGE),
        Ordering::Less => (Outcome::TooLow, TOO_LOW_MESSAGE),
    };

    Game {
        outcome,
        ended: outcome == Outcome::Equal,
        message: message.to_string(),
        ..game.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::WELCOME_MESSAGE;
    use crate::repositories::game_repository::{InMemoryGameRepository, MockGameRepository};
    use crate::services::errors::game_service_errors::Severity;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
    use std::time::Duration;

    fn create_test_service() -> (GameService, Arc<InMemoryGameRepository>) {
        let repository = Arc::new(InMemoryGameRepository::new());
        (GameService::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_create_game() {
        let (service, repository) = create_test_service();

        let game = service.create_game(GameRange::new(0, 100)).await.unwrap();

        assert!(!game.id.is_empty());
        assert_eq!(game.outcome, Outcome::None);
        assert!(!game.ended);
        assert_eq!(game.message, WELCOME_MESSAGE);
        assert!(game.answer >= 0 && game.answer < 100);
        assert_eq!(repository.get_game(&game.id).await.unwrap(), game);
    }

    #[rstest]
    #[case(100, 0)]
    #[case(100, 100)]
    #[case(-1, -2)]
    #[tokio::test]
    async fn test_create_game_invalid_range(#[case] min: i64, #[case] max: i64) {
        let (service, repository) = create_test_service();

        let result = service.create_game(GameRange::new(min, max)).await;

        let error = result.unwrap_err();
        assert_eq!(error, GameServiceError::InvalidRange { min, max });
        assert_eq!(error.to_string(), "max must be higher than the min");
        assert!(repository.is_empty());
    }

    #[tokio::test]
    async fn test_guess_too_high_and_too_low() {
        let (service, repository) = create_test_service();
        let game = Game::with_answer(GameRange::new(0, 100), 50);
        repository.put_game(&game).await.unwrap();

        let high = service.submit_guess(&game.id, game.answer + 1).await.unwrap();
        assert_eq!(high.outcome, Outcome::TooHigh);
        assert!(!high.ended);
        assert_eq!(high.message, TOO_HIGH_MESSAGE);

        let low = service.submit_guess(&game.id, game.answer - 1).await.unwrap();
        assert_eq!(low.outcome, Outcome::TooLow);
        assert!(!low.ended);
        assert_eq!(low.message, TOO_LOW_MESSAGE);

        assert_eq!(low.id, game.id);
        assert_eq!(low.answer, game.answer);
        assert_eq!(low.range, game.range);
    }

    #[tokio::test]
    async fn test_winning_guess_freezes_game() {
        let (service, repository) = create_test_service();
        let game = service.create_game(GameRange::new(0, 100)).await.unwrap();

        let won = service.submit_guess(&game.id, game.answer).await.unwrap();
        assert_eq!(won.outcome, Outcome::Equal);
        assert!(won.ended);
        assert_eq!(won.message, WIN_MESSAGE);

        // Terminal games ignore even out-of-bounds guesses.
        for value in [game.answer, 0, 99, 5000] {
            let again = service.submit_guess(&game.id, value).await.unwrap();
            assert_eq!(again, won);
            assert_eq!(
                serde_json::to_vec(&again.view()).unwrap(),
                serde_json::to_vec(&won.view()).unwrap()
            );
        }
        assert_eq!(repository.get_game(&game.id).await.unwrap(), won);
    }

    #[tokio::test]
    async fn test_guess_out_of_bounds_leaves_record_unchanged() {
        let (service, repository) = create_test_service();
        let game = service.create_game(GameRange::new(0, 100)).await.unwrap();

        for _ in 0..2 {
            let error = service.submit_guess(&game.id, 5000).await.unwrap_err();
            assert_eq!(error, GameServiceError::OutOfBounds { min: 0, max: 100 });
            assert!(error.to_string().contains('0'));
            assert!(error.to_string().contains("100"));
        }
        let error = service.submit_guess(&game.id, -1).await.unwrap_err();
        assert_eq!(error.severity(), Severity::BadRequest);

        assert_eq!(repository.get_game(&game.id).await.unwrap(), game);
    }

    #[tokio::test]
    async fn test_guess_bounds_are_inclusive() {
        let (service, _) = create_test_service();
        let game = service.create_game(GameRange::new(0, 100)).await.unwrap();

        let result = service.submit_guess(&game.id, 100).await.unwrap();
        assert_eq!(result.outcome, Outcome::TooHigh);
    }

    #[tokio::test]
    async fn test_guess_unknown_game() {
        let (service, _) = create_test_service();

        for _ in 0..2 {
            let error = service.submit_guess("Fake", 5000).await.unwrap_err();
            assert_eq!(error, GameServiceError::GameNotFound("Fake".to_string()));
            assert_eq!(error.to_string(), "the requested game does not exist");
            assert_eq!(error.severity(), Severity::NotFound);
        }
        assert!(service.guess_locks.is_empty());
    }

    #[tokio::test]
    async fn test_guess_on_game_stored_elsewhere() {
        let (service, repository) = create_test_service();
        let game = Game::with_answer(GameRange::new(0, 10), 7);
        repository.put_game(&game).await.unwrap();

        let result = service.submit_guess(&game.id, 7).await.unwrap();
        assert!(result.ended);
    }

    #[tokio::test]
    async fn test_list_games_and_records() {
        let (service, _) = create_test_service();
        let first = service.create_game(GameRange::new(0, 10)).await.unwrap();
        let second = service.create_game(GameRange::new(-50, 50)).await.unwrap();

        let games = service.list_games().await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[&first.id], first.view());
        assert_eq!(games[&second.id], second.view());

        let records = service.game_records().await.unwrap();
        let record = records
            .iter()
            .find(|record| record.game_id == second.id)
            .unwrap();
        assert_eq!(record.answer, second.answer);
        assert_eq!(record.min, -50);
        assert_eq!(record.max, 50);
    }

    #[tokio::test]
    async fn test_seed_games() {
        let (service, repository) = create_test_service();

        let games = service.seed_games(10).await.unwrap();

        assert_eq!(games.len(), 10);
        assert_eq!(repository.len(), 10);
        assert!(games.iter().all(|game| game.range == SEED_RANGE));
    }

    #[tokio::test]
    async fn test_create_game_repository_failure_is_internal() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_put_game()
            .returning(|game| Err(GameRepositoryError::AlreadyExists(game.id.clone())));

        let service = GameService::new(Arc::new(mock_repo));
        let error = service.create_game(GameRange::new(0, 10)).await.unwrap_err();

        assert!(matches!(error, GameServiceError::RepositoryError(_)));
        assert_eq!(error.severity(), Severity::Internal);
        assert!(service.guess_locks.is_empty());
    }

    #[tokio::test]
    async fn test_guess_update_failure_is_internal() {
        let stored = Game::with_answer(GameRange::new(0, 10), 5);
        let returned = stored.clone();

        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_get_game()
            .returning(move |_| Ok(returned.clone()));
        mock_repo
            .expect_update_game()
            .times(1)
            .returning(|game| Err(GameRepositoryError::NotFound(game.id.clone())));

        let service = GameService::new(Arc::new(mock_repo));
        let error = service.submit_guess(&stored.id, 3).await.unwrap_err();

        assert_eq!(error.severity(), Severity::Internal);
    }

    /// Counts stored transitions into the terminal state.
    struct CountingRepository {
        inner: InMemoryGameRepository,
        wins: AtomicUsize,
    }

    #[async_trait]
    impl GameRepository for CountingRepository {
        async fn put_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            self.inner.put_game(game).await
        }
        async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError> {
            self.inner.get_game(game_id).await
        }
        async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            if game.ended {
                self.wins.fetch_add(1, AtomicOrdering::SeqCst);
            }
            self.inner.update_game(game).await
        }
        async fn list_games(&self) -> Result<Vec<Game>, GameRepositoryError> {
            self.inner.list_games().await
        }
    }

    /// Stored records become visible before `put_game` returns.
    struct SlowPutRepository {
        inner: InMemoryGameRepository,
    }

    #[async_trait]
    impl GameRepository for SlowPutRepository {
        async fn put_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            self.inner.put_game(game).await?;
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }
        async fn get_game(&self, game_id: &str) -> Result<Game, GameRepositoryError> {
            self.inner.get_game(game_id).await
        }
        async fn update_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
            self.inner.update_game(game).await
        }
        async fn list_games(&self) -> Result<Vec<Game>, GameRepositoryError> {
            self.inner.list_games().await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_create_keeps_lock_taken_by_early_guess() {
        let service = GameService::new(Arc::new(SlowPutRepository {
            inner: InMemoryGameRepository::new(),
        }));

        let creating = {
            let service = service.clone();
            tokio::spawn(async move { service.create_game(GameRange::new(0, 100)).await })
        };
        let game_id = loop {
            if let Some(id) = service.list_games().await.unwrap().into_keys().next() {
                break id;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        };

        let held = service.guess_lock(&game_id).await.unwrap();
        let guard = held.lock().await;
        let game = creating.await.unwrap().unwrap();
        assert_eq!(game.id, game_id);

        let stored = Arc::clone(service.guess_locks.get(&game_id).unwrap().value());
        assert!(Arc::ptr_eq(&held, &stored));

        let blocked = tokio::time::timeout(
            Duration::from_millis(200),
            service.submit_guess(&game_id, game.answer),
        )
        .await;
        assert!(blocked.is_err());

        drop(guard);
        let result = service.submit_guess(&game_id, game.answer).await.unwrap();
        assert!(result.ended);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_guesses_on_one_game() {
        let (service, repository) = create_test_service();
        let game = service.create_game(GameRange::new(0, 1000)).await.unwrap();

        let values: Vec<i64> = (0..=1000).filter(|v| *v != game.answer).take(100).collect();
        let handles: Vec<_> = values
            .iter()
            .map(|&value| {
                let service = service.clone();
                let game_id = game.id.clone();
                tokio::spawn(async move { service.submit_guess(&game_id, value).await })
            })
            .collect();

        let mut responses = Vec::new();
        for handle in handles {
            responses.push(handle.await.unwrap().unwrap());
        }

        let stored = repository.get_game(&game.id).await.unwrap();
        assert!(!stored.ended);
        assert_eq!(stored.answer, game.answer);
        assert!(responses.contains(&stored));
        let expected_message = match stored.outcome {
            Outcome::TooHigh => TOO_HIGH_MESSAGE,
            Outcome::TooLow => TOO_LOW_MESSAGE,
            other => panic!("unexpected outcome {other}"),
        };
        assert_eq!(stored.message, expected_message);
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_winning_guesses_win_once() {
        let repository = Arc::new(CountingRepository {
            inner: InMemoryGameRepository::new(),
            wins: AtomicUsize::new(0),
        });
        let service = GameService::new(repository.clone());
        let game = service.create_game(GameRange::new(0, 1000)).await.unwrap();

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let service = service.clone();
                let game_id = game.id.clone();
                let answer = game.answer;
                tokio::spawn(async move { service.submit_guess(&game_id, answer).await })
            })
            .collect();

        let mut views = HashSet::new();
        for handle in handles {
            let game = handle.await.unwrap().unwrap();
            assert!(game.ended);
            views.insert(serde_json::to_string(&game.view()).unwrap());
        }

        assert_eq!(repository.wins.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(views.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_guesses_on_different_games_are_independent() {
        let (service, _) = create_test_service();
        let mut games = Vec::new();
        for _ in 0..20 {
            games.push(service.create_game(GameRange::new(0, 10)).await.unwrap());
        }

        let handles: Vec<_> = games
            .iter()
            .map(|game| {
                let service = service.clone();
                let game = game.clone();
                tokio::spawn(async move { service.submit_guess(&game.id, game.answer).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().outcome, Outcome::Equal);
        }
    }
}
