use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "Welcome to the game!";
pub const WIN_MESSAGE: &str = "Excelsior, you win!!";
pub const TOO_HIGH_MESSAGE: &str = "Fiddlesticks, that's too high";
pub const TOO_LOW_MESSAGE: &str = "Dingleberries, that's too low!";

/// Bounds a game's answer is drawn from. `max` is exclusive for the draw but
/// inclusive when bounds-checking guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRange {
    pub min: i64,
    pub max: i64,
}

impl GameRange {
    pub fn new(min: i64, max: i64) -> Self {
        GameRange { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min < self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Result of the most recent guess against the hidden answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    None,
    TooLow,
    TooHigh,
    Equal,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::None => "None",
            Outcome::TooLow => "TooLow",
            Outcome::TooHigh => "TooHigh",
            Outcome::Equal => "Equal",
        };
        f.write_str(label)
    }
}

/// A stored game. Only `outcome`, `ended` and `message` ever change, and not
/// at all once `ended` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    pub range: GameRange,
    pub answer: i64,
    pub outcome: Outcome,
    pub ended: bool,
    pub message: String,
}

impl Game {
    /// Draws the answer uniformly from `[range.min, range.max)`.
    ///
    /// Callers must check `range.is_valid()` first; an empty range panics.
    pub fn new(range: GameRange) -> Self {
        let answer = rand::thread_rng().gen_range(range.min..range.max);
        Game::with_answer(range, answer)
    }

    pub fn with_answer(range: GameRange, answer: i64) -> Self {
        Game {
            id: Uuid::new_v4().to_string(),
            range,
            answer,
            outcome: Outcome::None,
            ended: false,
            message: WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn view(&self) -> GameView {
        GameView::from(self)
    }

    pub fn record(&self) -> GameRecord {
        GameRecord::from(self)
    }
}

/// Public projection returned by create and guess. Withholds the answer and
/// the raw bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub id: String,
    #[serde(rename = "result")]
    pub outcome: String,
    pub ended: bool,
    pub message: String,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        GameView {
            id: game.id.clone(),
            outcome: game.outcome.to_string(),
            ended: game.ended,
            message: game.message.clone(),
        }
    }
}

/// Diagnostic projection. Exposes the answer, so it is only served on the
/// admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: String,
    pub result: String,
    pub ended: bool,
    pub answer: i64,
    pub min: i64,
    pub max: i64,
}

impl From<&Game> for GameRecord {
    fn from(game: &Game) -> Self {
        GameRecord {
            game_id: game.id.clone(),
            result: game.outcome.to_string(),
            ended: game.ended,
            answer: game.answer,
            min: game.range.min,
            max: game.range.max,
        }
    }
}
