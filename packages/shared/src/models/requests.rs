use serde::{Deserialize, Serialize};

use crate::dispatch::Validate;
use crate::models::game::GameRange;

/// Body of a create-game request. Fields are optional so a missing bound is
/// reported as a validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl CreateGameRequest {
    pub fn new(min: i64, max: i64) -> Self {
        CreateGameRequest {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Only meaningful after `validate` has passed.
    pub fn range(&self) -> GameRange {
        GameRange::new(self.min.unwrap_or_default(), self.max.unwrap_or_default())
    }
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), String> {
        match (self.min, self.max) {
            (None, None) => Err("min and max are required".to_string()),
            (None, _) => Err("min is required".to_string()),
            (_, None) => Err("max is required".to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    pub game_id: Option<String>,
    pub guess: Option<i64>,
}

impl GuessRequest {
    pub fn new(game_id: &str, guess: i64) -> Self {
        GuessRequest {
            game_id: Some(game_id.to_string()),
            guess: Some(guess),
        }
    }

    /// Only meaningful after `validate` has passed.
    pub fn into_parts(self) -> (String, i64) {
        (
            self.game_id.unwrap_or_default(),
            self.guess.unwrap_or_default(),
        )
    }
}

impl Validate for GuessRequest {
    fn validate(&self) -> Result<(), String> {
        match self.game_id.as_deref() {
            None | Some("") => return Err("gameId is required".to_string()),
            Some(_) => {}
        }
        if self.guess.is_none() {
            return Err("guess is required".to_string());
        }
        Ok(())
    }
}
