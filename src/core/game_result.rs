use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreEngineError};

/// One finished game's raw performance metrics.
///
/// Field names follow the `game_results` relation so a result serializes
/// straight into a row-shaped JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameResult {
    /// Player identifier (display name or social handle)
    pub player_name: String,

    /// Words per game (15, 30, 60)
    pub game_mode: u32,

    /// Primary score
    pub score: f64,

    /// Letters per second
    #[serde(default)]
    pub lps: f64,

    /// Accuracy percentage (0-100)
    #[serde(default)]
    pub accuracy: f64,

    /// Skill tier label shown next to the score
    #[serde(default, rename = "rank")]
    pub rank_label: String,

    /// Elapsed time in seconds
    #[serde(default)]
    pub time: f64,

    /// Average milliseconds per letter
    #[serde(default)]
    pub ms_per_letter: f64,
}

impl GameResult {
    /// Create a result with the identifying fields set and neutral metrics
    pub fn new(player_name: impl Into<String>, game_mode: u32, score: f64) -> Self {
        Self {
            player_name: player_name.into(),
            game_mode,
            score,
            lps: 0.0,
            accuracy: 100.0,
            rank_label: String::new(),
            time: 1.0,
            ms_per_letter: 1.0,
        }
    }

    /// Builder-style setter for speed and accuracy
    pub fn with_metrics(mut self, lps: f64, accuracy: f64) -> Self {
        self.lps = lps;
        self.accuracy = accuracy;
        self
    }

    /// Builder-style setter for the timing fields
    pub fn with_timing(mut self, time: f64, ms_per_letter: f64) -> Self {
        self.time = time;
        self.ms_per_letter = ms_per_letter;
        self
    }

    pub fn with_rank_label(mut self, label: impl Into<String>) -> Self {
        self.rank_label = label.into();
        self
    }

    /// Reject malformed results before anything touches a store.
    pub fn validate(&self, allowed_modes: &[u32]) -> Result<()> {
        if self.player_name.trim().is_empty() {
            return Err(ScoreEngineError::Validation("player_name is empty".into()));
        }
        if self.game_mode == 0 || (!allowed_modes.is_empty() && !allowed_modes.contains(&self.game_mode)) {
            return Err(ScoreEngineError::Validation(format!(
                "unsupported game_mode {}",
                self.game_mode
            )));
        }
        if !self.score.is_finite() || self.score < 0.0 {
            return Err(ScoreEngineError::Validation(format!("invalid score {}", self.score)));
        }
        if !self.lps.is_finite() || self.lps < 0.0 {
            return Err(ScoreEngineError::Validation(format!("invalid lps {}", self.lps)));
        }
        if !(0.0..=100.0).contains(&self.accuracy) {
            return Err(ScoreEngineError::Validation(format!(
                "accuracy {} outside 0-100",
                self.accuracy
            )));
        }
        if !self.time.is_finite() || self.time <= 0.0 {
            return Err(ScoreEngineError::Validation(format!("invalid time {}", self.time)));
        }
        if !self.ms_per_letter.is_finite() || self.ms_per_letter <= 0.0 {
            return Err(ScoreEngineError::Validation(format!(
                "invalid ms_per_letter {}",
                self.ms_per_letter
            )));
        }
        Ok(())
    }

    /// Get display string for logging
    pub fn display(&self) -> String {
        format!(
            "{} [{}w] score={} lps={:.2} acc={:.1}%",
            self.player_name, self.game_mode, self.score, self.lps, self.accuracy
        )
    }
}

/// Loosely-typed wire form of a result.
///
/// The identifying fields are optional so a missing one is reported as a
/// validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub game_mode: Option<u32>,
    #[serde(default)]
    pub lps: f64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub ms_per_letter: f64,
}

impl TryFrom<ResultPayload> for GameResult {
    type Error = ScoreEngineError;

    fn try_from(payload: ResultPayload) -> Result<Self> {
        let (player_name, score, game_mode) = match (payload.player_name, payload.score, payload.game_mode) {
            (Some(name), Some(score), Some(mode)) if !name.is_empty() => (name, score, mode),
            _ => return Err(ScoreEngineError::Validation("Missing required fields".into())),
        };

        Ok(GameResult {
            player_name,
            game_mode,
            score,
            lps: payload.lps,
            accuracy: payload.accuracy,
            rank_label: payload.rank,
            time: payload.time,
            ms_per_letter: payload.ms_per_letter,
        })
    }
}
