use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::GameResult;

/// Durable row holding the best result for a (player, mode) pair.
///
/// `id` and `created_at` are assigned on first insertion and survive every
/// later improvement; only the metric fields change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BestRecord {
    pub id: i64,
    pub player_name: String,
    pub game_mode: u32,
    pub score: f64,
    pub lps: f64,
    pub accuracy: f64,
    #[serde(rename = "rank")]
    pub rank_label: String,
    pub time: f64,
    pub ms_per_letter: f64,
    pub created_at: DateTime<Utc>,
}

impl BestRecord {
    /// Build the record a store returns after inserting `result`
    pub fn from_result(id: i64, result: &GameResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            player_name: result.player_name.clone(),
            game_mode: result.game_mode,
            score: result.score,
            lps: result.lps,
            accuracy: result.accuracy,
            rank_label: result.rank_label.clone(),
            time: result.time,
            ms_per_letter: result.ms_per_letter,
            created_at,
        }
    }

    /// `lps * (accuracy/100)^2`
    pub fn weighted_score(&self) -> f64 {
        let fraction = self.accuracy / 100.0;
        self.lps * fraction * fraction
    }

    /// Overwrite the metric fields, leaving identity untouched
    pub fn apply(&mut self, update: &ScoreUpdate) {
        self.score = update.score;
        self.lps = update.lps;
        self.accuracy = update.accuracy;
        self.rank_label = update.rank_label.clone();
        self.time = update.time;
        self.ms_per_letter = update.ms_per_letter;
    }
}

/// The mutable metric fields of a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreUpdate {
    pub score: f64,
    pub lps: f64,
    pub accuracy: f64,
    #[serde(rename = "rank")]
    pub rank_label: String,
    pub time: f64,
    pub ms_per_letter: f64,
}

impl From<&GameResult> for ScoreUpdate {
    fn from(result: &GameResult) -> Self {
        Self {
            score: result.score,
            lps: result.lps,
            accuracy: result.accuracy,
            rank_label: result.rank_label.clone(),
            time: result.time,
            ms_per_letter: result.ms_per_letter,
        }
    }
}

/// Public leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position on the board
    pub position: usize,
    pub id: i64,
    pub player_name: String,
    pub game_mode: u32,
    pub score: f64,
    pub lps: f64,
    pub accuracy: f64,
    pub rank: String,
    pub time: f64,
    pub ms_per_letter: f64,
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(position: usize, record: BestRecord) -> Self {
        Self {
            position,
            id: record.id,
            player_name: record.player_name,
            game_mode: record.game_mode,
            score: record.score,
            lps: record.lps,
            accuracy: record.accuracy,
            rank: record.rank_label,
            time: record.time,
            ms_per_letter: record.ms_per_letter,
            created_at: record.created_at,
        }
    }
}
