use serde::{Deserialize, Serialize};

/// Local, non-authoritative mirror of a best record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub best_score: f64,
    pub record_id: Option<i64>,
}

impl CacheEntry {
    pub fn new(best_score: f64, record_id: Option<i64>) -> Self {
        Self { best_score, record_id }
    }
}

/// Result of a submission, as reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// False only when a durable write failed
    #[serde(rename = "success")]
    pub accepted: bool,

    /// True iff this call inserted or updated the durable record
    pub is_new_best: bool,

    /// Durable record id, when known
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitOutcome {
    pub fn new_best(record_id: i64) -> Self {
        Self {
            accepted: true,
            is_new_best: true,
            record_id: Some(record_id),
            error: None,
        }
    }

    pub fn unchanged(record_id: Option<i64>) -> Self {
        Self {
            accepted: true,
            is_new_best: false,
            record_id,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            is_new_best: false,
            record_id: None,
            error: Some(error.into()),
        }
    }
}

/// Best cached score across all modes for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    pub best_score: Option<f64>,
    pub best_game_mode: Option<u32>,
    pub has_profile: bool,
}
