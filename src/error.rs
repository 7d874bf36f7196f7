use std::time::Duration;
use thiserror::Error;

/// Main error type for the score engine
#[derive(Error, Debug)]
pub enum ScoreEngineError {
    /// Malformed result, rejected before any store access
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No durable record matched (an outcome on reads, an error on updates)
    #[error("No record found: {0}")]
    NotFound(String),

    /// Durable store did not answer within the read bound
    #[error("Store timed out after {after:?} during {operation}")]
    Timeout { operation: String, after: Duration },

    /// Any other durable store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl ScoreEngineError {
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        ScoreEngineError::Timeout {
            operation: operation.into(),
            after,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ScoreEngineError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScoreEngineError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ScoreEngineError::Validation(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScoreEngineError>;
