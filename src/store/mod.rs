pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::core::{BestRecord, GameResult, ScoreUpdate};
use crate::error::{Result, ScoreEngineError};

pub use memory::{MemoryStore, StoreStats};
pub use sqlite::SqliteStore;

/// Privilege-free read access to durable records.
///
/// Nothing here takes a caller identity: leaderboard and best-score reads
/// must answer the same no matter who asks.
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// Best record for a (player, mode) pair; `Ok(None)` when there is none
    async fn find_best(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>>;

    /// Up to `cap` records for a mode, highest score first
    async fn list_all(&self, game_mode: u32, cap: usize) -> Result<Vec<BestRecord>>;
}

/// Row as stored after a write, and whether the write changed it
#[derive(Debug, Clone, PartialEq)]
pub struct Written {
    pub record: BestRecord,
    /// False when the store kept an equal or better existing row
    pub changed: bool,
}

impl Written {
    pub fn new(record: BestRecord, changed: bool) -> Self {
        Self { record, changed }
    }
}

/// Privileged write access.
///
/// Implementations keep at most one record per (player, mode) and only
/// ever replace metrics with strictly better ones.
#[async_trait]
pub trait RecordWriter: RecordReader {
    /// Create the record for a pair; an existing row is only improved
    async fn insert(&self, result: &GameResult) -> Result<Written>;

    /// Overwrite the metric fields of record `id` in place if strictly better
    async fn update_in_place(&self, id: i64, update: &ScoreUpdate) -> Result<Written>;
}

/// Run a store call under `after`, mapping expiry to [`ScoreEngineError::Timeout`]
pub async fn bounded<T, F>(operation: &str, after: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(ScoreEngineError::timeout(operation, after)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let value = bounded("noop", Duration::from_secs(1), async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let err = bounded("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.is_timeout());
    }
}
