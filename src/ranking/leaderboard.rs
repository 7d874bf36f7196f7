use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::core::{BestRecord, LeaderboardEntry};
use crate::error::Result;
use crate::ranking::{self, Ranker};
use crate::store::{bounded, RecordReader};

/// Recomputes a mode's leaderboard from the store on every call.
///
/// Holds no ranking state. Each call ranks whatever snapshot the read
/// returned; a write landing concurrently may or may not be reflected.
pub struct Leaderboard {
    reader: Arc<dyn RecordReader>,
    ranker: Arc<dyn Ranker>,
    read_timeout: Duration,
    list_cap: usize,
    default_limit: usize,
}

impl Leaderboard {
    pub fn new(reader: Arc<dyn RecordReader>, config: &EngineConfig) -> Self {
        Self {
            reader,
            ranker: ranking::for_method(config.ranking),
            read_timeout: config.read_timeout(),
            list_cap: config.list_cap,
            default_limit: config.default_limit,
        }
    }

    /// Top `limit` records for `game_mode`; `limit` 0 means the default.
    ///
    /// Only the `list_cap` highest raw scores are fetched and ranked, so under
    /// the weighted ranker a record outside that slice never appears even if
    /// it would weigh more than the ones that do. Read failures and timeouts are returned as-is. An empty vec means the
    /// mode genuinely has no records yet.
    pub async fn rank(&self, game_mode: u32, limit: usize) -> Result<Vec<BestRecord>> {
        let start = Instant::now();
        let limit = if limit == 0 { self.default_limit } else { limit };

        let records = bounded(
            "list_all",
            self.read_timeout,
            self.reader.list_all(game_mode, self.list_cap),
        )
        .await?;

        if records.len() >= self.list_cap {
            tracing::warn!(
                "Leaderboard [{}w] hit the {cap} record cap: only the top {cap} by raw score are ranked, \
                 records with a lower raw score but a higher {} score are left out",
                game_mode,
                self.ranker.name(),
                cap = self.list_cap
            );
        }

        let fetched = records.len();
        let top: Vec<BestRecord> = self
            .ranker
            .rank(records)
            .into_iter()
            .take(limit)
            .map(|r| r.into_record())
            .collect();

        tracing::debug!(
            "Ranked {} records for [{}w] with {} in {:.2}ms",
            fetched,
            game_mode,
            self.ranker.name(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(top)
    }

    /// [`rank`](Self::rank) projected to public rows with 1-based positions
    pub async fn entries(&self, game_mode: u32, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let records = self.rank(game_mode, limit).await?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, record)| LeaderboardEntry::new(i + 1, record))
            .collect())
    }
}
