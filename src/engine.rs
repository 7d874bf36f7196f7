use std::sync::Arc;
use std::time::Duration;

use crate::cache::{self, LocalCache, NoopCache, SqliteCache};
use crate::config::EngineConfig;
use crate::core::{BestRecord, GameResult, LeaderboardEntry, PlayerProfile, SubmitOutcome};
use crate::error::Result;
use crate::ranking::Leaderboard;
use crate::reconcile::Reconciler;
use crate::store::{bounded, RecordReader, RecordWriter, SqliteStore};

/// Main score engine orchestrator
pub struct ScoreEngine {
    cache: Arc<dyn LocalCache>,
    reader: Arc<dyn RecordReader>,
    reconciler: Reconciler,
    leaderboard: Leaderboard,
    config: EngineConfig,
}

impl ScoreEngine {
    /// Create an engine over SQLite files for the durable store and the local cache.
    ///
    /// An unusable cache file is logged and replaced by a cache that
    /// remembers nothing; every submission then consults the store.
    pub async fn open(db_path: impl AsRef<str>, cache_path: impl AsRef<str>, config: EngineConfig) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(db_path.as_ref()).await?);

        let cache: Arc<dyn LocalCache> = match SqliteCache::new(cache_path.as_ref()) {
            Ok(cache) => {
                tracing::info!("✅ Local cache at {}", cache_path.as_ref());
                Arc::new(cache)
            }
            Err(e) => {
                tracing::warn!("⚠️ Local cache unavailable, continuing without: {}", e);
                Arc::new(NoopCache)
            }
        };

        Ok(Self::with_parts(store, cache, config))
    }

    /// Assemble an engine from an explicit store and cache
    pub fn with_parts<S>(store: Arc<S>, cache: Arc<dyn LocalCache>, config: EngineConfig) -> Self
    where
        S: RecordWriter + 'static,
    {
        let reader: Arc<dyn RecordReader> = store.clone();
        let writer: Arc<dyn RecordWriter> = store;

        Self {
            reconciler: Reconciler::new(cache.clone(), writer, &config),
            leaderboard: Leaderboard::new(reader.clone(), &config),
            cache,
            reader,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit a finished game; see [`Reconciler::submit`]
    pub async fn submit(&self, result: &GameResult) -> Result<SubmitOutcome> {
        self.reconciler.submit(result).await
    }

    /// Ranked records for a mode
    pub async fn leaderboard(&self, game_mode: u32, limit: usize) -> Result<Vec<BestRecord>> {
        self.leaderboard.rank(game_mode, limit).await
    }

    /// Ranked public rows for a mode
    pub async fn leaderboard_entries(&self, game_mode: u32, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.leaderboard.entries(game_mode, limit).await
    }

    /// Authoritative best for a pair, read under the configured timeout
    pub async fn best_score(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
        let read = bounded(
            "find_best",
            self.read_timeout(),
            self.reader.find_best(player_name, game_mode),
        )
        .await;

        match read {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }

    /// Best locally known score across the configured modes
    pub fn profile(&self, player_name: &str) -> PlayerProfile {
        cache::profile(self.cache.as_ref(), player_name, &self.config.game_modes)
    }

    /// Forget every cached best for a player; the store is untouched
    pub fn clear_cache(&self, player_name: &str) {
        tracing::info!("🧹 Clearing cached bests for {}", player_name);
        self.cache.clear(player_name);
    }

    pub fn display_name(&self) -> Option<String> {
        self.cache.display_name()
    }

    pub fn set_display_name(&self, name: &str) {
        self.cache.set_display_name(name.trim());
    }

    fn read_timeout(&self) -> Duration {
        self.config.read_timeout()
    }
}
