//! Personal-best reconciliation.
//!
//! A submission walks a small state machine:
//!
//! ```text
//! CheckCache ──(score <= cached best)──────────────────────────► NoOp
//!     │
//!     └──► ReadDurable ──(no record / read failed)─────────────► Insert
//!                      ──(score > record.score)────────────────► UpdateInPlace
//!                      ──(score <= record.score)───────────────► NoOp (repairs cache)
//! ```
//!
//! The cache only ever short-circuits; once a write is on the table the
//! durable best is read again. Read failures fail open to `Insert`.
//! Read-decide-write is not atomic, so the store keeps one record per pair
//! and refuses non-improving writes. A submission is a new best only when
//! the store reports that its write changed the row.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::LocalCache;
use crate::config::EngineConfig;
use crate::core::{BestRecord, CacheEntry, GameResult, ScoreUpdate, SubmitOutcome};
use crate::error::Result;
use crate::store::{bounded, RecordWriter, Written};

/// Where a no-op decision got its known best from
#[derive(Debug, Clone, PartialEq)]
pub enum NoOpSource {
    /// Fast path: the cache already holds an equal or better score
    Cache(CacheEntry),
    /// The durable record is equal or better
    Durable(BestRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitState {
    CheckCache,
    ReadDurable,
    Insert,
    UpdateInPlace(BestRecord),
    NoOp(NoOpSource),
}

/// Transition out of `CheckCache`
pub fn decide_from_cache(result: &GameResult, cached: Option<CacheEntry>) -> SubmitState {
    match cached {
        Some(entry) if result.score <= entry.best_score => SubmitState::NoOp(NoOpSource::Cache(entry)),
        _ => SubmitState::ReadDurable,
    }
}

/// Transition out of `ReadDurable`
pub fn decide_from_durable(result: &GameResult, durable: Result<Option<BestRecord>>) -> SubmitState {
    match durable {
        Ok(None) => SubmitState::Insert,
        Ok(Some(record)) if result.score > record.score => SubmitState::UpdateInPlace(record),
        Ok(Some(record)) => SubmitState::NoOp(NoOpSource::Durable(record)),
        Err(e) if e.is_not_found() => SubmitState::Insert,
        Err(e) => {
            tracing::warn!(
                "⚠️ Best lookup for {} [{}w] failed, assuming first score: {}",
                result.player_name,
                result.game_mode,
                e
            );
            SubmitState::Insert
        }
    }
}

/// Decides insert / update / no-op for each submitted result
pub struct Reconciler {
    cache: Arc<dyn LocalCache>,
    store: Arc<dyn RecordWriter>,
    read_timeout: Duration,
    game_modes: Vec<u32>,
}

impl Reconciler {
    pub fn new(cache: Arc<dyn LocalCache>, store: Arc<dyn RecordWriter>, config: &EngineConfig) -> Self {
        Self {
            cache,
            store,
            read_timeout: config.read_timeout(),
            game_modes: config.game_modes.clone(),
        }
    }

    /// Submit a finished game.
    ///
    /// Only validation failures come back as `Err`; store write failures are
    /// reported through `accepted = false`.
    pub async fn submit(&self, result: &GameResult) -> Result<SubmitOutcome> {
        result.validate(&self.game_modes)?;

        let mut state = SubmitState::CheckCache;
        loop {
            state = match state {
                SubmitState::CheckCache => {
                    decide_from_cache(result, self.cache.get(&result.player_name, result.game_mode))
                }
                SubmitState::ReadDurable => {
                    let durable = bounded(
                        "find_best",
                        self.read_timeout,
                        self.store.find_best(&result.player_name, result.game_mode),
                    )
                    .await;
                    decide_from_durable(result, durable)
                }
                SubmitState::Insert => return Ok(self.insert(result).await),
                SubmitState::UpdateInPlace(record) => return Ok(self.update(result, record).await),
                SubmitState::NoOp(source) => return Ok(self.no_op(result, source)),
            };
        }
    }

    async fn insert(&self, result: &GameResult) -> SubmitOutcome {
        match self.store.insert(result).await {
            Ok(Written { record: stored, changed }) => {
                self.remember(&stored);
                if changed {
                    tracing::info!("🏆 First best for {} → record {}", result.display(), stored.id);
                    SubmitOutcome::new_best(stored.id)
                } else {
                    tracing::info!(
                        "Insert for {} [{}w] met an equal or better record {} ({})",
                        result.player_name,
                        result.game_mode,
                        stored.id,
                        stored.score
                    );
                    SubmitOutcome::unchanged(Some(stored.id))
                }
            }
            Err(e) => {
                tracing::error!("❌ Failed to save result for {}: {}", result.display(), e);
                SubmitOutcome::rejected(e.to_string())
            }
        }
    }

    async fn update(&self, result: &GameResult, current: BestRecord) -> SubmitOutcome {
        match self.store.update_in_place(current.id, &ScoreUpdate::from(result)).await {
            Ok(Written { record: stored, changed }) => {
                self.remember(&stored);
                if changed {
                    tracing::info!(
                        "🏆 New best for {} (was {}) → record {}",
                        result.display(),
                        current.score,
                        stored.id
                    );
                    SubmitOutcome::new_best(stored.id)
                } else {
                    tracing::info!(
                        "Update for {} [{}w] lost to record {} at {}",
                        result.player_name,
                        result.game_mode,
                        stored.id,
                        stored.score
                    );
                    SubmitOutcome::unchanged(Some(stored.id))
                }
            }
            Err(e) => {
                tracing::error!("❌ Failed to update record {} for {}: {}", current.id, result.display(), e);
                SubmitOutcome::rejected(e.to_string())
            }
        }
    }

    fn no_op(&self, result: &GameResult, source: NoOpSource) -> SubmitOutcome {
        match source {
            NoOpSource::Cache(entry) => {
                tracing::debug!(
                    "{} not above cached best {}, skipping store",
                    result.display(),
                    entry.best_score
                );
                SubmitOutcome::unchanged(entry.record_id)
            }
            NoOpSource::Durable(record) => {
                tracing::debug!("{} not above stored best {}", result.display(), record.score);
                self.remember(&record);
                SubmitOutcome::unchanged(Some(record.id))
            }
        }
    }

    fn remember(&self, record: &BestRecord) {
        self.cache.set(
            &record.player_name,
            record.game_mode,
            CacheEntry::new(record.score, Some(record.id)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoopCache};
    use crate::error::ScoreEngineError;
    use crate::store::{MemoryStore, RecordReader};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn ava(score: f64) -> GameResult {
        GameResult::new("ava", 30, score).with_metrics(score / 10.0, 96.0)
    }

    fn setup() -> (Arc<MemoryCache>, Arc<MemoryStore>, Reconciler) {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(cache.clone(), store.clone(), &EngineConfig::default());
        (cache, store, reconciler)
    }

    #[test]
    fn test_decide_from_cache() {
        let result = ava(50.0);
        assert_eq!(decide_from_cache(&result, None), SubmitState::ReadDurable);
        assert_eq!(
            decide_from_cache(&result, Some(CacheEntry::new(50.0, Some(1)))),
            SubmitState::NoOp(NoOpSource::Cache(CacheEntry::new(50.0, Some(1))))
        );
        assert_eq!(
            decide_from_cache(&result, Some(CacheEntry::new(49.9, None))),
            SubmitState::ReadDurable
        );
    }

    #[test]
    fn test_decide_from_durable() {
        let result = ava(50.0);
        let record = BestRecord::from_result(4, &ava(45.0), Utc::now());

        assert_eq!(decide_from_durable(&result, Ok(None)), SubmitState::Insert);
        assert_eq!(
            decide_from_durable(&result, Ok(Some(record.clone()))),
            SubmitState::UpdateInPlace(record)
        );

        let better = BestRecord::from_result(4, &ava(50.0), Utc::now());
        assert_eq!(
            decide_from_durable(&result, Ok(Some(better.clone()))),
            SubmitState::NoOp(NoOpSource::Durable(better))
        );
    }

    #[test]
    fn test_decide_fails_open() {
        let result = ava(50.0);
        let timeout = ScoreEngineError::timeout("find_best", Duration::from_secs(15));
        assert_eq!(decide_from_durable(&result, Err(timeout)), SubmitState::Insert);
        assert_eq!(
            decide_from_durable(&result, Err(ScoreEngineError::Store("503".into()))),
            SubmitState::Insert
        );
        assert_eq!(
            decide_from_durable(&result, Err(ScoreEngineError::NotFound("ava".into()))),
            SubmitState::Insert
        );
    }

    #[tokio::test]
    async fn test_first_then_lower_then_higher() {
        let (cache, store, reconciler) = setup();

        let first = reconciler.submit(&ava(50.0)).await.unwrap();
        assert!(first.accepted && first.is_new_best);
        let id = first.record_id.unwrap();
        assert_eq!(cache.get("ava", 30), Some(CacheEntry::new(50.0, Some(id))));

        let before = store.stats();
        let lower = reconciler.submit(&ava(40.0)).await.unwrap();
        assert!(lower.accepted && !lower.is_new_best);
        assert_eq!(store.stats(), before, "fast path must not touch the store");

        let higher = reconciler.submit(&ava(60.0)).await.unwrap();
        assert!(higher.is_new_best);
        assert_eq!(higher.record_id, Some(id));
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].score, 60.0);
    }

    #[tokio::test]
    async fn test_cache_self_heals_from_store() {
        let (cache, store, reconciler) = setup();
        reconciler.submit(&ava(50.0)).await.unwrap();

        cache.clear("ava");
        let outcome = reconciler.submit(&ava(45.0)).await.unwrap();
        assert!(!outcome.is_new_best);
        assert_eq!(store.stats().writes(), 1);

        // Repaired: next non-improving submission stays local
        let reads = store.stats().reads;
        reconciler.submit(&ava(45.0)).await.unwrap();
        assert_eq!(store.stats().reads, reads);
    }

    #[tokio::test]
    async fn test_stale_cache_still_reads_store() {
        let (cache, store, reconciler) = setup();
        reconciler.submit(&ava(50.0)).await.unwrap();

        // Another device pushed the durable best higher
        let id = store.records()[0].id;
        store.update_in_place(id, &ScoreUpdate::from(&ava(80.0))).await.unwrap();

        let outcome = reconciler.submit(&ava(70.0)).await.unwrap();
        assert!(!outcome.is_new_best);
        assert_eq!(cache.get("ava", 30).unwrap().best_score, 80.0);
        assert_eq!(store.records()[0].score, 80.0);
    }

    #[tokio::test]
    async fn test_validation_rejected_before_store() {
        let (_, store, reconciler) = setup();
        let err = reconciler.submit(&GameResult::new("", 30, 10.0)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.stats().total(), 0);
    }

    /// Reads fail, writes delegate to a memory store
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: bool,
    }

    impl FlakyStore {
        fn new(fail_reads: bool, fail_writes: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_reads: AtomicBool::new(fail_reads),
                fail_writes,
            }
        }
    }

    #[async_trait]
    impl RecordReader for FlakyStore {
        async fn find_best(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ScoreEngineError::Store("read replica down".into()));
            }
            self.inner.find_best(player_name, game_mode).await
        }

        async fn list_all(&self, game_mode: u32, cap: usize) -> Result<Vec<BestRecord>> {
            self.inner.list_all(game_mode, cap).await
        }
    }

    #[async_trait]
    impl RecordWriter for FlakyStore {
        async fn insert(&self, result: &GameResult) -> Result<Written> {
            if self.fail_writes {
                return Err(ScoreEngineError::Store("write rejected".into()));
            }
            self.inner.insert(result).await
        }

        async fn update_in_place(&self, id: i64, update: &ScoreUpdate) -> Result<Written> {
            if self.fail_writes {
                return Err(ScoreEngineError::Store("write rejected".into()));
            }
            self.inner.update_in_place(id, update).await
        }
    }

    #[tokio::test]
    async fn test_read_failure_fails_open_to_insert() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(FlakyStore::new(true, false));
        let reconciler = Reconciler::new(cache.clone(), store.clone(), &EngineConfig::default());

        let outcome = reconciler.submit(&ava(50.0)).await.unwrap();
        assert!(outcome.accepted && outcome.is_new_best);
        assert_eq!(store.inner.stats().inserts, 1);
        assert!(cache.get("ava", 30).is_some());
    }

    #[tokio::test]
    async fn test_equal_resubmission_after_read_failure_is_not_new_best() {
        let store = Arc::new(FlakyStore::new(false, false));
        let reconciler = Reconciler::new(Arc::new(NoopCache), store.clone(), &EngineConfig::default());

        let first = reconciler.submit(&ava(50.0)).await.unwrap();
        assert!(first.is_new_best);
        let before = store.inner.records();

        // Lookup fails, so the same score falls through to Insert
        store.fail_reads.store(true, Ordering::SeqCst);
        let again = reconciler.submit(&ava(50.0)).await.unwrap();

        assert!(again.accepted);
        assert!(!again.is_new_best);
        assert_eq!(again.record_id, first.record_id);
        assert_eq!(store.inner.records(), before);
    }

    #[tokio::test]
    async fn test_lower_score_after_read_failure_keeps_best() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(FlakyStore::new(false, false));
        let reconciler = Reconciler::new(cache.clone(), store.clone(), &EngineConfig::default());
        reconciler.submit(&ava(50.0)).await.unwrap();

        cache.clear("ava");
        store.fail_reads.store(true, Ordering::SeqCst);
        let outcome = reconciler.submit(&ava(30.0)).await.unwrap();

        assert!(!outcome.is_new_best);
        assert_eq!(store.inner.records()[0].score, 50.0);
        assert_eq!(cache.get("ava", 30).unwrap().best_score, 50.0);
    }

    /// Lookups hang well past any sane read timeout
    struct HangingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RecordReader for HangingStore {
        async fn find_best(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.inner.find_best(player_name, game_mode).await
        }

        async fn list_all(&self, game_mode: u32, cap: usize) -> Result<Vec<BestRecord>> {
            self.inner.list_all(game_mode, cap).await
        }
    }

    #[async_trait]
    impl RecordWriter for HangingStore {
        async fn insert(&self, result: &GameResult) -> Result<Written> {
            self.inner.insert(result).await
        }

        async fn update_in_place(&self, id: i64, update: &ScoreUpdate) -> Result<Written> {
            self.inner.update_in_place(id, update).await
        }
    }

    #[tokio::test]
    async fn test_hanging_lookup_times_out_to_insert() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(HangingStore {
            inner: MemoryStore::new(),
        });
        let config = EngineConfig::default().with_read_timeout(Duration::from_millis(20));
        let reconciler = Reconciler::new(cache.clone(), store.clone(), &config);

        let started = std::time::Instant::now();
        let outcome = reconciler.submit(&ava(50.0)).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(outcome.accepted && outcome.is_new_best);
        assert_eq!(store.inner.stats().reads, 0);
        assert_eq!(store.inner.stats().inserts, 1);
        assert_eq!(cache.get("ava", 30).unwrap().best_score, 50.0);
    }

    #[tokio::test]
    async fn test_write_failure_not_accepted() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(FlakyStore::new(false, true));
        let reconciler = Reconciler::new(cache.clone(), store, &EngineConfig::default());

        let outcome = reconciler.submit(&ava(50.0)).await.unwrap();
        assert!(!outcome.accepted);
        assert!(!outcome.is_new_best);
        assert_eq!(outcome.error.as_deref(), Some("Store error: write rejected"));
        assert!(cache.get("ava", 30).is_none(), "cache untouched on failed write");
    }
}
