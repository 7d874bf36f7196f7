use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::{BestRecord, GameResult, ScoreUpdate};
use crate::error::{Result, ScoreEngineError};
use crate::store::{RecordReader, RecordWriter, Written};

/// Access counters, used to observe how often the store is reached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub reads: u64,
    pub inserts: u64,
    pub updates: u64,
}

impl StoreStats {
    pub fn total(&self) -> u64 {
        self.reads + self.inserts + self.updates
    }

    pub fn writes(&self) -> u64 {
        self.inserts + self.updates
    }
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<i64, BestRecord>,
    next_id: i64,
    stats: StoreStats,
}

/// In-process store with the same keep-if-better semantics as [`SqliteStore`](crate::store::SqliteStore)
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ScoreEngineError::Store("memory store lock poisoned".into()))
    }

    pub fn stats(&self) -> StoreStats {
        self.inner().map(|inner| inner.stats).unwrap_or_default()
    }

    /// Snapshot of every stored record, in id order
    pub fn records(&self) -> Vec<BestRecord> {
        self.inner()
            .map(|inner| inner.records.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn best_of<'a>(records: impl Iterator<Item = &'a BestRecord>) -> Option<&'a BestRecord> {
    // Ties go to the lower id, matching `ORDER BY score DESC, id ASC`
    records.fold(None, |best: Option<&BestRecord>, r| match best {
        Some(b) if b.score >= r.score => Some(b),
        _ => Some(r),
    })
}

#[async_trait]
impl RecordReader for MemoryStore {
    async fn find_best(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
        let mut inner = self.inner()?;
        inner.stats.reads += 1;
        let found = best_of(
            inner
                .records
                .values()
                .filter(|r| r.player_name == player_name && r.game_mode == game_mode),
        )
        .cloned();
        Ok(found)
    }

    async fn list_all(&self, game_mode: u32, cap: usize) -> Result<Vec<BestRecord>> {
        let mut inner = self.inner()?;
        inner.stats.reads += 1;

        let mut records: Vec<BestRecord> = inner
            .records
            .values()
            .filter(|r| r.game_mode == game_mode)
            .cloned()
            .collect();
        // BTreeMap iteration is id-ascending and sort_by is stable
        records.sort_by(|a, b| b.score.total_cmp(&a.score));
        records.truncate(cap);
        Ok(records)
    }
}

#[async_trait]
impl RecordWriter for MemoryStore {
    async fn insert(&self, result: &GameResult) -> Result<Written> {
        let mut inner = self.inner()?;
        inner.stats.inserts += 1;

        let existing = inner
            .records
            .values()
            .find(|r| r.player_name == result.player_name && r.game_mode == result.game_mode)
            .map(|r| r.id);

        if let Some(id) = existing {
            let record = inner
                .records
                .get_mut(&id)
                .ok_or_else(|| ScoreEngineError::NotFound(format!("record {}", id)))?;
            let changed = result.score > record.score;
            if changed {
                record.apply(&ScoreUpdate::from(result));
            }
            return Ok(Written::new(record.clone(), changed));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let record = BestRecord::from_result(id, result, Utc::now());
        inner.records.insert(id, record.clone());
        Ok(Written::new(record, true))
    }

    async fn update_in_place(&self, id: i64, update: &ScoreUpdate) -> Result<Written> {
        let mut inner = self.inner()?;
        inner.stats.updates += 1;

        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| ScoreEngineError::NotFound(format!("record {}", id)))?;
        let changed = update.score > record.score;
        if changed {
            record.apply(update);
        }
        Ok(Written::new(record.clone(), changed))
    }
}
