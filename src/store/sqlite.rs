use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{BestRecord, GameResult, ScoreUpdate};
use crate::error::{Result, ScoreEngineError};
use crate::store::{RecordReader, RecordWriter, Written};

const RECORD_COLUMNS: &str =
    "id, player_name, score, lps, accuracy, rank, time, ms_per_letter, game_mode, created_at";

/// SQLite-backed durable store
///
/// Schema:
/// ```sql
/// CREATE TABLE game_results (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     player_name TEXT NOT NULL,
///     score REAL NOT NULL,
///     lps REAL NOT NULL DEFAULT 0,
///     accuracy REAL NOT NULL DEFAULT 0,
///     rank TEXT NOT NULL DEFAULT '',
///     time REAL NOT NULL DEFAULT 0,
///     ms_per_letter REAL NOT NULL DEFAULT 0,
///     game_mode INTEGER NOT NULL,
///     created_at TEXT NOT NULL
/// );
/// CREATE UNIQUE INDEX idx_game_results_player_mode ON game_results(player_name, game_mode);
/// ```
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path`; `":memory:"` works for tests
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_name TEXT NOT NULL,
                score REAL NOT NULL,
                lps REAL NOT NULL DEFAULT 0,
                accuracy REAL NOT NULL DEFAULT 0,
                rank TEXT NOT NULL DEFAULT '',
                time REAL NOT NULL DEFAULT 0,
                ms_per_letter REAL NOT NULL DEFAULT 0,
                game_mode INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // One live record per (player, mode)
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_game_results_player_mode
             ON game_results(player_name, game_mode)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_results_mode_score
             ON game_results(game_mode, score DESC)",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ScoreEngineError::Store("connection lock poisoned".into()))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<BestRecord> {
        let created_raw: String = row.get(9)?;
        let created_at = DateTime::parse_from_rfc3339(&created_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(BestRecord {
            id: row.get(0)?,
            player_name: row.get(1)?,
            score: row.get(2)?,
            lps: row.get(3)?,
            accuracy: row.get(4)?,
            rank_label: row.get(5)?,
            time: row.get(6)?,
            ms_per_letter: row.get(7)?,
            game_mode: row.get(8)?,
            created_at,
        })
    }

    fn select_pair(conn: &Connection, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
        let record = conn
            .query_row(
                &format!(
                    "SELECT {} FROM game_results
                     WHERE player_name = ?1 AND game_mode = ?2
                     ORDER BY score DESC, id ASC
                     LIMIT 1",
                    RECORD_COLUMNS
                ),
                params![player_name, game_mode],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Total number of stored records
    pub async fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let total: u64 = conn.query_row("SELECT COUNT(*) FROM game_results", [], |row| row.get(0))?;
        Ok(total)
    }
}

#[async_trait]
impl RecordReader for SqliteStore {
    async fn find_best(&self, player_name: &str, game_mode: u32) -> Result<Option<BestRecord>> {
        let conn = self.conn()?;
        Self::select_pair(&conn, player_name, game_mode)
    }

    async fn list_all(&self, game_mode: u32, cap: usize) -> Result<Vec<BestRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM game_results
             WHERE game_mode = ?1
             ORDER BY score DESC, id ASC
             LIMIT ?2",
            RECORD_COLUMNS
        ))?;

        let cap = i64::try_from(cap).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(params![game_mode, cap], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}

#[async_trait]
impl RecordWriter for SqliteStore {
    async fn insert(&self, result: &GameResult) -> Result<Written> {
        let conn = self.conn()?;
        let created_at = Utc::now().to_rfc3339();

        // A racing insert for the same pair collapses into a keep-if-better update.
        // When the conflict WHERE refuses, no row counts as changed.
        let changed = conn.execute(
            "INSERT INTO game_results
                (player_name, score, lps, accuracy, rank, time, ms_per_letter, game_mode, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(player_name, game_mode) DO UPDATE SET
                score = excluded.score,
                lps = excluded.lps,
                accuracy = excluded.accuracy,
                rank = excluded.rank,
                time = excluded.time,
                ms_per_letter = excluded.ms_per_letter
             WHERE excluded.score > game_results.score",
            params![
                result.player_name,
                result.score,
                result.lps,
                result.accuracy,
                result.rank_label,
                result.time,
                result.ms_per_letter,
                result.game_mode,
                created_at,
            ],
        )?;

        let stored = Self::select_pair(&conn, &result.player_name, result.game_mode)?.ok_or_else(|| {
            ScoreEngineError::Store(format!(
                "insert for {} [{}] left no row",
                result.player_name, result.game_mode
            ))
        })?;

        if changed == 0 {
            tracing::debug!(
                "Insert for {} [{}] left record {} at {}",
                result.player_name,
                result.game_mode,
                stored.id,
                stored.score
            );
        }

        Ok(Written::new(stored, changed > 0))
    }

    async fn update_in_place(&self, id: i64, update: &ScoreUpdate) -> Result<Written> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE game_results
             SET score = ?2, lps = ?3, accuracy = ?4, rank = ?5, time = ?6, ms_per_letter = ?7
             WHERE id = ?1 AND score < ?2",
            params![
                id,
                update.score,
                update.lps,
                update.accuracy,
                update.rank_label,
                update.time,
                update.ms_per_letter,
            ],
        )?;

        let stored = conn
            .query_row(
                &format!("SELECT {} FROM game_results WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                Self::row_to_record,
            )
            .optional()?
            .ok_or_else(|| ScoreEngineError::NotFound(format!("record {}", id)))?;

        if changed == 0 {
            tracing::debug!("Record {} kept its better score {}", id, stored.score);
        }

        Ok(Written::new(stored, changed > 0))
    }
}
