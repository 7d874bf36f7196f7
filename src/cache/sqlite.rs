use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::LocalCache;
use crate::core::CacheEntry;
use crate::error::Result;

const DISPLAY_NAME_KEY: &str = "player_name";

/// SQLite-backed local cache
///
/// Schema:
/// ```sql
/// CREATE TABLE score_cache (
///     player_name TEXT NOT NULL,
///     game_mode INTEGER NOT NULL,
///     best_score REAL,
///     record_id INTEGER,
///     updated_at TEXT,
///     PRIMARY KEY (player_name, game_mode)
/// );
/// CREATE TABLE client_settings (
///     key TEXT PRIMARY KEY,
///     value TEXT
/// );
/// ```
///
/// Values are plain scalars with no versioning. Anything unreadable is
/// treated as absent.
pub struct SqliteCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Create new SQLite cache
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS score_cache (
                player_name TEXT NOT NULL,
                game_mode INTEGER NOT NULL,
                best_score REAL,
                record_id INTEGER,
                updated_at TEXT,
                PRIMARY KEY (player_name, game_mode)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS client_settings (
                key TEXT PRIMARY KEY,
                value TEXT
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Option<MutexGuard<'_, Connection>> {
        match self.conn.lock() {
            Ok(conn) => Some(conn),
            Err(_) => {
                tracing::warn!("Local cache lock poisoned, skipping");
                None
            }
        }
    }

    fn try_get(conn: &Connection, player_name: &str, game_mode: u32) -> rusqlite::Result<Option<CacheEntry>> {
        let row = conn
            .query_row(
                "SELECT best_score, record_id FROM score_cache
                 WHERE player_name = ?1 AND game_mode = ?2",
                params![player_name, game_mode],
                |row| Ok((row.get::<_, Option<f64>>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((Some(best_score), record_id)) if best_score.is_finite() => {
                Some(CacheEntry::new(best_score, record_id.filter(|id| *id > 0)))
            }
            _ => None,
        })
    }
}

impl LocalCache for SqliteCache {
    fn get(&self, player_name: &str, game_mode: u32) -> Option<CacheEntry> {
        let conn = self.conn()?;
        match Self::try_get(&conn, player_name, game_mode) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry for {} [{}]: {}", player_name, game_mode, e);
                None
            }
        }
    }

    fn set(&self, player_name: &str, game_mode: u32, entry: CacheEntry) {
        let Some(conn) = self.conn() else { return };

        let written = conn.execute(
            "INSERT OR REPLACE INTO score_cache (player_name, game_mode, best_score, record_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                player_name,
                game_mode,
                entry.best_score,
                entry.record_id,
                Utc::now().to_rfc3339(),
            ],
        );

        if let Err(e) = written {
            tracing::warn!("Failed to cache best for {} [{}]: {}", player_name, game_mode, e);
        }
    }

    fn clear(&self, player_name: &str) {
        let Some(conn) = self.conn() else { return };

        if let Err(e) = conn.execute("DELETE FROM score_cache WHERE player_name = ?", params![player_name]) {
            tracing::warn!("Failed to clear cache for {}: {}", player_name, e);
        }
    }

    fn display_name(&self) -> Option<String> {
        let conn = self.conn()?;
        let name = conn
            .query_row(
                "SELECT value FROM client_settings WHERE key = ?",
                params![DISPLAY_NAME_KEY],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional();

        match name {
            Ok(name) => name.flatten().filter(|n| !n.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Ignoring unreadable display name: {}", e);
                None
            }
        }
    }

    fn set_display_name(&self, name: &str) {
        let Some(conn) = self.conn() else { return };

        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO client_settings (key, value) VALUES (?1, ?2)",
            params![DISPLAY_NAME_KEY, name],
        ) {
            tracing::warn!("Failed to save display name: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_create() {
        let cache = SqliteCache::new(":memory:").unwrap();
        assert!(cache.get("ava", 30).is_none());
        assert!(cache.display_name().is_none());
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = SqliteCache::new(":memory:").unwrap();

        cache.set("ava", 30, CacheEntry::new(50.0, Some(7)));
        assert_eq!(cache.get("ava", 30), Some(CacheEntry::new(50.0, Some(7))));
        assert!(cache.get("ava", 15).is_none());

        cache.set("ava", 30, CacheEntry::new(60.0, Some(7)));
        assert_eq!(cache.get("ava", 30).unwrap().best_score, 60.0);
    }

    #[test]
    fn test_cache_clear_all_modes() {
        let cache = SqliteCache::new(":memory:").unwrap();
        cache.set("ava", 15, CacheEntry::new(1.0, None));
        cache.set("ava", 30, CacheEntry::new(2.0, None));
        cache.set("ava_x", 30, CacheEntry::new(3.0, None));

        cache.clear("ava");

        assert!(cache.get("ava", 15).is_none());
        assert!(cache.get("ava", 30).is_none());
        assert!(cache.get("ava_x", 30).is_some());
    }

    #[test]
    fn test_corrupt_entry_reads_as_absent() {
        let cache = SqliteCache::new(":memory:").unwrap();
        {
            let conn = cache.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO score_cache (player_name, game_mode, best_score, record_id) VALUES ('ava', 30, 'garbage', 'x')",
                [],
            )
            .unwrap();
        }

        assert!(cache.get("ava", 30).is_none());

        // A fresh write heals it
        cache.set("ava", 30, CacheEntry::new(12.0, Some(1)));
        assert_eq!(cache.get("ava", 30).unwrap().best_score, 12.0);
    }

    #[test]
    fn test_missing_score_reads_as_absent() {
        let cache = SqliteCache::new(":memory:").unwrap();
        {
            let conn = cache.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO score_cache (player_name, game_mode, best_score, record_id) VALUES ('ava', 30, NULL, 4)",
                [],
            )
            .unwrap();
        }
        assert!(cache.get("ava", 30).is_none());
    }

    #[test]
    fn test_display_name() {
        let cache = SqliteCache::new(":memory:").unwrap();
        cache.set_display_name("ava");
        assert_eq!(cache.display_name().as_deref(), Some("ava"));
        cache.set_display_name("ava2");
        assert_eq!(cache.display_name().as_deref(), Some("ava2"));
    }

    #[test]
    fn test_survives_broken_table() {
        let cache = SqliteCache::new(":memory:").unwrap();
        {
            let conn = cache.conn.lock().unwrap();
            conn.execute("DROP TABLE score_cache", []).unwrap();
        }

        // Neither call may panic or surface an error
        cache.set("ava", 30, CacheEntry::new(1.0, None));
        assert!(cache.get("ava", 30).is_none());
        cache.clear("ava");
    }
}
