use std::collections::HashMap;
use std::sync::Mutex;

use crate::cache::LocalCache;
use crate::core::CacheEntry;

#[derive(Default)]
struct Entries {
    scores: HashMap<(String, u32), CacheEntry>,
    display_name: Option<String>,
}

/// Process-local cache, lost on exit
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<Entries>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.scores.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, player_name: &str, game_mode: u32) -> Option<CacheEntry> {
        let entries = self.entries.lock().ok()?;
        entries.scores.get(&(player_name.to_string(), game_mode)).copied()
    }

    fn set(&self, player_name: &str, game_mode: u32, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.scores.insert((player_name.to_string(), game_mode), entry);
        }
    }

    fn clear(&self, player_name: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.scores.retain(|(player, _), _| player != player_name);
        }
    }

    fn display_name(&self) -> Option<String> {
        self.entries.lock().ok()?.display_name.clone()
    }

    fn set_display_name(&self, name: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.display_name = Some(name.to_string());
        }
    }
}

/// Cache that remembers nothing; every lookup falls through to the store
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl LocalCache for NoopCache {
    fn get(&self, _player_name: &str, _game_mode: u32) -> Option<CacheEntry> {
        None
    }

    fn set(&self, _player_name: &str, _game_mode: u32, _entry: CacheEntry) {}

    fn clear(&self, _player_name: &str) {}

    fn display_name(&self) -> Option<String> {
        None
    }

    fn set_display_name(&self, _name: &str) {}
}
