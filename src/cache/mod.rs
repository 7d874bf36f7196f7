pub mod memory;
pub mod sqlite;

use crate::core::{CacheEntry, PlayerProfile};

pub use memory::{MemoryCache, NoopCache};
pub use sqlite::SqliteCache;

/// Client-local mirror of known bests.
///
/// Purely an optimization: implementations never fail. Storage problems
/// read back as "absent" and writes that cannot land are dropped.
pub trait LocalCache: Send + Sync {
    /// Cached best for a (player, mode) pair
    fn get(&self, player_name: &str, game_mode: u32) -> Option<CacheEntry>;

    /// Overwrite the cached best for a pair
    fn set(&self, player_name: &str, game_mode: u32, entry: CacheEntry);

    /// Forget every mode for a player
    fn clear(&self, player_name: &str);

    /// The player's chosen display name on this client
    fn display_name(&self) -> Option<String>;

    fn set_display_name(&self, name: &str);
}

/// Best cached score across `modes`; earlier modes win ties
pub fn profile(cache: &dyn LocalCache, player_name: &str, modes: &[u32]) -> PlayerProfile {
    let mut best: Option<(f64, u32)> = None;

    for &mode in modes {
        if let Some(entry) = cache.get(player_name, mode) {
            if best.map_or(true, |(score, _)| entry.best_score > score) {
                best = Some((entry.best_score, mode));
            }
        }
    }

    PlayerProfile {
        name: player_name.to_string(),
        best_score: best.map(|(score, _)| score),
        best_game_mode: best.map(|(_, mode)| mode),
        has_profile: best.is_some(),
    }
}
