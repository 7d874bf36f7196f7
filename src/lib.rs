//! # Score Engine
//!
//! Personal-best tracking and leaderboards for a typing game:
//! - One durable best record per (player, mode), improved in place
//! - Local cache so non-improving results never reach the store
//! - Fail-open reconciliation when the store can't be read
//! - Deterministic weighted leaderboard with epsilon tie-breaks
//! - Interfaces: Rust library, HTTP API, CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use score_engine::{EngineConfig, GameResult, ScoreEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = ScoreEngine::open("scores.db", "cache.db", EngineConfig::default()).await?;
//!
//!     let result = GameResult::new("ava", 30, 52.0).with_metrics(5.2, 98.0);
//!     let outcome = engine.submit(&result).await?;
//!     println!("new best: {}", outcome.is_new_best);
//!
//!     for entry in engine.leaderboard_entries(30, 10).await? {
//!         println!("{}. {} {}", entry.position, entry.player_name, entry.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod reconcile;
pub mod store;

// Re-export primary types
pub use crate::cache::LocalCache;
pub use crate::config::{EngineConfig, RankingMethod};
pub use crate::core::{BestRecord, CacheEntry, GameResult, LeaderboardEntry, PlayerProfile, ResultPayload, SubmitOutcome};
pub use crate::engine::ScoreEngine;
pub use crate::error::{Result, ScoreEngineError};
pub use crate::store::{RecordReader, RecordWriter, Written};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
