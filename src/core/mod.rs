pub mod best_record;
pub mod game_result;
pub mod submission;

pub use best_record::{BestRecord, LeaderboardEntry, ScoreUpdate};
pub use game_result::{GameResult, ResultPayload};
pub use submission::{CacheEntry, PlayerProfile, SubmitOutcome};
