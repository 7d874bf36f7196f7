//! Engine configuration.
//!
//! Values come from built-in defaults, optionally overlaid by a YAML file
//! and then by `SCORE_*` environment variables:
//!
//! ```yaml
//! read_timeout_secs: 15
//! list_cap: 1000
//! default_limit: 10
//! game_modes: [15, 30, 60]
//! ranking: weighted
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ScoreEngineError};

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest accepted read timeout
pub const MAX_READ_TIMEOUT_SECS: f64 = 600.0;

/// Leaderboard ordering method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankingMethod {
    /// `lps * (accuracy/100)^2` with accuracy and lps tie-breaks
    #[default]
    Weighted,
    /// Raw score, highest first
    Score,
}

impl std::str::FromStr for RankingMethod {
    type Err = ScoreEngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weighted" => Ok(RankingMethod::Weighted),
            "score" => Ok(RankingMethod::Score),
            other => Err(ScoreEngineError::Config(format!("unknown ranking method '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on every durable read (best lookups and leaderboard fetches)
    pub read_timeout_secs: f64,

    /// Cap on records fetched per leaderboard query, highest raw score first
    pub list_cap: usize,

    /// Entries returned when a caller asks for limit 0
    pub default_limit: usize,

    /// Accepted game modes; empty accepts any positive mode
    pub game_modes: Vec<u32>,

    pub ranking: RankingMethod,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: DEFAULT_READ_TIMEOUT.as_secs_f64(),
            list_cap: 1000,
            default_limit: 10,
            game_modes: vec![15, 30, 60],
            ranking: RankingMethod::Weighted,
        }
    }
}

impl EngineConfig {
    /// Out-of-range values (set directly on the struct) fall back to 15 s
    pub fn read_timeout(&self) -> Duration {
        read_timeout_from(self.read_timeout_secs).unwrap_or(DEFAULT_READ_TIMEOUT)
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn with_ranking(mut self, ranking: RankingMethod) -> Self {
        self.ranking = ranking;
        self
    }

    /// Load from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScoreEngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| ScoreEngineError::Config(format!("invalid YAML: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Overlay `SCORE_*` keys from a flat map.
    ///
    /// Unparseable or out-of-range values are logged and skipped, leaving
    /// the previous value in place.
    pub fn overlay(mut self, vars: &HashMap<String, String>) -> Self {
        match parse_var::<f64>(vars, "SCORE_READ_TIMEOUT_SECS") {
            Some(v) if read_timeout_from(v).is_some() => self.read_timeout_secs = v,
            Some(v) => tracing::warn!(
                "Ignoring SCORE_READ_TIMEOUT_SECS={}: must be in (0, {}]",
                v,
                MAX_READ_TIMEOUT_SECS
            ),
            None => {}
        }
        match parse_var::<usize>(vars, "SCORE_LIST_CAP") {
            Some(0) => tracing::warn!("Ignoring SCORE_LIST_CAP=0: must be > 0"),
            Some(v) => self.list_cap = v,
            None => {}
        }
        match parse_var::<usize>(vars, "SCORE_DEFAULT_LIMIT") {
            Some(0) => tracing::warn!("Ignoring SCORE_DEFAULT_LIMIT=0: must be > 0"),
            Some(v) => self.default_limit = v,
            None => {}
        }
        if let Some(raw) = vars.get("SCORE_GAME_MODES") {
            let modes: std::result::Result<Vec<u32>, _> = raw
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<u32>())
                .collect();
            match modes {
                Ok(modes) => self.game_modes = modes,
                Err(e) => tracing::warn!("Ignoring SCORE_GAME_MODES={:?}: {}", raw, e),
            }
        }
        if let Some(v) = parse_var::<RankingMethod>(vars, "SCORE_RANKING") {
            self.ranking = v;
        }
        self
    }

    /// Defaults overlaid with the process environment
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars().filter(|(k, _)| k.starts_with("SCORE_")).collect();
        Self::default().overlay(&vars)
    }

    fn check(&self) -> Result<()> {
        if read_timeout_from(self.read_timeout_secs).is_none() {
            return Err(ScoreEngineError::Config(format!(
                "read_timeout_secs must be in (0, {}], got {}",
                MAX_READ_TIMEOUT_SECS, self.read_timeout_secs
            )));
        }
        if self.list_cap == 0 {
            return Err(ScoreEngineError::Config("list_cap must be > 0".into()));
        }
        if self.default_limit == 0 {
            return Err(ScoreEngineError::Config("default_limit must be > 0".into()));
        }
        Ok(())
    }
}

fn read_timeout_from(secs: f64) -> Option<Duration> {
    if !(secs > 0.0 && secs <= MAX_READ_TIMEOUT_SECS) {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

fn parse_var<T>(vars: &HashMap<String, String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = vars.get(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
