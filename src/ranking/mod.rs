pub mod by_score;
pub mod leaderboard;
pub mod weighted;

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::RankingMethod;
use crate::core::BestRecord;

pub use by_score::ScoreRanker;
pub use leaderboard::Leaderboard;
pub use weighted::WeightedRanker;

/// Trait for leaderboard ordering policies
pub trait Ranker: Send + Sync {
    /// Order records best first, attaching the key each was ranked by
    fn rank(&self, records: Vec<BestRecord>) -> Vec<RankedRecord>;

    /// Get ranker name for logging
    fn name(&self) -> &str;
}

/// Record with the transient key it was ranked by
#[derive(Debug, Clone)]
pub struct RankedRecord {
    pub record: BestRecord,
    pub key: f64,
}

impl RankedRecord {
    pub fn new(record: BestRecord, key: f64) -> Self {
        Self { record, key }
    }

    /// Drop the ranking key
    pub fn into_record(self) -> BestRecord {
        self.record
    }
}

/// Ranker for a configured method
pub fn for_method(method: RankingMethod) -> Arc<dyn Ranker> {
    match method {
        RankingMethod::Weighted => Arc::new(WeightedRanker::new()),
        RankingMethod::Score => Arc::new(ScoreRanker::new()),
    }
}

/// Stable insertion sort.
///
/// Epsilon comparisons are not transitive, and `slice::sort_by` may panic
/// when handed an inconsistent ordering. This never does, and for a given
/// input order always yields the same output.
pub(crate) fn stable_sort_by<T>(items: &mut [T], mut cmp: impl FnMut(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j], &items[j - 1]) == Ordering::Less {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_sort_keeps_equal_order() {
        let mut items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        stable_sort_by(&mut items, |a, b| a.0.cmp(&b.0));
        assert_eq!(items, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_for_method() {
        assert_eq!(for_method(RankingMethod::Weighted).name(), "weighted");
        assert_eq!(for_method(RankingMethod::Score).name(), "score");
    }
}
