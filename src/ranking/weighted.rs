use std::cmp::Ordering;

use crate::core::BestRecord;
use crate::ranking::{stable_sort_by, RankedRecord, Ranker};

/// Weighted scores closer than this count as tied
pub const WEIGHTED_EPSILON: f64 = 1e-4;

/// Accuracies closer than this count as tied
pub const ACCURACY_EPSILON: f64 = 1e-2;

/// Ranks by `lps * (accuracy/100)^2`.
///
/// Squaring the accuracy fraction punishes sloppy fast play harder than a
/// linear weight would. Near-ties fall back to accuracy, then lps, then the
/// earlier record (lower id).
pub struct WeightedRanker;

impl WeightedRanker {
    pub fn new() -> Self {
        Self
    }

    fn compare(a: &RankedRecord, b: &RankedRecord) -> Ordering {
        if (a.key - b.key).abs() > WEIGHTED_EPSILON {
            return b.key.total_cmp(&a.key);
        }
        if (a.record.accuracy - b.record.accuracy).abs() > ACCURACY_EPSILON {
            return b.record.accuracy.total_cmp(&a.record.accuracy);
        }
        b.record
            .lps
            .total_cmp(&a.record.lps)
            .then_with(|| a.record.id.cmp(&b.record.id))
    }
}

impl Default for WeightedRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ranker for WeightedRanker {
    fn rank(&self, records: Vec<BestRecord>) -> Vec<RankedRecord> {
        let mut ranked: Vec<RankedRecord> = records
            .into_iter()
            .map(|record| {
                let key = record.weighted_score();
                RankedRecord::new(record, key)
            })
            .collect();

        stable_sort_by(&mut ranked, Self::compare);
        ranked
    }

    fn name(&self) -> &str {
        "weighted"
    }
}
