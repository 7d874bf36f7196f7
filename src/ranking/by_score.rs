use crate::core::BestRecord;
use crate::ranking::{stable_sort_by, RankedRecord, Ranker};

/// Ranks by raw score, highest first; equal scores keep the earlier record
pub struct ScoreRanker;

impl ScoreRanker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScoreRanker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ranker for ScoreRanker {
    fn rank(&self, records: Vec<BestRecord>) -> Vec<RankedRecord> {
        let mut ranked: Vec<RankedRecord> = records
            .into_iter()
            .map(|record| {
                let key = record.score;
                RankedRecord::new(record, key)
            })
            .collect();

        stable_sort_by(&mut ranked, |a, b| {
            b.key.total_cmp(&a.key).then_with(|| a.record.id.cmp(&b.record.id))
        });
        ranked
    }

    fn name(&self) -> &str {
        "score"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameResult;
    use chrono::Utc;

    #[test]
    fn test_score_ranker() {
        let ranker = ScoreRanker::new();
        let records = vec![
            BestRecord::from_result(1, &GameResult::new("a", 15, 40.0), Utc::now()),
            BestRecord::from_result(2, &GameResult::new("b", 15, 70.0), Utc::now()),
            BestRecord::from_result(3, &GameResult::new("c", 15, 40.0), Utc::now()),
        ];

        let ranked = ranker.rank(records);
        let names: Vec<&str> = ranked.iter().map(|r| r.record.player_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(ranked[0].key, 70.0);
    }
}
