//! Per-topic correctness aggregation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::scorer::Verdict;

/// Correct/total counters for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    /// Number of answers graded correct.
    pub correct: u32,
    /// Number of answers graded, correct or not. Always ≥ `correct`.
    pub total: u32,
}

impl TopicRecord {
    /// Correct answers as a percentage of the total; a topic with no graded
    /// answers reports 0% (no division by zero).
    pub fn percentage(self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32 * 100.0
        }
    }
}

/// Change in one topic's percentage between two snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDelta {
    /// Topic name.
    pub topic: String,
    /// Current percentage minus previous percentage.
    pub percentage_point_change: f32,
}

/// Accumulates per-topic correct/total counts from scored answers.
#[derive(Debug, Clone, Default)]
pub struct ProficiencyAggregator {
    /// Counters keyed by topic name.
    topics: BTreeMap<String, TopicRecord>,
}

impl ProficiencyAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one graded answer for `topic`: increments `total`, and
    /// `correct` iff the verdict is correct.
    pub fn record(&mut self, topic: &str, verdict: Verdict) {
        let record = self.topics.entry(topic.to_owned()).or_default();
        record.total += 1;
        if verdict.is_correct() {
            record.correct += 1;
        }
    }

    /// A copy of the current per-topic counters.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, TopicRecord> {
        self.topics.clone()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Percentage-point change per topic between two snapshots, over the
    /// union of their topics in name order.
    ///
    /// A topic absent from `previous` counts as a prior percentage of 0; a
    /// topic with `total == 0` on either side is that side's 0% as well.
    pub fn diff(
        previous: &BTreeMap<String, TopicRecord>,
        current: &BTreeMap<String, TopicRecord>,
    ) -> Vec<ProgressDelta> {
        let mut topics: BTreeSet<&String> = previous.keys().collect();
        topics.extend(current.keys());

        topics
            .into_iter()
            .map(|topic| {
                let previous_pct = previous
                    .get(topic)
                    .copied()
                    .map_or(0.0, TopicRecord::percentage);
                let current_pct = current
                    .get(topic)
                    .copied()
                    .map_or(0.0, TopicRecord::percentage);
                ProgressDelta {
                    topic: topic.clone(),
                    percentage_point_change: current_pct - previous_pct,
                }
            })
            .collect()
    }
}
