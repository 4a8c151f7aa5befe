//! Answer assessment for the scholar workspace: semantic similarity
//! scoring, per-topic proficiency aggregation, and persisted reports.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Test allows"
    )
)]

/// Per-topic correctness aggregation.
pub mod aggregator;
/// Persisted proficiency reports.
pub mod report;
/// Semantic similarity scoring of answers.
pub mod scorer;

pub use aggregator::{ProficiencyAggregator, ProgressDelta, TopicRecord};
pub use report::ProficiencyReport;
pub use scorer::{ScoreResult, SimilarityScorer, Verdict};
