//! End-to-end assessment flow against the mock embedding provider.

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use scholar_assess::{ProficiencyAggregator, ProficiencyReport, SimilarityScorer, Verdict};
use scholar_context::{ContextAssembler, MockEmbeddingClient};
use scholar_core::{ConversationSession, Role};

#[tokio::test]
async fn assessment_pipeline_end_to_end() {
    let provider = MockEmbeddingClient::new()
        .with_vector("what is ownership?", vec![1.0, 0.0, 0.0])
        .with_vector("Ownership moves values between bindings.", vec![0.9, 0.1, 0.0])
        .with_vector("Slices borrow part of a collection.", vec![0.0, 1.0, 0.0])
        .with_vector("Traits describe shared behavior.", vec![0.0, 0.0, 1.0]);

    // Index the study material and assemble context for a question.
    let mut assembler = ContextAssembler::new(provider.clone());
    let indexed = assembler
        .index_document(
            "notes.md",
            vec![
                "Traits describe shared behavior.".to_owned(),
                "Ownership moves values between bindings.".to_owned(),
                "Slices borrow part of a collection.".to_owned(),
            ],
        )
        .await
        .unwrap();
    assert_eq!(indexed, 3);

    let context = assembler
        .assemble("what is ownership?", 2, 200)
        .await
        .unwrap();
    assert!(context.starts_with("Ownership moves values between bindings."));

    // The caller wires the context into a generator request; the session
    // just keeps the ordered turns.
    let mut session = ConversationSession::with_system(context);
    session.append(Role::User, "what is ownership?");
    assert_eq!(session.len(), 2);

    // Grade two answers for the same topic.
    let scorer = SimilarityScorer::new(provider.clone());
    let reference = "Ownership moves values between bindings.";

    let right = scorer.score(reference, reference).await.unwrap();
    assert!(right.verdict.is_correct());
    assert!((right.similarity_percentage - 100.0).abs() < 1e-3);

    let wrong = scorer
        .score(reference, "Traits describe shared behavior.")
        .await
        .unwrap();
    assert_eq!(wrong.verdict, Verdict::Incorrect);

    // Aggregate and persist this session's results.
    let mut aggregator = ProficiencyAggregator::new();
    aggregator.record("ownership", right.verdict);
    aggregator.record("ownership", wrong.verdict);
    let current = aggregator.snapshot();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("proficiency_report.json");
    ProficiencyReport::new(current.clone()).save(&path).await.unwrap();

    // Next session: load the prior report and measure progress.
    let prior = ProficiencyReport::load_previous(&path).await.unwrap();
    assert_eq!(prior.topics, current);

    let mut next_session = ProficiencyAggregator::new();
    next_session.record("ownership", Verdict::Correct);
    next_session.record("ownership", Verdict::Correct);

    let deltas = ProficiencyAggregator::diff(&prior.topics, &next_session.snapshot());
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].topic, "ownership");
    // 50% in the prior session, 100% now.
    assert!((deltas[0].percentage_point_change - 50.0).abs() < 1e-4);
}
