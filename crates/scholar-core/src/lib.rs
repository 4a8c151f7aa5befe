//! Core types for the scholar workspace.
//!
//! This crate provides the shared error taxonomy, the retry policy used for
//! remote embedding calls, configuration types, and conversation session
//! state used across the scholar system.
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

/// Configuration types for embedding, scoring, and report persistence.
pub mod config;
/// Conversation session state.
pub mod conversation;
/// Error types and result definitions.
pub mod error;
/// Retry with randomized exponential backoff.
pub mod retry;

pub use config::{EmbeddingSettings, ReportSettings, ScholarConfig, ScoringSettings};
pub use conversation::{ConversationSession, ConversationTurn, Role};
pub use error::{Error, Result};
pub use retry::{RetryOutcome, RetryPolicy, with_retry, with_retry_outcome};
