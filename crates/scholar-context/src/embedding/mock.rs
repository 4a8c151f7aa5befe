//! Mock embedding provider for testing.
//!
//! Allows canned vectors for specific texts, deterministic hash-based
//! vectors for everything else, and scripted transient failures, enabling
//! end-to-end testing of retrieval and scoring without real API calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use scholar_core::{Error, Result};

use super::client::{Embedding, EmbeddingProvider};

/// Default dimensionality of mock vectors.
const MOCK_DIMENSIONS: usize = 384;

/// Mock provider returning deterministic embeddings.
///
/// Identical text always produces an identical vector; empty text produces a
/// zero vector, modelling the degenerate case. Scripted failures are
/// transient (HTTP 503) so retry behavior can be exercised.
#[derive(Clone)]
pub struct MockEmbeddingClient {
    /// Canned vectors keyed by exact input text.
    responses: Arc<Mutex<HashMap<String, Embedding>>>,
    /// Remaining scripted transient failures.
    failures_remaining: Arc<AtomicU32>,
    /// Number of `embed` calls made, including failed ones.
    call_count: Arc<AtomicU32>,
    /// Dimensionality of generated vectors.
    dimensions: usize,
}

impl Default for MockEmbeddingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingClient {
    /// Creates a mock with hash-based vectors of the default dimensionality.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::default())),
            failures_remaining: Arc::new(AtomicU32::new(0)),
            call_count: Arc::new(AtomicU32::new(0)),
            dimensions: MOCK_DIMENSIONS,
        }
    }

    /// Sets the dimensionality of generated vectors.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Adds a canned vector for an exact input text.
    #[must_use]
    pub fn with_vector(self, text: impl Into<String>, vector: Embedding) -> Self {
        {
            let mut responses = self
                .responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            responses.insert(text.into(), vector);
        }
        self
    }

    /// Scripts the next `count` calls to fail with a transient error.
    #[must_use]
    pub fn with_transient_failures(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `embed` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Deterministic hash-based vector; empty text maps to the zero vector.
    fn deterministic_embedding(&self, text: &str) -> Embedding {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash as _, Hasher as _};

        if text.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        (0..self.dimensions)
            .map(|index| ((hash.wrapping_add(index as u64 * 31)) % 997) as f32 / 997.0)
            .collect()
    }
}

impl EmbeddingProvider for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let scripted_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();
        if scripted_failure {
            return Err(Error::Provider {
                status: Some(503),
                message: "scripted transient failure".to_owned(),
            });
        }

        let canned = {
            let responses = self
                .responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            responses.get(text).cloned()
        };

        Ok(canned.unwrap_or_else(|| self.deterministic_embedding(text)))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholar_core::{RetryPolicy, with_retry_outcome};
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            2.0,
            0.0,
            max_attempts,
        )
    }

    #[tokio::test]
    async fn test_identical_text_embeds_identically() {
        let mock = MockEmbeddingClient::new();
        let first = mock.embed("closures capture their environment").await.unwrap();
        let second = mock.embed("closures capture their environment").await.unwrap();
        assert_eq!(first.len(), MOCK_DIMENSIONS);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let mock = MockEmbeddingClient::new().with_dimensions(8);
        let vector = mock.embed("").await.unwrap();
        assert_eq!(vector, vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_canned_vector_wins_over_hash() {
        let mock = MockEmbeddingClient::new().with_vector("query", vec![1.0, 0.0]);
        assert_eq!(mock.embed("query").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_five_transient_failures_succeed_within_six_attempts() {
        let mock = MockEmbeddingClient::new().with_transient_failures(5);

        let outcome =
            with_retry_outcome(&fast_policy(6), || mock.embed("persistent student")).await;

        assert!(outcome.result.is_ok());
        assert_eq!(outcome.attempts, 6);
        assert_eq!(mock.call_count(), 6);
    }

    #[tokio::test]
    async fn test_six_transient_failures_exhaust_the_budget() {
        let mock = MockEmbeddingClient::new().with_transient_failures(6);

        let outcome =
            with_retry_outcome(&fast_policy(6), || mock.embed("unlucky student")).await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.attempts, 6);
        assert_eq!(mock.call_count(), 6);
    }
}
