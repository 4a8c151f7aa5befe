//! Semantic similarity scoring of answers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use scholar_core::config::DEFAULT_SIMILARITY_THRESHOLD;
use scholar_core::{Error, Result};
use scholar_context::{EmbeddingProvider, cosine_similarity};

/// Grading outcome of one answer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Similarity reached the threshold.
    Correct,
    /// Similarity fell below the threshold.
    Incorrect,
}

impl Verdict {
    /// Whether this verdict is [`Verdict::Correct`].
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// Similarity percentage and verdict for one comparison. Derived, never
/// mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Rescaled cosine similarity in [0, 100]; see
    /// [`SimilarityScorer::score`] for what this number is (and is not).
    pub similarity_percentage: f32,
    /// Pass/fail verdict against the threshold in effect.
    pub verdict: Verdict,
}

/// Grades a candidate answer against a reference answer by embedding both
/// and comparing cosine similarity to a threshold.
pub struct SimilarityScorer<E: EmbeddingProvider> {
    /// Embedding provider for both texts.
    provider: E,
    /// Default threshold in percentage points.
    threshold: f32,
}

impl<E: EmbeddingProvider> SimilarityScorer<E> {
    /// Creates a scorer with the default threshold
    /// ([`DEFAULT_SIMILARITY_THRESHOLD`]).
    pub fn new(provider: E) -> Self {
        Self {
            provider,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Overrides the default threshold for this scorer.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// The threshold used by [`Self::score`].
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scores `candidate` against `reference` with the scorer's threshold.
    ///
    /// The percentage is `(cos + 1) / 2 * 100`, a linear rescale of cosine
    /// similarity from [-1, 1] onto [0, 100]. It is NOT a probability of
    /// correctness — only a rescaled similarity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateEmbedding`] when either text embeds to a
    /// zero-magnitude vector (for example empty text). Embedding failures
    /// propagate unchanged — in particular
    /// [`Error::EmbeddingUnavailable`] is never converted into a low score;
    /// an ungradable answer is not an incorrect answer.
    pub async fn score(&self, reference: &str, candidate: &str) -> Result<ScoreResult> {
        self.score_with_threshold(reference, candidate, self.threshold)
            .await
    }

    /// Scores with an explicit threshold, overriding the scorer's default.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::score`].
    pub async fn score_with_threshold(
        &self,
        reference: &str,
        candidate: &str,
        threshold: f32,
    ) -> Result<ScoreResult> {
        // The two embeddings are independent; fetch them concurrently.
        let (reference_embedding, candidate_embedding) = tokio::try_join!(
            self.provider.embed(reference),
            self.provider.embed(candidate)
        )?;

        if reference_embedding.len() != candidate_embedding.len() {
            return Err(Error::InvalidResponse(format!(
                "embedding dimensionality mismatch: {} vs {}",
                reference_embedding.len(),
                candidate_embedding.len()
            )));
        }
        if magnitude(&reference_embedding) == 0.0 {
            return Err(Error::DegenerateEmbedding("reference answer".to_owned()));
        }
        if magnitude(&candidate_embedding) == 0.0 {
            return Err(Error::DegenerateEmbedding("candidate answer".to_owned()));
        }

        let cosine = cosine_similarity(&reference_embedding, &candidate_embedding);
        let similarity_percentage = ((cosine + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0);
        let verdict = if similarity_percentage >= threshold {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };

        debug!(similarity_percentage, threshold, "Scored answer");
        Ok(ScoreResult {
            similarity_percentage,
            verdict,
        })
    }
}

/// Euclidean magnitude of a vector.
fn magnitude(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|component| component * component)
        .sum::<f32>()
        .sqrt()
}
