//! Remote embedding client over an `OpenAI`-compatible endpoint.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scholar_core::{EmbeddingSettings, Error, Result, RetryPolicy, with_retry_outcome};

/// A single embedding vector.
pub type Embedding = Vec<f32>;

/// Trait for generating embeddings from text.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for `text`.
    ///
    /// # Errors
    /// Returns an error if embedding generation fails. Providers backed by a
    /// remote service surface [`Error::EmbeddingUnavailable`] once their
    /// retry budget is exhausted, and never a fabricated vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Embedding>> + Send;

    /// Dimensionality of vectors produced by this provider, if fixed.
    fn dimensions(&self) -> Option<usize>;
}

/// Request payload sent to the embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    /// Model identifier understood by the embedding service.
    model: String,
    /// Input texts to embed; this client always sends exactly one.
    input: Vec<String>,
}

/// Response payload returned by the embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    /// One entry per input text.
    data: Vec<EmbeddingData>,
}

/// A single embedding entry in the response.
#[derive(Debug, Deserialize)]
struct EmbeddingData {
    /// The embedding vector.
    embedding: Vec<f32>,
}

/// Embedding client for an `OpenAI`-compatible `/v1/embeddings` endpoint.
///
/// Each client carries its own configuration (endpoint, key, model, retry
/// policy), so differently configured clients can coexist in one process.
/// Transient remote failures are retried with randomized exponential
/// backoff; exhausting the budget surfaces [`Error::EmbeddingUnavailable`].
pub struct OpenAiEmbeddingClient {
    /// HTTP client for API requests.
    client: Client,
    /// Embeddings endpoint URL.
    api_url: String,
    /// Bearer token for the endpoint.
    api_key: String,
    /// Model identifier sent with every request.
    model: String,
    /// Expected vector dimensionality, if fixed.
    dimensions: Option<usize>,
    /// Maximum accepted input length in chars; longer input is truncated.
    max_input_chars: usize,
    /// Retry policy for transient failures.
    retry: RetryPolicy,
    /// Memoized embeddings for identical input, when enabled.
    memo: Option<Mutex<HashMap<String, Embedding>>>,
}

impl OpenAiEmbeddingClient {
    /// Creates a client from the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured or in the environment,
    /// or if the HTTP client cannot be constructed.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            max_input_chars: settings.max_input_chars,
            retry: settings.retry_policy(),
            memo: settings
                .memoize
                .then(|| Mutex::new(HashMap::default())),
        })
    }

    /// Replaces the retry policy (for example to add a total deadline or a
    /// jitter seed).
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Truncates over-long input at a char boundary. Chunking is the
    /// caller's job; this only guards the wire request.
    fn prepare_input(&self, text: &str) -> String {
        if text.chars().count() > self.max_input_chars {
            debug!(
                limit = self.max_input_chars,
                "Truncating over-long embedding input"
            );
            text.chars().take(self.max_input_chars).collect()
        } else {
            text.to_owned()
        }
    }

    /// Performs a single embedding request without retries.
    async fn request_embedding(&self, input: &str) -> Result<Embedding> {
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input: vec![input.to_owned()],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Provider {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: EmbeddingsResponse = response.json().await.map_err(|error| {
            Error::InvalidResponse(format!("failed to parse embeddings response: {error}"))
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| Error::InvalidResponse("no embedding in response".to_owned()))?;

        self.validate_vector(vector)
    }

    /// Checks the embedding contract: non-empty, finite components, expected
    /// dimensionality.
    fn validate_vector(&self, vector: Embedding) -> Result<Embedding> {
        if vector.is_empty() {
            return Err(Error::InvalidResponse("empty embedding vector".to_owned()));
        }
        if let Some(expected) = self.dimensions
            && vector.len() != expected
        {
            return Err(Error::InvalidResponse(format!(
                "expected {expected} dimensions, got {}",
                vector.len()
            )));
        }
        if !vector.iter().all(|component| component.is_finite()) {
            return Err(Error::InvalidResponse(
                "non-finite component in embedding".to_owned(),
            ));
        }
        Ok(vector)
    }

    /// Looks up a memoized embedding for `input`.
    fn memo_get(&self, input: &str) -> Option<Embedding> {
        self.memo.as_ref().and_then(|memo| {
            memo.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(input)
                .cloned()
        })
    }

    /// Stores an embedding for `input`, when memoization is enabled.
    fn memo_insert(&self, input: String, vector: &Embedding) {
        if let Some(memo) = &self.memo {
            memo.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(input, vector.clone());
        }
    }
}

impl EmbeddingProvider for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let input = self.prepare_input(text);

        if let Some(hit) = self.memo_get(&input) {
            return Ok(hit);
        }

        let outcome =
            with_retry_outcome(&self.retry, || self.request_embedding(&input)).await;

        match outcome.result {
            Ok(vector) => {
                self.memo_insert(input, &vector);
                Ok(vector)
            }
            // A transient error surviving the retry loop means the budget is
            // exhausted; terminal errors pass through unchanged.
            Err(error) if error.is_retryable() => Err(Error::EmbeddingUnavailable {
                attempts: outcome.attempts,
                last_error: error.to_string(),
            }),
            Err(error) => Err(error),
        }
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}
