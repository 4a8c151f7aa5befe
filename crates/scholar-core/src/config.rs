//! Configuration for embedding, scoring, and report persistence.
//!
//! Every client is constructed from an explicit settings object — there is
//! no process-global client or key. Two differently configured clients
//! (different keys, models, retry budgets) can coexist in one process.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Env var consulted for the embedding API key when none is configured.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var overriding the configured embedding model.
pub const ENV_EMBEDDING_MODEL: &str = "EMBEDDING_MODEL";
/// Default `OpenAI`-compatible embeddings endpoint.
pub const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";
/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default similarity threshold, in percentage points.
///
/// Not calibrated against graded data; treat it as a starting point and
/// configure per deployment.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 75.0;

/// Complete configuration for the scholar crates.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarConfig {
    /// Embedding client configuration.
    pub embedding: EmbeddingSettings,
    /// Answer-scoring configuration.
    pub scoring: ScoringSettings,
    /// Proficiency report persistence configuration.
    pub report: ReportSettings,
}

impl ScholarConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Loads configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

/// Embedding client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `OpenAI`-compatible embeddings endpoint URL.
    pub api_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// API key; when `None`, `OPENAI_API_KEY` is consulted at client
    /// construction.
    pub api_key: Option<String>,
    /// Expected vector dimensionality; responses with a different length are
    /// rejected. `None` accepts whatever the model returns.
    pub dimensions: Option<usize>,
    /// Maximum input length in characters; longer input is truncated at a
    /// char boundary. Chunking stays the caller's responsibility.
    pub max_input_chars: usize,
    /// Maximum attempts per embedding call, including the first.
    pub max_attempts: u32,
    /// Initial backoff wait in milliseconds.
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_backoff_ms: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Whether to memoize embeddings for identical text within a client's
    /// lifetime.
    pub memoize: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_EMBEDDING_API_URL.to_owned(),
            model: DEFAULT_EMBEDDING_MODEL.to_owned(),
            api_key: None,
            dimensions: Some(1536),
            max_input_chars: 8000,
            max_attempts: 6,
            initial_backoff_ms: 1000,
            max_backoff_ms: 20_000,
            request_timeout_secs: 30,
            memoize: true,
        }
    }
}

impl EmbeddingSettings {
    /// Builds settings from defaults plus environment overrides
    /// (`EMBEDDING_MODEL`).
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(model) = env::var(ENV_EMBEDDING_MODEL) {
            settings.model = model;
        }
        settings
    }

    /// Resolves the API key from these settings or the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] when neither the settings nor
    /// `OPENAI_API_KEY` provide one.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        env::var(ENV_OPENAI_API_KEY)
            .map_err(|_| Error::MissingApiKey(ENV_OPENAI_API_KEY.to_owned()))
    }

    /// Builds the retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            2.0,
            0.1,
            self.max_attempts,
        )
    }
}

/// Answer-scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Similarity threshold in percentage points; an answer at or above it
    /// is graded correct.
    pub threshold: f32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Proficiency report persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Path of the persisted per-topic report.
    pub path: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("proficiency_report.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_embedding_contract() {
        let config = ScholarConfig::default();
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.embedding.max_attempts, 6);
        assert_eq!(config.embedding.dimensions, Some(1536));
        assert!((config.scoring.threshold - 75.0).abs() < f32::EPSILON);
        assert_eq!(
            config.report.path,
            PathBuf::from("proficiency_report.json")
        );
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = EmbeddingSettings::default();
        let policy = settings.retry_policy();
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(20));
        assert_eq!(policy.max_attempts, 6);
    }

    #[test]
    fn test_configured_key_wins_over_environment() {
        let settings = EmbeddingSettings {
            api_key: Some("sk-test".to_owned()),
            ..EmbeddingSettings::default()
        };
        let key = settings.resolve_api_key().unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ScholarConfig = toml::from_str(
            r#"
            [embedding]
            model = "text-embedding-3-large"
            dimensions = 3072

            [scoring]
            threshold = 80.0
            "#,
        )
        .unwrap();

        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.dimensions, Some(3072));
        assert_eq!(config.embedding.max_attempts, 6);
        assert!((config.scoring.threshold - 80.0).abs() < f32::EPSILON);
        assert_eq!(
            config.report.path,
            PathBuf::from("proficiency_report.json")
        );
    }
}
