use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for scholar operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur across the scholar crates.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed before a response was produced.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// The embedding provider returned an error response.
    ///
    /// `status` is the HTTP status code when one was received; `None` means
    /// the failure happened below the HTTP layer (connect, timeout).
    #[error("Provider error (status {status:?}): {message}")]
    Provider {
        /// HTTP status code reported by the provider, if any.
        status: Option<u16>,
        /// Error message reported by the provider or synthesized locally.
        message: String,
    },

    /// The provider returned a response that does not satisfy the embedding
    /// contract (missing data, wrong dimensionality, non-finite components).
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// The remote embedding call exhausted its retry budget.
    ///
    /// Surfaced to the caller instead of a fabricated vector or score; the
    /// caller decides whether to skip, abort, or report "unable to grade".
    #[error("embedding provider unavailable after {attempts} attempts: {last_error}")]
    EmbeddingUnavailable {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Description of the last transient failure.
        last_error: String,
    },

    /// A retrieval query was rejected before execution (zero `k`, mismatched
    /// query dimensionality).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A similarity computation received a zero-magnitude embedding.
    #[error("degenerate embedding ({0}): cosine similarity is undefined")]
    DegenerateEmbedding(String),

    /// A persisted proficiency report could not be parsed.
    #[error("Malformed proficiency report: {0}")]
    MalformedReport(String),

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Transport failures and provider errors without a status (connect,
    /// timeout) are transient, as are rate limits (429) and server errors
    /// (5xx). Everything else — bad requests, auth failures, malformed
    /// responses — is terminal and retrying would only repeat the failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Provider { status, .. } => {
                status.is_none_or(|code| code == 429 || code >= 500)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let error1 = Error::Config("invalid config".to_owned());
        assert_eq!(error1.to_string(), "Configuration error: invalid config");

        let error2 = Error::MissingApiKey("OPENAI_API_KEY".to_owned());
        assert_eq!(error2.to_string(), "API key not found: OPENAI_API_KEY");

        let error3 = Error::EmbeddingUnavailable {
            attempts: 6,
            last_error: "status 503".to_owned(),
        };
        assert_eq!(
            error3.to_string(),
            "embedding provider unavailable after 6 attempts: status 503"
        );
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_retryable() {
        let rate_limited = Error::Provider {
            status: Some(429),
            message: "too many requests".to_owned(),
        };
        assert!(rate_limited.is_retryable());

        let server_error = Error::Provider {
            status: Some(503),
            message: "service unavailable".to_owned(),
        };
        assert!(server_error.is_retryable());

        let transport = Error::Provider {
            status: None,
            message: "connection reset".to_owned(),
        };
        assert!(transport.is_retryable());
    }

    #[test]
    fn test_client_and_local_errors_are_terminal() {
        let bad_request = Error::Provider {
            status: Some(400),
            message: "invalid input".to_owned(),
        };
        assert!(!bad_request.is_retryable());

        let auth = Error::Provider {
            status: Some(401),
            message: "invalid key".to_owned(),
        };
        assert!(!auth.is_retryable());

        assert!(!Error::Config("bad config".to_owned()).is_retryable());
        assert!(!Error::InvalidQuery("k must be positive".to_owned()).is_retryable());
        assert!(!Error::DegenerateEmbedding("reference".to_owned()).is_retryable());
        assert!(!Error::InvalidResponse("no data".to_owned()).is_retryable());
        assert!(
            !Error::EmbeddingUnavailable {
                attempts: 6,
                last_error: "timeout".to_owned(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
        assert!(!error.is_retryable());
    }
}
