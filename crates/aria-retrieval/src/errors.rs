//! Retrieval error types.
//!
//! All retrieval errors are non-fatal for the agent: the service boundary
//! turns them into "no context" and logs the cause. Only [`ConfigError`]
//! raised by [`crate::IndexStore::initialize`] is meant to stop startup.

use aria_core::{ConfigError, ValidationError};
use thiserror::Error;

/// Maximum body length kept in error messages.
const MAX_BODY_CHARS: usize = 2_000;

/// Failures talking to the embedding provider.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("embedding provider returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
        /// Parsed `Retry-After` delay, if the provider sent one.
        retry_after_ms: Option<u64>,
    },

    /// The response did not contain `embedding.values`.
    #[error("malformed embedding response: {body}")]
    MalformedResponse {
        /// Response body (truncated).
        body: String,
    },

    /// A single attempt exceeded its timeout.
    #[error("embedding request timed out after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The caller cancelled the request.
    #[error("embedding request cancelled")]
    Cancelled,
}

impl RetrievalError {
    /// Build a status error, truncating the body for diagnostics.
    pub fn status(status: u16, body: &str, retry_after_ms: Option<u64>) -> Self {
        Self::Status {
            status,
            body: truncate_body(body),
            retry_after_ms,
        }
    }

    /// Build a malformed-response error, truncating the body.
    pub fn malformed(body: &str) -> Self {
        Self::MalformedResponse {
            body: truncate_body(body),
        }
    }

    /// Whether another attempt might succeed.
    ///
    /// Rate limits, server errors, transport failures, and timeouts are
    /// retryable. Client errors, malformed bodies, and cancellation are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder() && !e.is_decode(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout { .. } => true,
            Self::MalformedResponse { .. } | Self::Cancelled => false,
        }
    }

    /// Server-requested delay before retrying.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Status { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Any failure on the search path.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The index could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller input was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The embedding provider failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// `search` was called before the index finished loading.
    #[error("knowledge index is not loaded")]
    NotReady,
}

impl SearchError {
    /// Whether retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval(e) if e.is_retryable())
    }
}

/// Result alias for retrieval operations.
pub type Result<T> = std::result::Result<T, SearchError>;

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_display_includes_body() {
        let err = RetrievalError::status(503, "overloaded", None);
        assert_eq!(
            err.to_string(),
            "embedding provider returned HTTP 503: overloaded"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(RetrievalError::status(429, "", Some(1000)).is_retryable());
        assert!(RetrievalError::status(500, "", None).is_retryable());
        assert!(RetrievalError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(!RetrievalError::status(400, "bad", None).is_retryable());
        assert!(!RetrievalError::status(403, "key", None).is_retryable());
        assert!(!RetrievalError::malformed("{}").is_retryable());
        assert!(!RetrievalError::Cancelled.is_retryable());
    }

    #[test]
    fn retry_after_only_on_status() {
        assert_eq!(
            RetrievalError::status(429, "", Some(2000)).retry_after_ms(),
            Some(2000)
        );
        assert_eq!(RetrievalError::Cancelled.retry_after_ms(), None);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(MAX_BODY_CHARS + 50);
        let err = RetrievalError::malformed(&body);
        assert_matches!(err, RetrievalError::MalformedResponse { ref body } if body.len() == MAX_BODY_CHARS + 3);
    }

    #[test]
    fn search_error_conversions() {
        let err: SearchError = ValidationError::EmptyQuery.into();
        assert_matches!(err, SearchError::Validation(ValidationError::EmptyQuery));
        assert!(!err.is_retryable());

        let err: SearchError = RetrievalError::status(502, "", None).into();
        assert!(err.is_retryable());
        assert_eq!(
            SearchError::NotReady.to_string(),
            "knowledge index is not loaded"
        );
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RetrievalError>();
        assert_send_sync::<SearchError>();
    }
}
