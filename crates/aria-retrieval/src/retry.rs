//! Bounded retry around a single embedding call.
//!
//! Each attempt runs under its own timeout. The cancellation token is
//! checked before every attempt, raced against every attempt, and raced
//! against every backoff sleep. A `Retry-After` hint wins when it is longer
//! than the computed backoff.

use std::time::Duration;

use aria_core::RetryConfig;
use aria_settings::RetrievalSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::embedder::{QueryEmbedder, validate_embed_input};
use crate::errors::{Result, RetrievalError, SearchError};

/// Retry and timeout policy for the embedding call.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedPolicy {
    /// Backoff parameters and retry count.
    pub retry: RetryConfig,
    /// Timeout applied to each attempt.
    pub timeout: Duration,
}

impl Default for EmbedPolicy {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl EmbedPolicy {
    /// Policy from retrieval settings.
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self {
            retry: settings.retry.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        }
    }
}

/// Embed `text`, retrying retryable failures with jittered backoff.
///
/// Validation errors and non-retryable provider errors return immediately.
/// Cancellation yields [`RetrievalError::Cancelled`].
pub async fn embed_with_retry(
    embedder: &dyn QueryEmbedder,
    text: &str,
    credential: &str,
    policy: &EmbedPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<f32>> {
    validate_embed_input(text, credential)?;

    let max_retries = policy.retry.max_retries;
    let timeout_ms = u64::try_from(policy.timeout.as_millis()).unwrap_or(u64::MAX);
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RetrievalError::Cancelled.into());
        }

        let outcome = tokio::select! {
            () = cancel.cancelled() => return Err(RetrievalError::Cancelled.into()),
            res = tokio::time::timeout(policy.timeout, embedder.embed(text, credential)) => {
                res.unwrap_or_else(|_| Err(RetrievalError::Timeout { timeout_ms }.into()))
            }
        };

        let err = match outcome {
            Ok(values) => {
                if attempt > 0 {
                    debug!(attempt, "embedding succeeded after retry");
                }
                return Ok(values);
            }
            Err(err) => err,
        };

        if !err.is_retryable() || attempt >= max_retries {
            return Err(err);
        }

        let backoff_ms = policy.retry.delay_for(attempt, rand::random::<f64>());
        let retry_after = match &err {
            SearchError::Retrieval(e) => e.retry_after_ms(),
            _ => None,
        };
        let delay_ms = retry_after.map_or(backoff_ms, |ra| backoff_ms.max(ra));
        attempt += 1;

        warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "embedding call failed, retrying"
        );

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
            () = cancel.cancelled() => return Err(RetrievalError::Cancelled.into()),
        }
    }
}
