//! Query embedding via an external provider.
//!
//! [`QueryEmbedder::embed`] makes exactly one request. Retry, timeout, and
//! cancellation belong to the caller (see [`crate::retry`]).

use aria_core::ValidationError;
use aria_core::retry::parse_retry_after_header;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::errors::{Result, RetrievalError};

/// Turns query text into a vector.
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    /// Embed `text` using `credential` for the provider.
    ///
    /// Empty text or a missing credential fail with a validation error
    /// before any network call.
    async fn embed(&self, text: &str, credential: &str) -> Result<Vec<f32>>;
}

/// Reject inputs that must never reach the network.
pub fn validate_embed_input(text: &str, credential: &str) -> std::result::Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if credential.trim().is_empty() {
        return Err(ValidationError::MissingCredential);
    }
    Ok(())
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

/// Gemini `embedContent` client.
#[derive(Clone, Debug)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiEmbedder {
    /// Create an embedder with a fresh HTTP client.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_client(base_url, model, reqwest::Client::new())
    }

    /// Create an embedder sharing an existing HTTP client.
    pub fn with_client(
        base_url: impl Into<String>,
        model: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Model identifier in `models/<name>` form.
    pub fn model(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:embedContent", self.base_url, self.model())
    }
}

#[async_trait]
impl QueryEmbedder for GeminiEmbedder {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn embed(&self, text: &str, credential: &str) -> Result<Vec<f32>> {
        validate_embed_input(text, credential)?;

        let body = json!({
            "model": self.model(),
            "content": { "parts": [{ "text": text }] },
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential)
            .json(&body)
            .send()
            .await
            .map_err(RetrievalError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after_header);
            let body_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "embedding provider error");
            return Err(RetrievalError::status(status.as_u16(), &body_text, retry_after).into());
        }

        let body_text = response.text().await.map_err(RetrievalError::Http)?;
        let values = serde_json::from_str::<EmbedContentResponse>(&body_text)
            .ok()
            .and_then(|r| r.embedding)
            .map(|e| e.values)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RetrievalError::malformed(&body_text))?;

        debug!(dimensions = values.len(), "query embedded");
        Ok(values)
    }
}
