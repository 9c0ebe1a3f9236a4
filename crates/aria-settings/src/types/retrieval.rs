use aria_core::RetryConfig;
use serde::{Deserialize, Serialize};

/// Default Gemini REST base URL.
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedding model used to build the index. Queries must use the same model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/text-embedding-004";

/// Retrieval pipeline settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Whether semantic retrieval runs at all.
    pub enabled: bool,
    /// Path to the persisted index JSON (may start with `~/`).
    pub index_path: String,
    /// Base URL of the embedding provider.
    pub embedding_base_url: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Maximum results returned per query.
    pub top_k: usize,
    /// Minimum cosine similarity for a result to qualify.
    pub min_score: f32,
    /// Per-attempt timeout for the embedding call.
    pub timeout_ms: u64,
    /// Retry policy for the embedding call.
    pub retry: RetryConfig,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            index_path: "~/.aria/actuarial-index.json".to_string(),
            embedding_base_url: DEFAULT_EMBEDDING_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            top_k: 5,
            min_score: 0.5,
            timeout_ms: 10_000,
            retry: RetryConfig::default(),
        }
    }
}

impl RetrievalSettings {
    /// Resolve the index path, expanding `~/` to the home directory.
    pub fn resolved_index_path(&self) -> String {
        if let Some(rest) = self.index_path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return format!("{home}/{rest}");
            }
        }
        self.index_path.clone()
    }
}
