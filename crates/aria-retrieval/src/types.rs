//! Persisted index schema and per-query result types.
//!
//! The index file is produced by the offline export pipeline with snake_case
//! keys. camelCase aliases are accepted so hand-written fixtures work too.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page reference as stored by the exporter (usually an integer).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRef {
    /// Numeric page.
    Number(u64),
    /// Free-form page label (e.g. `"iv"`).
    Label(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

/// Metadata attached to a chunk. Unknown keys are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Human-readable source title.
    #[serde(default, alias = "sourceName", skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    /// Page within the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRef>,
    /// Remaining exporter metadata.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChunkMetadata {
    /// Citation label: `source_name`, else the file name of `source`, else
    /// `"Unknown source"`, followed by the page when known.
    pub fn citation(&self) -> String {
        let source = self
            .source_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.source.as_deref().map(|s| {
                    s.rsplit(['/', '\\'])
                        .next()
                        .unwrap_or(s)
                        .to_string()
                })
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown source".to_string());

        match &self.page {
            Some(page) => format!("{source}, p. {page}"),
            None => source,
        }
    }
}

/// Large retained excerpt. Returned as context, never embedded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParentChunk {
    /// Unique parent ID.
    pub id: String,
    /// Full excerpt text.
    pub content: String,
    /// Source metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// Small excerpt whose embedding anchors search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildChunk {
    /// Unique child ID.
    pub id: String,
    /// Excerpt text that was embedded.
    pub text: String,
    /// ID of the owning parent chunk.
    #[serde(alias = "parentId")]
    pub parent_id: String,
    /// Source metadata.
    #[serde(default)]
    pub metadata: ChunkMetadata,
    /// Precomputed embedding.
    pub embedding: Vec<f32>,
}

/// The persisted index as written by the exporter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeIndex {
    /// Schema version.
    pub version: u32,
    /// Model the child embeddings were computed with.
    #[serde(alias = "embeddingModel")]
    pub embedding_model: String,
    /// Chunking strategy name (informational).
    #[serde(default, alias = "chunkingStrategy")]
    pub chunking_strategy: String,
    /// Parent chunks.
    #[serde(default, alias = "parentChunks")]
    pub parent_chunks: Vec<ParentChunk>,
    /// Child chunks.
    #[serde(default, alias = "childChunks")]
    pub child_chunks: Vec<ChildChunk>,
}

/// The child that produced a match, without its embedding.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMatch {
    /// Child ID.
    pub id: String,
    /// Child excerpt text.
    pub text: String,
    /// Child metadata.
    pub metadata: ChunkMetadata,
}

impl From<&ChildChunk> for ChildMatch {
    fn from(child: &ChildChunk) -> Self {
        Self {
            id: child.id.clone(),
            text: child.text.clone(),
            metadata: child.metadata.clone(),
        }
    }
}

/// One ranked result: a parent plus the best-scoring child that led to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Parent chunk returned as context.
    pub parent_chunk: ParentChunk,
    /// Highest-scoring child of that parent.
    pub matched_child_chunk: ChildMatch,
    /// Cosine similarity of the matched child.
    pub score: f32,
}

/// Ranking options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchOptions {
    /// Maximum results.
    pub top_k: usize,
    /// Minimum score (inclusive).
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.5,
        }
    }
}

impl SearchOptions {
    /// Options from retrieval settings.
    pub fn from_settings(s: &aria_settings::RetrievalSettings) -> Self {
        Self {
            top_k: s.top_k,
            min_score: s.min_score,
        }
    }
}
