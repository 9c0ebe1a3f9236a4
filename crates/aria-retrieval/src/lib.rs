//! # aria-retrieval
//!
//! Semantic retrieval over a persisted parent/child knowledge index.
//!
//! Pipeline: [`IndexStore`] → [`QueryEmbedder`] → [`rank`] →
//! [`format_retrieval_context`].
//!
//! - Child chunks (small excerpts) carry the embeddings that are searched
//! - Parent chunks (large excerpts) are what ends up in the prompt
//! - Ranking is a brute-force cosine scan, deduplicated by parent
//!
//! [`RetrievalService`] is the boundary used by prompt assembly: every
//! failure on the retrieval path degrades to "no context".

#![deny(unsafe_code)]

pub mod embedder;
pub mod errors;
pub mod format;
pub mod retry;
pub mod service;
pub mod similarity;
pub mod store;
pub mod types;

pub use embedder::{GeminiEmbedder, QueryEmbedder};
pub use errors::{Result, RetrievalError, SearchError};
pub use format::format_retrieval_context;
pub use retry::{EmbedPolicy, embed_with_retry};
pub use service::RetrievalService;
pub use similarity::{cosine_similarity, rank};
pub use store::{IndexStats, IndexStore, LoadedIndex, SUPPORTED_INDEX_VERSIONS};
pub use types::{
    ChildChunk, ChildMatch, ChunkMetadata, KnowledgeIndex, PageRef, ParentChunk, SearchOptions,
    SearchResult,
};
