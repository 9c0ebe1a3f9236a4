//! Retrieval boundary used by prompt assembly.
//!
//! [`RetrievalService::search`] surfaces every error. The
//! [`retrieve_context`](RetrievalService::retrieve_context) helpers turn all
//! failures into `None` so a flaky provider never blocks a response.

use std::sync::Arc;

use aria_core::errors::ConfigResult;
use aria_settings::RetrievalSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::embedder::{GeminiEmbedder, QueryEmbedder, validate_embed_input};
use crate::errors::{Result, SearchError};
use crate::format::format_retrieval_context;
use crate::retry::{EmbedPolicy, embed_with_retry};
use crate::similarity::rank;
use crate::store::{IndexStore, LoadedIndex};
use crate::types::{SearchOptions, SearchResult};

/// Index, embedder, and policy wired together.
pub struct RetrievalService {
    store: Arc<IndexStore>,
    embedder: Arc<dyn QueryEmbedder>,
    settings: RetrievalSettings,
}

impl RetrievalService {
    /// Wire explicit components.
    pub fn new(
        store: Arc<IndexStore>,
        embedder: Arc<dyn QueryEmbedder>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
        }
    }

    /// Build the default Gemini-backed service from settings.
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        let store = Arc::new(IndexStore::new(settings.resolved_index_path()));
        let embedder = Arc::new(GeminiEmbedder::new(
            settings.embedding_base_url.clone(),
            settings.embedding_model.clone(),
        ));
        Self::new(store, embedder, settings.clone())
    }

    /// Load the index. Errors here are fatal for the subsystem and must
    /// reach the operator.
    pub async fn initialize(&self) -> ConfigResult<()> {
        let index = self.store.initialize().await?;
        self.check_model(&index);
        Ok(())
    }

    /// Whether the index is loaded.
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Settings this service was built with.
    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Search with the given options.
    pub async fn search(
        &self,
        query: &str,
        credential: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        self.search_with_cancel(query, credential, options, &CancellationToken::new())
            .await
    }

    /// Search, aborting the embedding call when `cancel` fires.
    pub async fn search_with_cancel(
        &self,
        query: &str,
        credential: &str,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>> {
        validate_embed_input(query, credential)?;
        let index = self.store.get().ok_or(SearchError::NotReady)?;

        let policy = EmbedPolicy::from_settings(&self.settings);
        let vector = embed_with_retry(self.embedder.as_ref(), query, credential, &policy, cancel).await?;
        let results = rank(&vector, &index, options)?;

        debug!(
            results = results.len(),
            top_score = results.first().map(|r| r.score),
            "search complete"
        );
        Ok(results)
    }

    /// Search with configured options and render the prompt block.
    ///
    /// Returns `None` when retrieval is disabled, nothing qualifies, or any
    /// step fails.
    pub async fn retrieve_context(&self, query: &str, credential: &str) -> Option<String> {
        self.retrieve_context_with_cancel(query, credential, &CancellationToken::new())
            .await
    }

    /// [`retrieve_context`](Self::retrieve_context) with cancellation.
    pub async fn retrieve_context_with_cancel(
        &self,
        query: &str,
        credential: &str,
        cancel: &CancellationToken,
    ) -> Option<String> {
        if !self.settings.enabled {
            return None;
        }
        let options = SearchOptions::from_settings(&self.settings);
        match self.search_with_cancel(query, credential, &options, cancel).await {
            Ok(results) => {
                if results.is_empty() {
                    debug!("no passages above threshold");
                }
                format_retrieval_context(&results, query)
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "retrieval failed, continuing without context");
                None
            }
        }
    }

    fn check_model(&self, index: &LoadedIndex) {
        let configured = self.settings.embedding_model.trim_start_matches("models/");
        let indexed = index.embedding_model().trim_start_matches("models/");
        if configured == indexed {
            info!(model = %indexed, "retrieval ready");
        } else {
            warn!(
                configured = %self.settings.embedding_model,
                indexed = %index.embedding_model(),
                "query embedding model differs from index model; scores will be meaningless"
            );
        }
    }
}
