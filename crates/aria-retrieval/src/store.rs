//! Process-wide, read-only knowledge index.
//!
//! [`IndexStore`] loads the index at most once. Loading goes through a
//! `tokio::sync::OnceCell`, so concurrent callers all await the same load
//! and a second load can never start while one is in flight. A failed load
//! leaves the cell empty and the next `initialize` call tries again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aria_core::ConfigError;
use aria_core::errors::ConfigResult;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::types::{ChildChunk, KnowledgeIndex, ParentChunk};

/// Index schema versions this build can read. Version 2 is the
/// parent/child hierarchy.
pub const SUPPORTED_INDEX_VERSIONS: &[u32] = &[2];

/// Summary computed once when the index is loaded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexStats {
    /// Number of parent chunks.
    pub parent_count: usize,
    /// Number of child chunks.
    pub child_count: usize,
    /// Dominant embedding dimensionality across children.
    pub dimensions: usize,
    /// Children whose `parent_id` does not resolve.
    pub orphaned_children: usize,
    /// Children whose embedding length differs from `dimensions`.
    pub inconsistent_embeddings: usize,
    /// Shortest parent content, in chars.
    pub min_parent_chars: usize,
    /// Mean parent content length, in chars.
    pub avg_parent_chars: usize,
    /// Longest parent content, in chars.
    pub max_parent_chars: usize,
}

/// A validated index with its lookup tables.
#[derive(Debug)]
pub struct LoadedIndex {
    index: KnowledgeIndex,
    parents_by_id: HashMap<String, usize>,
    /// Parent position per child; `None` for orphans and for children whose
    /// embedding has the wrong length. Such children are never ranked.
    searchable_parent: Vec<Option<usize>>,
    stats: IndexStats,
}

impl LoadedIndex {
    /// Validate an index and build its lookup tables.
    ///
    /// Fails on an unsupported version or an empty chunk array. Orphaned
    /// children and inconsistent embeddings are logged, not fatal.
    pub fn from_index(index: KnowledgeIndex) -> ConfigResult<Self> {
        if !SUPPORTED_INDEX_VERSIONS.contains(&index.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: index.version,
                supported: SUPPORTED_INDEX_VERSIONS,
            });
        }
        if index.parent_chunks.is_empty() {
            return Err(ConfigError::EmptyChunks {
                field: "parent_chunks",
            });
        }
        if index.child_chunks.is_empty() {
            return Err(ConfigError::EmptyChunks {
                field: "child_chunks",
            });
        }

        let mut parents_by_id = HashMap::with_capacity(index.parent_chunks.len());
        for (pos, parent) in index.parent_chunks.iter().enumerate() {
            if parents_by_id.insert(parent.id.clone(), pos).is_some() {
                warn!(parent_id = %parent.id, "duplicate parent id, keeping last");
            }
        }

        let dimensions = dominant_dimension(&index.child_chunks);
        let mut orphaned_children = 0;
        let mut inconsistent_embeddings = 0;
        let searchable_parent = index
            .child_chunks
            .iter()
            .map(|child| {
                let parent = parents_by_id.get(&child.parent_id).copied();
                if parent.is_none() {
                    orphaned_children += 1;
                    debug!(child_id = %child.id, parent_id = %child.parent_id, "orphaned child chunk");
                }
                if child.embedding.len() != dimensions {
                    inconsistent_embeddings += 1;
                    debug!(
                        child_id = %child.id,
                        expected = dimensions,
                        actual = child.embedding.len(),
                        "inconsistent embedding dimension"
                    );
                    return None;
                }
                parent
            })
            .collect();

        let lengths: Vec<usize> = index
            .parent_chunks
            .iter()
            .map(|p| p.content.chars().count())
            .collect();
        let stats = IndexStats {
            parent_count: index.parent_chunks.len(),
            child_count: index.child_chunks.len(),
            dimensions,
            orphaned_children,
            inconsistent_embeddings,
            min_parent_chars: lengths.iter().copied().min().unwrap_or(0),
            avg_parent_chars: lengths.iter().sum::<usize>() / lengths.len(),
            max_parent_chars: lengths.iter().copied().max().unwrap_or(0),
        };

        if orphaned_children > 0 {
            warn!(orphans = orphaned_children, "child chunks reference unknown parents; they will be skipped");
        }
        if inconsistent_embeddings > 0 {
            warn!(
                count = inconsistent_embeddings,
                dimensions, "child embeddings with inconsistent dimensionality; they will be skipped"
            );
        }

        Ok(Self {
            index,
            parents_by_id,
            searchable_parent,
            stats,
        })
    }

    /// Parse and validate index JSON.
    pub fn parse(json: &str) -> ConfigResult<Self> {
        let index: KnowledgeIndex = serde_json::from_str(json)?;
        Self::from_index(index)
    }

    /// Read, parse, and validate an index file.
    pub fn read(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Look up a parent by ID.
    pub fn parent(&self, id: &str) -> Option<&ParentChunk> {
        self.parents_by_id
            .get(id)
            .map(|&pos| &self.index.parent_chunks[pos])
    }

    /// All parent chunks.
    pub fn parents(&self) -> &[ParentChunk] {
        &self.index.parent_chunks
    }

    /// All child chunks.
    pub fn children(&self) -> &[ChildChunk] {
        &self.index.child_chunks
    }

    /// Children that can be ranked, with their parent.
    pub fn searchable(&self) -> impl Iterator<Item = (&ChildChunk, &ParentChunk)> {
        self.index
            .child_chunks
            .iter()
            .zip(&self.searchable_parent)
            .filter_map(|(child, parent)| {
                parent.map(|pos| (child, &self.index.parent_chunks[pos]))
            })
    }

    /// Embedding dimensionality of the index.
    pub fn dimensions(&self) -> usize {
        self.stats.dimensions
    }

    /// Model the index was embedded with.
    pub fn embedding_model(&self) -> &str {
        &self.index.embedding_model
    }

    /// Load-time statistics.
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

/// Most common non-zero embedding length; ties go to the length seen first.
fn dominant_dimension(children: &[ChildChunk]) -> usize {
    // length -> (count, first position)
    let mut seen: HashMap<usize, (usize, usize)> = HashMap::new();
    for (pos, child) in children.iter().enumerate() {
        let len = child.embedding.len();
        if len == 0 {
            continue;
        }
        seen.entry(len).or_insert((0, pos)).0 += 1;
    }
    seen
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map_or(0, |(len, _)| len)
}

/// Lazily loaded, shared, immutable index.
#[derive(Debug)]
pub struct IndexStore {
    path: PathBuf,
    cell: OnceCell<Arc<LoadedIndex>>,
}

impl IndexStore {
    /// Create a store that will load from `path` on [`initialize`](Self::initialize).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Create a store that is already loaded.
    pub fn from_loaded(index: LoadedIndex) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::new_with(Some(Arc::new(index))),
        }
    }

    /// Load the index if it is not loaded yet.
    ///
    /// A no-op once loaded. Concurrent callers share the in-flight load.
    pub async fn initialize(&self) -> ConfigResult<Arc<LoadedIndex>> {
        self.cell
            .get_or_try_init(|| async {
                let path = self.path.clone();
                info!(path = %path.display(), "loading knowledge index");
                let loaded = tokio::task::spawn_blocking(move || LoadedIndex::read(&path))
                    .await
                    .map_err(|e| ConfigError::Io(std::io::Error::other(e)))??;
                let stats = loaded.stats();
                info!(
                    parents = stats.parent_count,
                    children = stats.child_count,
                    dimensions = stats.dimensions,
                    model = %loaded.embedding_model(),
                    "knowledge index loaded"
                );
                Ok::<_, ConfigError>(Arc::new(loaded))
            })
            .await
            .cloned()
    }

    /// Whether a valid index is loaded.
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    /// The loaded index, if any.
    pub fn get(&self) -> Option<Arc<LoadedIndex>> {
        self.cell.get().cloned()
    }

    /// Path the store loads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
