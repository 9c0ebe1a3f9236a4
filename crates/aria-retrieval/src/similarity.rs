//! Cosine similarity and brute-force ranking.
//!
//! Ranking scans every searchable child (O(N·D)). There is no
//! approximate-nearest-neighbor structure, so very large corpora will need
//! a different backend.

use std::collections::HashSet;

use aria_core::ValidationError;

use crate::store::LoadedIndex;
use crate::types::{ChildMatch, SearchOptions, SearchResult};

/// L2 norm of a vector.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Returns `0.0` when either vector has zero magnitude. Vectors of different
/// lengths are a [`ValidationError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, ValidationError> {
    if a.len() != b.len() {
        return Err(ValidationError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    let score = dot / (norm_a * norm_b);
    // non-finite components would otherwise leak NaN into sorting
    Ok(if score.is_finite() { score } else { 0.0 })
}

/// Rank the index against a query vector.
///
/// Keeps children scoring at least `min_score`, sorts by score descending,
/// keeps only the best child per parent, and truncates to `top_k`.
pub fn rank(
    query: &[f32],
    index: &LoadedIndex,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, ValidationError> {
    if query.len() != index.dimensions() {
        return Err(ValidationError::DimensionMismatch {
            expected: index.dimensions(),
            actual: query.len(),
        });
    }
    if !options.min_score.is_finite() {
        return Err(ValidationError::InvalidOption(format!(
            "min_score must be finite, got {}",
            options.min_score
        )));
    }
    if options.top_k == 0 {
        return Ok(Vec::new());
    }

    let mut scored = Vec::new();
    for (child, parent) in index.searchable() {
        let score = cosine_similarity(query, &child.embedding)?;
        if score >= options.min_score {
            scored.push((score, child, parent));
        }
    }

    // stable: equal scores keep index order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut seen = HashSet::new();
    let results = scored
        .into_iter()
        .filter(|(_, _, parent)| seen.insert(parent.id.as_str()))
        .take(options.top_k)
        .map(|(score, child, parent)| SearchResult {
            parent_chunk: parent.clone(),
            matched_child_chunk: ChildMatch::from(child),
            score,
        })
        .collect();
    Ok(results)
}
