//! Prompt rendering for retrieved passages.

use std::fmt::Write;

use crate::types::SearchResult;

const HEADER: &str = "## Retrieved Reference Material\n\n\
The following excerpts were retrieved from the actuarial reference library \
because they are semantically related to the current request.";

const FOOTER: &str = "When you use this material, cite the source and page in your answer. \
If an excerpt is not relevant to the request, ignore it and do not mention it.";

/// Render search results as a prompt-ready block.
///
/// Returns `None` for an empty result list. The output depends only on the
/// inputs.
pub fn format_retrieval_context(results: &[SearchResult], query: &str) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(
        HEADER.len()
            + FOOTER.len()
            + results
                .iter()
                .map(|r| r.parent_chunk.content.len() + 64)
                .sum::<usize>(),
    );
    out.push_str(HEADER);
    let _ = write!(out, "\n\nQuery: {}\n", query.trim());

    for (n, result) in results.iter().enumerate() {
        let _ = write!(
            out,
            "\n### [{}] {} (relevance {:.2})\n\n{}\n",
            n + 1,
            result.parent_chunk.metadata.citation(),
            result.score,
            result.parent_chunk.content.trim()
        );
    }

    out.push_str("\n---\n");
    out.push_str(FOOTER);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChildMatch, ChunkMetadata, PageRef, ParentChunk};

    fn result(id: &str, content: &str, source_name: &str, page: u64, score: f32) -> SearchResult {
        let metadata = ChunkMetadata {
            source_name: Some(source_name.to_string()),
            page: Some(PageRef::Number(page)),
            ..ChunkMetadata::default()
        };
        SearchResult {
            parent_chunk: ParentChunk {
                id: id.to_string(),
                content: content.to_string(),
                metadata: metadata.clone(),
            },
            matched_child_chunk: ChildMatch {
                id: format!("{id}-c"),
                text: "child".to_string(),
                metadata,
            },
            score,
        }
    }

    #[test]
    fn empty_results_render_nothing() {
        assert_eq!(format_retrieval_context(&[], "anything"), None);
    }

    #[test]
    fn renders_numbered_sections_with_citations() {
        let results = vec![
            result("p1", "  Chain ladder projects losses.\n", "Friedland Entire Text", 88, 0.912),
            result("p2", "Trend selection.", "Werner Entire Text", 140, 0.7),
        ];
        let block = format_retrieval_context(&results, " chain ladder ").unwrap();

        assert!(block.starts_with(HEADER));
        assert!(block.contains("Query: chain ladder\n"));
        assert!(block.contains(
            "### [1] Friedland Entire Text, p. 88 (relevance 0.91)\n\nChain ladder projects losses.\n"
        ));
        assert!(block.contains("### [2] Werner Entire Text, p. 140 (relevance 0.70)"));
        assert!(block.ends_with(FOOTER));
        let first = block.find("[1]").unwrap();
        let second = block.find("[2]").unwrap();
        assert!(first < second);
    }

    #[test]
    fn output_is_deterministic() {
        let results = vec![result("p1", "text", "Doc", 1, 0.5)];
        assert_eq!(
            format_retrieval_context(&results, "q"),
            format_retrieval_context(&results, "q")
        );
    }
}
