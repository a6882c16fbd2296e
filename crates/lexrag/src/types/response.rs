//! Response types for queries, documents, and index status

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::ScoredChunk;

/// Longest snippet carried in a citation, in characters
const SNIPPET_CHARS: usize = 240;

/// How a question was resolved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    /// The generator produced an answer from retrieved context
    Answered,
    /// Nothing in the index scored above zero
    NoRelevantInformation,
    /// Generation failed; the answer holds the fixed apology
    GenerationUnavailable,
}

/// Citation of a retrieved chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Source document name
    pub source: String,
    /// Leading part of the chunk text
    pub snippet: String,
    /// Cosine similarity to the question
    pub score: f64,
    /// Full chunk text (if include_chunks was requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Citation {
    /// Create a citation from a ranked chunk
    pub fn from_scored(scored: &ScoredChunk, include_text: bool) -> Self {
        Self {
            chunk_id: scored.chunk.id,
            source: scored.chunk.source.clone(),
            snippet: truncate_snippet(&scored.chunk.text, SNIPPET_CHARS),
            score: scored.score,
            text: include_text.then(|| scored.chunk.text.clone()),
        }
    }
}

/// Response to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text (Markdown), or a fixed informational message
    pub answer: String,
    /// Resolution of the question
    pub status: AnswerStatus,
    /// Distinct source documents, in ranked order
    pub sources: Vec<String>,
    /// Per-chunk citations, in ranked order
    pub citations: Vec<Citation>,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Index snapshot the question was answered against
    pub index_version: u64,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// A parsed document and the number of chunks it contributed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub chunk_count: usize,
}

/// Readiness and index size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Questions can be answered
    pub ready: bool,
    /// Human readable state
    pub status_text: String,
    /// Batches still parsing
    pub batches_in_flight: usize,
    pub documents: usize,
    pub chunks: usize,
    /// Distinct tokens in the IDF table
    pub vocabulary: usize,
    pub index_version: u64,
}

/// Cut text to at most `max_chars` characters on a word boundary
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let end = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..end];

    match head.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => format!("{}...", head[..pos].trim_end()),
        _ => format!("{}...", head),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_truncate_snippet() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert!(truncated.chars().count() <= 23); // 20 + "..."
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated, "This is a very long...");
    }

    #[test]
    fn test_short_snippet_untouched() {
        assert_eq!(truncate_snippet("short text", 20), "short text");
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "ééééééééééééééééééééééééé";
        let truncated = truncate_snippet(text, 5);
        assert_eq!(truncated, "ééééé...");
    }

    #[test]
    fn test_citation_from_scored() {
        let scored = ScoredChunk {
            chunk: Chunk::new("policy.pdf", "Refunds are issued within 30 days.", Vec::new()),
            score: 0.42,
        };

        let citation = Citation::from_scored(&scored, false);
        assert_eq!(citation.source, "policy.pdf");
        assert_eq!(citation.score, 0.42);
        assert!(citation.text.is_none());

        let citation = Citation::from_scored(&scored, true);
        assert_eq!(citation.text.as_deref(), Some("Refunds are issued within 30 days."));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&AnswerStatus::NoRelevantInformation).unwrap();
        assert_eq!(json, "\"no_relevant_information\"");
    }
}
