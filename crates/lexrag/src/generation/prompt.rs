//! Prompt construction for grounded answers

use crate::types::ScoredChunk;

/// Instruction sent alongside every question
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer the user's question based *only* on \
the provided context. Synthesize information from the different source chunks if necessary. \
Do not use any external knowledge. If the answer is not found in the context, state that you \
couldn't find an answer in the provided documents. Format your response using Markdown.";

/// Separates context blocks
pub const BLOCK_DELIMITER: &str = "\n\n---\n\n";

/// Prompt builder for grounded questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// One labeled block per chunk, in ranked order
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|scored| format!("Source: {}\nContent: {}", scored.chunk.source, scored.chunk.text))
            .collect::<Vec<_>>()
            .join(BLOCK_DELIMITER)
    }

    pub fn build_user_prompt(context: &str, question: &str) -> String {
        format!("CONTEXT:\n---\n{}\n---\n\nQUESTION: {}", context, question)
    }

    /// Distinct source names in ranked order
    pub fn sources(chunks: &[ScoredChunk]) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for scored in chunks {
            if !sources.contains(&scored.chunk.source) {
                sources.push(scored.chunk.source.clone());
            }
        }
        sources
    }
}
