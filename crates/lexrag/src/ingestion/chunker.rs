//! Paragraph chunking and word tokenization

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, FileType};

/// One or more blank lines
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern is valid"));

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n").expect("line pattern is valid"));

/// Whitespace and the punctuation set `, . ; : ! ? ( )`
static TOKEN_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s,.;:!?()]+").expect("token pattern is valid"));

/// Lowercase `text` and split it into word tokens
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_SEPARATOR
        .split(&text.to_lowercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits extracted text into paragraph chunks
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Chunks at or below this many characters are dropped
    min_chars: usize,
    /// Lines per chunk for tabular fallback
    rows_per_chunk: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(min_chars: usize, rows_per_chunk: usize) -> Self {
        Self {
            min_chars,
            rows_per_chunk: rows_per_chunk.max(1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.min_chunk_chars, config.tabular_rows_per_chunk)
    }

    /// Chunk text, treating the source as tabular if its name says so
    pub fn chunk(&self, text: &str, source_name: &str) -> Vec<Chunk> {
        let tabular = FileType::from_filename(source_name)
            .map(|t| t.is_tabular())
            .unwrap_or(false);
        self.chunk_with_layout(text, source_name, tabular)
    }

    /// Chunk text with an explicit tabular flag.
    ///
    /// Paragraphs come from blank-line breaks. When that yields at most one
    /// paragraph for a tabular source, the non-blank lines are grouped
    /// `rows_per_chunk` at a time instead.
    pub fn chunk_with_layout(&self, text: &str, source_name: &str, tabular: bool) -> Vec<Chunk> {
        let mut candidates: Vec<String> = PARAGRAPH_BREAK
            .split(text)
            .map(str::to_string)
            .collect();

        if candidates.len() <= 1 && tabular {
            candidates = self.group_rows(text);
        }

        let chunks: Vec<Chunk> = candidates
            .iter()
            .map(|candidate| candidate.trim())
            .filter(|candidate| candidate.chars().count() > self.min_chars)
            .map(|candidate| Chunk::new(source_name, candidate, tokenize(candidate)))
            .collect();

        tracing::debug!(
            "[{}] {} candidate(s), {} chunk(s) kept",
            source_name,
            candidates.len(),
            chunks.len()
        );

        chunks
    }

    fn group_rows(&self, text: &str) -> Vec<String> {
        let rows: Vec<&str> = LINE_BREAK
            .split(text)
            .filter(|row| !row.trim().is_empty())
            .collect();

        rows.chunks(self.rows_per_chunk)
            .map(|group| group.join("\n"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("Hello, World! (Tell) me: about;dogs? Yes.");
        assert_eq!(
            tokens,
            vec!["hello", "world", "tell", "me", "about", "dogs", "yes"]
        );
    }

    #[test]
    fn test_tokenize_keeps_other_punctuation() {
        assert_eq!(tokenize("don't re-use"), vec!["don't", "re-use"]);
        assert!(tokenize("  ,.;  ").is_empty());
    }

    #[test]
    fn test_paragraph_split() {
        let text = "The first paragraph is long enough to keep.\n\n\
                    Too short.\n   \n\
                    The third paragraph is also long enough.";
        let chunks = TextChunker::default().chunk(text, "notes.docx");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "The first paragraph is long enough to keep.");
        assert_eq!(chunks[1].text, "The third paragraph is also long enough.");
        assert!(chunks.iter().all(|c| c.source == "notes.docx"));
    }

    #[test]
    fn test_min_length_is_exclusive() {
        let exactly_20 = "abcdefghij klmnopqrs";
        assert_eq!(exactly_20.chars().count(), 20);
        assert!(TextChunker::default().chunk(exactly_20, "a.pdf").is_empty());

        let twenty_one = "abcdefghij klmnopqrst";
        assert_eq!(TextChunker::default().chunk(twenty_one, "a.pdf").len(), 1);
    }

    #[test]
    fn test_chunk_text_is_trimmed() {
        let chunks = TextChunker::default().chunk("   padded paragraph with content   \n", "a.pdf");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "padded paragraph with content");
        assert_eq!(chunks[0].tokens(), &["padded", "paragraph", "with", "content"]);
        assert!(chunks[0].tfidf_vector().is_empty());
        assert_eq!(chunks[0].magnitude(), 0.0);
    }

    #[test]
    fn test_tabular_fallback() {
        let rows: Vec<String> = (0..25)
            .map(|i| format!("row{},value number {}", i, i))
            .collect();
        let text = rows.join("\r\n");

        let chunks = TextChunker::default().chunk(&text, "data.csv");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.lines().count(), 10);
        assert_eq!(chunks[1].text.lines().count(), 10);
        assert_eq!(chunks[2].text.lines().count(), 5);
        assert!(chunks[0].text.starts_with("row0,value number 0"));
        assert!(chunks[2].text.ends_with("row24,value number 24"));
    }

    #[test]
    fn test_no_fallback_for_prose_formats() {
        let rows: Vec<String> = (0..25).map(|i| format!("line {} of the text", i)).collect();
        let text = rows.join("\n");

        let chunks = TextChunker::default().chunk(&text, "report.pdf");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text.lines().count(), 25);
    }

    #[test]
    fn test_blank_lines_take_precedence_over_rows() {
        let text = "a,b,c,d,e,f,g,h,i,j,k\n\nl,m,n,o,p,q,r,s,t,u,v";
        let chunks = TextChunker::default().chunk(text, "data.csv");
        assert_eq!(chunks.len(), 2);

        // Whitespace-only line is a paragraph break too
        let chunks = TextChunker::new(20, 2).chunk_with_layout(
            "first row of the sheet\n   \t\nsecond row of the sheet",
            "sheet",
            true,
        );
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_fallback_drops_empty_rows() {
        let text = "\nid,name,city\n1,alice,paris\n2,bob,berlin\n";
        let chunks = TextChunker::new(20, 10).chunk_with_layout(text, "people", true);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "id,name,city\n1,alice,paris\n2,bob,berlin");
    }

    #[test]
    fn test_empty_input() {
        assert!(TextChunker::default().chunk("", "empty.pdf").is_empty());
        assert!(TextChunker::default().chunk("", "empty.csv").is_empty());
    }

    #[test]
    fn test_rechunking_is_stable() {
        let text = "Alpha paragraph with enough characters.\n\nBeta paragraph with enough characters.";
        let chunker = TextChunker::default();
        let first: Vec<_> = chunker.chunk(text, "a.docx").into_iter().map(|c| c.text).collect();
        let second: Vec<_> = chunker.chunk(text, "a.docx").into_iter().map(|c| c.text).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|t| t.trim().chars().count() > 20));
    }

    proptest! {
        #[test]
        fn prop_chunks_are_long_trimmed_and_stable(
            text in "[a-zA-Z0-9é ,.;:!?()\t\r\n]{0,400}",
            tabular in any::<bool>(),
        ) {
            let chunker = TextChunker::default();
            let first = chunker.chunk_with_layout(&text, "generated", tabular);
            let second = chunker.chunk_with_layout(&text, "generated", tabular);

            for chunk in &first {
                prop_assert!(chunk.text.trim().chars().count() > 20);
                prop_assert_eq!(chunk.text.trim(), chunk.text.as_str());
                let expected_tokens = tokenize(&chunk.text);
                prop_assert_eq!(chunk.tokens(), expected_tokens.as_slice());
            }

            let first: Vec<&str> = first.iter().map(|c| c.text.as_str()).collect();
            let second: Vec<&str> = second.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(first, second);
        }
    }
}
