//! Document formats and retrievable chunks

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Sparse TF-IDF weights keyed by token
pub type TermWeights = HashMap<String, f64>;

/// Supported upload formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Microsoft PowerPoint presentation (.pptx)
    Pptx,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// Comma-separated values
    Csv,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Pdf,
        FileType::Docx,
        FileType::Pptx,
        FileType::Xlsx,
        FileType::Csv,
    ];

    /// MIME type this format is declared with
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv",
        }
    }

    /// Match a declared MIME type, ignoring parameters and case
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.mime_type() == essence)
    }

    /// Guess the format from a file name
    pub fn from_filename(filename: &str) -> Option<Self> {
        mime_guess::from_path(filename)
            .iter()
            .find_map(|mime| Self::from_mime(mime.essence_str()))
    }

    /// Resolve the format of an upload.
    ///
    /// A declared type wins. A missing or generic (`application/octet-stream`)
    /// declaration falls back to the file name.
    pub fn detect(declared_mime: Option<&str>, filename: &str) -> Option<Self> {
        match declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
            Some(mime) if !mime.eq_ignore_ascii_case("application/octet-stream") => {
                Self::from_mime(mime)
            }
            _ => Self::from_filename(filename),
        }
    }

    /// Spreadsheet-like formats whose text is row oriented
    pub fn is_tabular(&self) -> bool {
        matches!(self, Self::Xlsx | Self::Csv)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Pptx => "PowerPoint (.pptx)",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::Csv => "CSV",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A retrievable unit of document text.
///
/// `tokens` is fixed at creation. The TF-IDF vector and magnitude are owned
/// by the index builder and replaced together on every rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Name of the originating document
    pub source: String,
    /// Trimmed chunk text
    pub text: String,
    tokens: Vec<String>,
    tfidf_vector: TermWeights,
    magnitude: f64,
}

impl Chunk {
    /// Create an unweighted chunk
    pub fn new(source: impl Into<String>, text: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            text: text.into(),
            tokens,
            tfidf_vector: TermWeights::new(),
            magnitude: 0.0,
        }
    }

    /// Lowercase word tokens in text order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// TF-IDF weights from the last index build (empty before)
    pub fn tfidf_vector(&self) -> &TermWeights {
        &self.tfidf_vector
    }

    /// Euclidean norm of `tfidf_vector`
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub(crate) fn set_weights(&mut self, vector: TermWeights, magnitude: f64) {
        self.tfidf_vector = vector;
        self.magnitude = magnitude;
    }

    /// Copy of this chunk without derived weights
    pub(crate) fn unweighted(&self) -> Self {
        Self {
            id: self.id,
            source: self.source.clone(),
            text: self.text.clone(),
            tokens: self.tokens.clone(),
            tfidf_vector: TermWeights::new(),
            magnitude: 0.0,
        }
    }
}

/// A chunk paired with its cosine similarity to a question
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(FileType::from_mime("application/pdf"), Some(FileType::Pdf));
        assert_eq!(FileType::from_mime("text/csv; charset=utf-8"), Some(FileType::Csv));
        assert_eq!(FileType::from_mime("TEXT/CSV"), Some(FileType::Csv));
        assert_eq!(FileType::from_mime("image/png"), None);
        assert_eq!(FileType::from_mime(""), None);
    }

    #[test]
    fn test_detect_falls_back_to_filename() {
        assert_eq!(FileType::detect(None, "report.pdf"), Some(FileType::Pdf));
        assert_eq!(
            FileType::detect(Some("application/octet-stream"), "deck.pptx"),
            Some(FileType::Pptx)
        );
        assert_eq!(FileType::detect(Some("image/png"), "report.pdf"), None);
        assert_eq!(FileType::detect(None, "notes.bin"), None);
    }

    #[test]
    fn test_tabular() {
        assert!(FileType::Csv.is_tabular());
        assert!(FileType::Xlsx.is_tabular());
        assert!(!FileType::Pdf.is_tabular());
        assert!(!FileType::Docx.is_tabular());
    }

    #[test]
    fn test_unweighted_keeps_identity() {
        let mut chunk = Chunk::new("a.csv", "some text here", vec!["some".into()]);
        let mut weights = TermWeights::new();
        weights.insert("some".into(), 0.5);
        chunk.set_weights(weights, 0.5);

        let bare = chunk.unweighted();
        assert_eq!(bare.id, chunk.id);
        assert_eq!(bare.tokens(), chunk.tokens());
        assert!(bare.tfidf_vector().is_empty());
        assert_eq!(bare.magnitude(), 0.0);
    }
}
