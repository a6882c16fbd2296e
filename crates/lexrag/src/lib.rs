//! lexrag: document Q&A over a lexical TF-IDF index
//!
//! Uploaded PDF, DOCX, PPTX, XLSX and CSV files are extracted and chunked on
//! background workers, indexed with TF-IDF, and ranked by cosine similarity.
//! The best chunks become grounding context for a remote text generation
//! service, called with bounded exponential-backoff retry.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, FileType, ScoredChunk},
    query::QueryRequest,
    response::{Citation, QueryResponse},
};
