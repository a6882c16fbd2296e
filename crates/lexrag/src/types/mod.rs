//! Core data types for documents, queries, and responses

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, FileType, ScoredChunk, TermWeights};
pub use query::QueryRequest;
pub use response::{AnswerStatus, Citation, DocumentSummary, QueryResponse, StatusResponse};
