//! Document ingestion: extraction and chunking

mod chunker;
pub mod parser;
mod registry;

pub use chunker::{tokenize, TextChunker};
pub use parser::Extractor;
pub use registry::ExtractorRegistry;
