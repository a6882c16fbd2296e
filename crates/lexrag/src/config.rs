//! Configuration for the document Q&A system

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation service configuration
    pub llm: LlmConfig,
    /// Parsing worker configuration
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Read configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config '{}': {}", path.display(), e)))
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override secrets and bind address from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(host) = std::env::var("LEXRAG_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("LEXRAG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunks whose trimmed length is at or below this are dropped
    pub min_chunk_chars: usize,
    /// Lines per chunk when a tabular dump has no paragraph breaks
    pub tabular_rows_per_chunk: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: 20,
            tabular_rows_per_chunk: 10,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of chunks handed to the generator
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// API key (usually supplied through GEMINI_API_KEY)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failure
    pub initial_backoff_ms: u64,
}

impl LlmConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_attempts: 5,
            initial_backoff_ms: 1000,
        }
    }
}

/// Parsing worker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Files parsed concurrently (default: CPU count, max 8)
    pub parallel_files: Option<usize>,
}

impl ProcessingConfig {
    pub fn effective_parallel_files(&self) -> usize {
        self.parallel_files
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.min_chunk_chars, 20);
        assert_eq!(config.chunking.tabular_rows_per_chunk, 10);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.llm.max_attempts, 5);
        assert_eq!(config.llm.initial_backoff(), Duration::from_secs(1));
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9090\n\n[llm]\nmax_attempts = 3").unwrap();

        let config = RagConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.max_attempts, 3);
        assert_eq!(config.llm.initial_backoff_ms, 1000);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let err = RagConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parallel_files_never_zero() {
        let config = ProcessingConfig {
            parallel_files: Some(0),
        };
        assert_eq!(config.effective_parallel_files(), 1);
    }
}
