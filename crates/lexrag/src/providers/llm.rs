//! Text generation provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Remote text generation from grounding context.
///
/// Implementations make a single attempt per call and classify failures
/// with [`crate::Error::from_status`]; retrying is the caller's job.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Answer `question` using only `context`
    async fn generate(&self, context: &str, question: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model in use
    fn model(&self) -> &str;
}
