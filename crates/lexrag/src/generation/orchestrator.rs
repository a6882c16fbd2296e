//! Answer orchestration: retrieval results in, grounded answer out

use std::sync::Arc;

use super::prompt::PromptBuilder;
use super::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::providers::GenerationProvider;
use crate::types::{AnswerStatus, ScoredChunk};

/// Returned when nothing in the index matched the question
pub const NO_RELEVANT_INFORMATION: &str =
    "I couldn't find any relevant information in the loaded documents to answer that question.";

/// Returned when the generation service could not produce an answer
pub const GENERATION_FAILED: &str =
    "Sorry, I encountered an error while trying to generate an answer. Please try again in a moment.";

/// Result of answering one question
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub status: AnswerStatus,
    /// Distinct source names in ranked order
    pub sources: Vec<String>,
}

impl Answer {
    fn fixed(text: &str, status: AnswerStatus) -> Self {
        Self {
            text: text.to_string(),
            status,
            sources: Vec::new(),
        }
    }
}

/// Turns retrieved chunks into an answer.
///
/// Never fails: generation errors become a fixed message.
pub struct AnswerOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl AnswerOrchestrator {
    pub fn new(provider: Arc<dyn GenerationProvider>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(provider, policy, Arc::new(TokioSleeper))
    }

    /// Use a custom sleeper for the backoff waits
    pub fn with_sleeper(
        provider: Arc<dyn GenerationProvider>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            provider,
            policy,
            sleeper,
        }
    }

    pub fn provider(&self) -> &dyn GenerationProvider {
        self.provider.as_ref()
    }

    pub async fn answer(&self, chunks: &[ScoredChunk], question: &str) -> Answer {
        if chunks.is_empty() {
            return Answer::fixed(NO_RELEVANT_INFORMATION, AnswerStatus::NoRelevantInformation);
        }

        let context = PromptBuilder::build_context(chunks);
        let provider = self.provider.clone();

        tracing::debug!(
            "Generating with {} ({}) from {} chunk(s)",
            provider.name(),
            provider.model(),
            chunks.len()
        );

        let result = self
            .policy
            .run(self.sleeper.as_ref(), |_| {
                let provider = provider.clone();
                let context = context.clone();
                let question = question.to_string();
                async move { provider.generate(&context, &question).await }
            })
            .await;

        match result {
            Ok(text) => Answer {
                text,
                status: AnswerStatus::Answered,
                sources: PromptBuilder::sources(chunks),
            },
            Err(e) => {
                tracing::error!("Answer generation unavailable: {}", e);
                Answer::fixed(GENERATION_FAILED, AnswerStatus::GenerationUnavailable)
            }
        }
    }
}
