//! Grounded answer generation

mod orchestrator;
mod prompt;
mod retry;

pub use orchestrator::{Answer, AnswerOrchestrator, GENERATION_FAILED, NO_RELEVANT_INFORMATION};
pub use prompt::{PromptBuilder, BLOCK_DELIMITER, SYSTEM_PROMPT};
pub use retry::{RecordingSleeper, RetryPolicy, RetryState, Sleeper, TokioSleeper};
