//! Bounded exponential-backoff retry for generation calls

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Waits between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real waiting on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested waits without waiting
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().clone()
    }

    pub fn total(&self) -> Duration {
        self.waits.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().push(duration);
    }
}

/// Where a retried call stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` (1-based) is running
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed transiently; the next starts after `delay`
    Waiting { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    /// Every attempt failed transiently
    Exhausted { attempts: u32 },
    /// A permanent failure ended the call
    Aborted { attempts: u32 },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Exhausted { .. } | Self::Aborted { .. }
        )
    }
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after the first failure; doubles each time
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.max_attempts, config.initial_backoff())
    }

    /// Wait after failed attempt `attempt`: 1s, 2s, 4s, ... for a 1s start
    pub fn backoff(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31);
        self.initial_backoff.saturating_mul(1u32 << doublings)
    }

    /// State after attempt `attempt` finished with `outcome`
    pub fn transition<T>(&self, attempt: u32, outcome: &Result<T>) -> RetryState {
        match outcome {
            Ok(_) => RetryState::Succeeded { attempts: attempt },
            Err(e) if !e.is_transient() => RetryState::Aborted { attempts: attempt },
            Err(_) if attempt >= self.max_attempts => RetryState::Exhausted { attempts: attempt },
            Err(_) => RetryState::Waiting {
                attempt,
                delay: self.backoff(attempt),
            },
        }
    }

    /// Drive `operation` to a terminal state.
    ///
    /// `operation` receives the 1-based attempt number. Failures come back as
    /// `Error::GenerationUnavailable` carrying the last underlying error.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut state = RetryState::Attempting { attempt: 1 };

        loop {
            match state {
                RetryState::Attempting { attempt } => {
                    let outcome = operation(attempt).await;
                    state = self.transition(attempt, &outcome);

                    match state {
                        RetryState::Succeeded { attempts } => {
                            if attempts > 1 {
                                tracing::info!("Generation succeeded on attempt {}", attempts);
                            }
                            return outcome;
                        }
                        RetryState::Exhausted { attempts } => {
                            let e = outcome.err().map(|e| e.to_string()).unwrap_or_default();
                            tracing::error!("Generation gave up after {} attempts: {}", attempts, e);
                            return Err(Error::GenerationUnavailable(format!(
                                "gave up after {} attempts: {}",
                                attempts, e
                            )));
                        }
                        RetryState::Aborted { attempts } => {
                            let e = outcome.err().map(|e| e.to_string()).unwrap_or_default();
                            tracing::error!("Generation failed on attempt {}: {}", attempts, e);
                            return Err(Error::GenerationUnavailable(e));
                        }
                        _ => {
                            if let Err(e) = &outcome {
                                tracing::warn!("Attempt {} failed: {}", attempt, e);
                            }
                        }
                    }
                }
                RetryState::Waiting { attempt, delay } => {
                    tracing::warn!("Retrying in {:?} (attempt {}/{})", delay, attempt + 1, self.max_attempts);
                    sleeper.sleep(delay).await;
                    state = RetryState::Attempting {
                        attempt: attempt + 1,
                    };
                }
                terminal => {
                    return Err(Error::internal(format!("retry loop reached {:?}", terminal)));
                }
            }
        }
    }
}
