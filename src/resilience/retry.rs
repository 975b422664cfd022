//! Retry combinator shared by reads and writes.
//!
//! # Responsibilities
//! - Run an async operation up to `max_attempts` times
//! - Ask a caller-supplied classifier what each error means
//! - Let the caller react (rotate endpoint, drop nonce cache) before sleeping
//! - Report exhaustion separately from terminal failures
//!
//! Call sites differ only in their classifier: the submitter fails fast on
//! timeouts, the read path treats them as transient.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::{calculate_backoff, jittered};

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Transient pressure: capped exponential backoff.
    Backoff,
    /// Local state was stale: short jittered delay.
    Resync,
    /// Give up and return the error.
    Fail,
}

/// Why the combinator stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
    /// The classifier declared the error terminal.
    Failed(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Failed(e) => e,
        }
    }
}

/// Attempt budget and delay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub resync_delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            resync_delay_ms: config.resync_delay_ms,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    fn delay_for(&self, action: RetryAction, attempt: u32) -> Duration {
        match action {
            RetryAction::Backoff => calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms),
            RetryAction::Resync => jittered(self.resync_delay_ms),
            RetryAction::Fail => Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, the classifier says `Fail`, or the budget
    /// is spent. `before_retry` runs after a retryable failure and before the
    /// delay, with the action and the 1-based attempt that just failed.
    pub async fn run<T, E, Op, Fut, Classify, Hook>(
        &self,
        mut op: Op,
        mut classify: Classify,
        mut before_retry: Hook,
    ) -> Result<T, RetryError<E>>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classify: FnMut(&E) -> RetryAction,
        Hook: FnMut(RetryAction, u32),
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let action = classify(&err);
            if action == RetryAction::Fail {
                return Err(RetryError::Failed(err));
            }
            if attempt >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: err,
                });
            }

            before_retry(action, attempt);
            tokio::time::sleep(self.delay_for(action, attempt)).await;
        }
    }
}
