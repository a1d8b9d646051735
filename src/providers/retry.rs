//! Retry policy, delay calculation, and the retry executor.
//!
//! [`RetryExecutor`] runs a single upstream call with bounded exponential
//! backoff and jitter. Each failure is classified through
//! [`MimirError::is_transient()`]: retryable failures sleep and try again,
//! fatal failures abort immediately and propagate to the caller.
//!
//! The delay after failed attempt `n` (1-indexed) is
//! `min(base_delay * 2^(n-1), max_delay) + random(0, jitter)`.
//! Every attempt also carries its own timeout; a timed-out attempt counts as
//! a retryable failure.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::telemetry;
use crate::types::RawCompletion;
use crate::{MimirError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// ```rust
/// # use mimir::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new()
///     .max_attempts(3)
///     .base_delay(Duration::from_millis(200))
///     .jitter(Duration::ZERO);
/// assert_eq!(policy.scheduled_delay(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 5.
    pub max_attempts: u32,
    /// Delay after the first failed attempt. Default: 1s.
    pub base_delay: Duration,
    /// Cap on the exponential delay, before jitter. Default: 60s.
    pub max_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay.
    /// Default: 1s.
    pub jitter: Duration,
    /// Timeout applied to every single attempt. Default: 15s.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(60_000),
            jitter: Duration::from_millis(1_000),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the delay after the first failed attempt.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the cap on exponential growth.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter bound (`Duration::ZERO` disables jitter).
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the per-attempt timeout.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Backoff scheduled after failed attempt `attempt` (1-indexed), without
    /// jitter: `min(base_delay * 2^(attempt-1), max_delay)`.
    pub fn scheduled_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay)
    }

    /// Delay to sleep after failed attempt `attempt`, jitter included.
    ///
    /// A provider `retry_after` hint replaces the scheduled backoff but is
    /// still capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let scheduled = retry_after
            .map(|hint| hint.min(self.max_delay))
            .unwrap_or_else(|| self.scheduled_delay(attempt));
        scheduled + self.sample_jitter()
    }

    fn sample_jitter(&self) -> Duration {
        let bound = self.jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
    }
}

/// Runs one upstream call under a [`RetryPolicy`].
///
/// Stateless apart from the policy: the attempt counter lives in a single
/// [`execute`](Self::execute) invocation, so one executor can be shared by
/// every provider and session.
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `attempt_fn` until it succeeds, fails fatally, or the attempt
    /// budget is spent.
    ///
    /// Returns the completion with its measured latency. Blank completions
    /// are treated as a retryable [`MimirError::EmptyResponse`]. After
    /// `max_attempts` retryable failures the result is
    /// [`MimirError::Exhausted`] carrying the last error.
    pub async fn execute<F, Fut>(&self, provider: &str, attempt_fn: F) -> Result<RawCompletion>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let policy = &self.policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=max_attempts {
            metrics::counter!(telemetry::ATTEMPTS_TOTAL, "provider" => provider.to_owned())
                .increment(1);
            if attempt > 1 {
                metrics::counter!(telemetry::RETRIES_TOTAL, "provider" => provider.to_owned())
                    .increment(1);
            }

            let started = Instant::now();
            let outcome = match tokio::time::timeout(policy.attempt_timeout, attempt_fn()).await {
                Ok(Ok(text)) if text.trim().is_empty() => Err(MimirError::EmptyResponse),
                Ok(outcome) => outcome,
                Err(_) => Err(MimirError::Timeout(policy.attempt_timeout)),
            };

            match outcome {
                Ok(text) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    debug!(provider, attempt, latency_ms, "provider call succeeded");
                    return Ok(RawCompletion {
                        text,
                        provider_name: provider.to_owned(),
                        latency_ms,
                    });
                }
                Err(e) if e.is_transient() => {
                    if attempt < max_attempts {
                        let delay = policy.delay_after(attempt, e.retry_after());
                        warn!(
                            provider,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying after transient error"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(provider, attempt, max_attempts, error = %e, "retries exhausted");
                    }
                    last_err = Some(e);
                }
                Err(e) => {
                    warn!(provider, attempt, error = %e, "fatal provider error, not retrying");
                    return Err(e);
                }
            }
        }

        Err(MimirError::Exhausted {
            provider: provider.to_owned(),
            attempts: max_attempts,
            last_error: Box::new(last_err.unwrap_or(MimirError::NoProvider)),
        })
    }
}
