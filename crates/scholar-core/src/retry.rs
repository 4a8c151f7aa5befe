//! Retry with randomized exponential backoff.
//!
//! All remote embedding calls share one retry policy: the first wait starts
//! at a configurable minimum, doubles per attempt with random jitter, and is
//! capped at a configurable maximum, bounded by a maximum attempt count.
//! Terminal errors (see [`Error::is_retryable`]) abort the sequence
//! immediately; only transient failures are retried.
//!
//! Callers may bound worst-case latency with [`RetryPolicy::with_deadline`]
//! (worst case without one is roughly the sum of all backoff waits), and may
//! abandon an in-flight sequence at any attempt boundary by dropping the
//! future.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};
use tracing::{debug, warn};

use crate::error::Result;

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Random jitter range as a fraction of the base delay (0.1 = ±10%).
    pub jitter_percent: f64,
    /// Maximum number of attempts, including the first one. Always ≥ 1.
    pub max_attempts: u32,
    /// Optional bound on the total time spent across attempts and waits.
    ///
    /// When the next wait would cross the deadline, the sequence gives up
    /// with the last transient error instead of sleeping.
    pub total_deadline: Option<Duration>,
    /// Optional seed making jitter deterministic, for tests of backoff
    /// timing. `None` uses the thread RNG.
    pub jitter_seed: Option<u64>,
}

impl Default for RetryPolicy {
    /// Embedding-call policy: 1s initial wait doubling to a 20s cap with
    /// ±10% jitter, 6 attempts.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(20),
            backoff_factor: 2.0,
            jitter_percent: 0.1,
            max_attempts: 6,
            total_deadline: None,
            jitter_seed: None,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given shape. `backoff_factor` is clamped to
    /// ≥ 1.0, `jitter_percent` to [0, 1], and `max_attempts` to ≥ 1.
    #[must_use]
    pub fn new(
        initial_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
        jitter_percent: f64,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_delay,
            max_delay,
            backoff_factor: backoff_factor.max(1.0),
            jitter_percent: jitter_percent.clamp(0.0, 1.0),
            max_attempts: max_attempts.max(1),
            total_deadline: None,
            jitter_seed: None,
        }
    }

    /// Bounds the total time spent on attempts and backoff waits.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.total_deadline = Some(deadline);
        self
    }

    /// Makes jitter deterministic for tests of backoff timing.
    #[must_use]
    pub fn with_jitter_seed(mut self, seed: u64) -> Self {
        self.jitter_seed = Some(seed);
        self
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial_ms = u64::try_from(self.initial_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

        // Cap the exponent; 31 doublings already exceeds any practical wait.
        let exponent = attempt.min(31) as i32;
        let base_ms = (initial_ms as f64) * self.backoff_factor.powi(exponent);
        let base_ms = base_ms.min(max_ms as f64);

        let delay_ms = (base_ms + self.jitter_ms(base_ms, attempt)).max(0.0);
        Duration::from_millis(delay_ms as u64)
    }

    /// Sample jitter in `±(base_ms * jitter_percent)`, seeded when the policy
    /// carries a jitter seed.
    fn jitter_ms(&self, base_ms: f64, attempt: u32) -> f64 {
        let jitter_range = base_ms * self.jitter_percent;
        if jitter_range <= 0.0 {
            return 0.0;
        }
        match self.jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(attempt)))
                .random_range(-jitter_range..=jitter_range),
            None => rand::rng().random_range(-jitter_range..=jitter_range),
        }
    }
}

/// Outcome of a retry sequence, including how many attempts it took.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// The final result (success or the last error).
    pub result: Result<T>,
    /// Number of attempts made.
    pub attempts: u32,
    /// Total time spent, including backoff waits.
    pub elapsed: Duration,
}

/// Execute an async operation with retry and exponential backoff.
///
/// Only transient errors are retried; a terminal error or an exhausted
/// attempt budget surfaces the last error to the caller.
///
/// # Errors
///
/// Returns the first terminal error, or the last transient error once the
/// attempt budget or deadline is exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_outcome(policy, operation).await.result
}

/// Execute an async operation with retry, returning the detailed outcome.
pub async fn with_retry_outcome<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        total_attempts = attempt + 1,
                        retries = attempt,
                        "Operation succeeded after retries"
                    );
                }
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                };
            }
            Err(error) => {
                attempt += 1;

                if !error.is_retryable() {
                    debug!(attempt, error = %error, "Terminal error, not retrying");
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                if attempt >= policy.max_attempts {
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %error,
                        "Operation failed after all retry attempts"
                    );
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                let delay = policy.delay_for_attempt(attempt - 1);
                if let Some(deadline) = policy.total_deadline
                    && start.elapsed() + delay >= deadline
                {
                    warn!(
                        attempt,
                        deadline_ms = deadline.as_millis() as u64,
                        error = %error,
                        "Retry deadline reached before next attempt"
                    );
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                        elapsed: start.elapsed(),
                    };
                }

                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
