//! Bounded fixed-delay retry.
//!
//! [`BoundedRetry`] is a small state machine: it counts attempts and, after
//! each failure, decides whether to wait [`RetryPolicy::retry_delay`] and try
//! again or to give up. The delay never grows; the bound exists to ride out a
//! database container that starts slower than this one, not to survive long
//! outages.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskboard_backend::connection::{BoundedRetry, RetryDecision, RetryPolicy};
//!
//! let mut retry = BoundedRetry::new(RetryPolicy::new(2, Duration::from_secs(5)));
//!
//! assert_eq!(retry.begin_attempt(), 1);
//! assert_eq!(retry.on_failure(), RetryDecision::RetryAfter(Duration::from_secs(5)));
//! assert_eq!(retry.begin_attempt(), 2);
//! assert_eq!(retry.on_failure(), RetryDecision::Exhausted { attempts: 2 });
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Attempt bound and delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    /// Attempts made when nothing else is configured.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Delay between attempts when nothing else is configured.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

    /// Creates a policy. A bound of zero is raised to a single attempt.
    #[must_use]
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the fixed delay between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_RETRY_DELAY)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given duration, then attempt again.
    RetryAfter(Duration),
    /// No attempts remain.
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
    },
}

/// Attempt counter driven by [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct BoundedRetry {
    policy: RetryPolicy,
    attempts_made: u32,
}

impl BoundedRetry {
    /// Creates a fresh counter with no attempts made.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts_made: 0,
        }
    }

    /// Records the start of an attempt and returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts_made = self.attempts_made.saturating_add(1);
        self.attempts_made
    }

    /// Decides the next step after the current attempt failed.
    #[must_use]
    pub const fn on_failure(&self) -> RetryDecision {
        if self.attempts_made >= self.policy.max_attempts {
            RetryDecision::Exhausted {
                attempts: self.attempts_made,
            }
        } else {
            RetryDecision::RetryAfter(self.policy.retry_delay)
        }
    }

    /// Returns the number of attempts started so far.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }
}

/// Failure after every attempt was used.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
}

/// Runs `operation` until it succeeds or the policy is exhausted, sleeping
/// between failures. The closure receives the 1-based attempt number.
///
/// # Errors
/// Returns [`RetryExhausted`] carrying the last error once no attempts remain.
pub async fn run<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retry = BoundedRetry::new(policy);
    loop {
        let attempt = retry.begin_attempt();
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    error = %e,
                    "Connection attempt failed"
                );
                match retry.on_failure() {
                    RetryDecision::RetryAfter(delay) => {
                        info!(delay_secs = delay.as_secs_f64(), "Retrying connection");
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::Exhausted { attempts } => {
                        return Err(RetryExhausted {
                            attempts,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn default_policy_is_five_attempts_five_seconds_apart() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.retry_delay(), Duration::from_secs(5));
    }

    #[test]
    fn state_machine_retries_until_bound() {
        let mut retry = BoundedRetry::new(RetryPolicy::new(3, Duration::from_millis(10)));
        for expected in 1..3 {
            assert_eq!(retry.begin_attempt(), expected);
            assert_eq!(
                retry.on_failure(),
                RetryDecision::RetryAfter(Duration::from_millis(10))
            );
        }
        assert_eq!(retry.begin_attempt(), 3);
        assert_eq!(retry.on_failure(), RetryDecision::Exhausted { attempts: 3 });
        assert_eq!(retry.attempts_made(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<u32, RetryExhausted<String>> =
            run(RetryPolicy::new(5, Duration::from_secs(5)), move |attempt| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(format!("attempt {attempt} refused"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.ok(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_sleeps_between_attempts_but_not_after_last() {
        let started = tokio::time::Instant::now();

        let result: Result<(), RetryExhausted<&str>> =
            run(RetryPolicy::new(4, Duration::from_secs(5)), |_| async {
                Err("connection refused")
            })
            .await;

        let err = result.err().map(|e| (e.attempts, e.last_error));
        assert_eq!(err, Some((4, "connection refused")));
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }
}
