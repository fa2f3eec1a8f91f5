//! Retry and backoff policies.
//!
//! The transactional group write retries a fixed number of times with
//! linear backoff. Verification polls with exponential backoff capped at
//! a ceiling, plus independent random jitter each attempt so workers
//! contending on related resources do not fall into synchronized retry
//! storms.

use std::time::Duration;

/// Linear retry for the transactional group write.
#[derive(Debug, Clone)]
pub struct CreateRetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Backoff step: attempt `n` sleeps `step * n` before retrying.
    pub step: Duration,
}

impl Default for CreateRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_millis(500),
        }
    }
}

impl CreateRetryPolicy {
    /// Delay after the given 1-based attempt failed.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

/// Exponential backoff with jitter for verification polling.
#[derive(Debug, Clone)]
pub struct VerifyBackoff {
    /// Total read attempts before verification fails.
    pub max_attempts: u32,
    /// Base delay; doubles per attempt.
    pub base_delay: Duration,
    /// Ceiling the exponential delay is capped at.
    pub max_delay: Duration,
    /// Fraction of the delay added as random jitter (0.0 disables).
    pub jitter: f64,
}

impl Default for VerifyBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: 0.25,
        }
    }
}

impl VerifyBackoff {
    /// Delay before the next attempt; `attempt` is 0-indexed.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential =
            self.base_delay.as_millis() as f64 * 2f64.powi(attempt.min(16) as i32);
        let capped = exponential.min(self.max_delay.as_millis() as f64);
        let jittered = if self.jitter > 0.0 {
            capped * (1.0 + rand::random::<f64>() * self.jitter)
        } else {
            capped
        };
        Duration::from_millis(jittered as u64)
    }
}
