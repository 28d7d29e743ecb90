//! ============================================================================
//! Retry Logic - Capped exponential backoff
//! ============================================================================
//! Runs an async operation up to `max_attempts` times:
//! - Every failure is logged at error level
//! - Delays grow from `base_delay` by `multiplier`, capped at `max_delay`
//! - After the last attempt the final error is returned unchanged
//! ============================================================================

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor applied per retry
    pub multiplier: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            multiplier: 2.0,
            max_delay: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0 = the wait after the first failure)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(63) as i32);
        let delay = self.base_delay.as_secs_f64() * factor;
        let capped = delay.min(self.max_delay.as_secs_f64());
        // Too large for a Duration (e.g. max_delay = Duration::MAX): clamp to the cap
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    error!(
                        "{} failed (attempt {}/{}): {}",
                        label, attempt, max_attempts, e
                    );

                    if attempt >= max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt - 1);
                    debug!("Retrying {} after {:?}", label, delay);
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
