//! Retry policy for external calls
//!
//! One policy object shared by every external call site. Callers decide which
//! errors are retryable; the loop owns backoff and logging.
//!
//! **Backoff Strategy:**
//! - Initial delay: `initial_backoff`
//! - Each retry multiplies the delay by `multiplier`
//! - Delay never exceeds `max_backoff`

use bpa_common::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (>= 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(
                config.max_backoff_ms.max(config.initial_backoff_ms),
            ),
            multiplier: 2.0,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_backoff.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the policy
/// runs out of attempts. The last error is returned unchanged.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying external call");
        }

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "External call succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    return Err(err);
                }

                if attempt >= max_attempts {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        error = %err,
                        "External call failed, retries exhausted"
                    );
                    return Err(err);
                }

                let backoff = policy.backoff_for(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "External call failed, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
