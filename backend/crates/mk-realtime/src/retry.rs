use crate::RealtimeError;

use std::time::Duration;

use mk_config::RetryConfig;
use tokio::time::sleep;

/// Backoff schedule for retried operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add jitter to spread out reconnect storms
    pub jitter: bool,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn fail_fast() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fail_fast()
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier.max(1.0),
            jitter: config.jitter,
        }
    }
}

/// Execute an async operation with retry logic
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsRetryable,
{
    let mut attempts = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    log::info!("{} succeeded after {} attempts", operation_name, attempts);
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_retryable() || attempts >= policy.max_attempts {
                    log::warn!(
                        "{} failed after {} attempts: {}",
                        operation_name,
                        attempts,
                        e
                    );
                    return Err(e);
                }

                let actual_delay = if policy.jitter {
                    let jitter_factor = 0.5 + rand::random::<f64>(); // 0.5 to 1.5
                    Duration::from_secs_f64(delay.as_secs_f64() * jitter_factor)
                } else {
                    delay
                };

                log::debug!(
                    "{} attempt {} failed: {}. Retrying in {:?}",
                    operation_name,
                    attempts,
                    e,
                    actual_delay
                );

                sleep(actual_delay).await;

                delay = Duration::from_secs_f64(
                    (delay.as_secs_f64() * policy.backoff_multiplier)
                        .min(policy.max_delay.as_secs_f64()),
                );
            }
        }
    }
}

/// Trait for errors that can indicate retryability
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for RealtimeError {
    fn is_retryable(&self) -> bool {
        RealtimeError::is_retryable(self)
    }
}
