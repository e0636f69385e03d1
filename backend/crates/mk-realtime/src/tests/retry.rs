use crate::{RealtimeError, RetryPolicy, with_retry};

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use mk_config::RetryConfig;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        backoff_multiplier: 2.0,
        jitter: true,
    }
}

#[test]
fn given_default_config_when_converted_then_fail_fast() {
    let policy = RetryPolicy::from(&RetryConfig::default());

    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.initial_delay, Duration::from_millis(100));
    assert_eq!(policy.max_delay, Duration::from_secs(5));
}

#[tokio::test]
async fn given_unvalidated_shrinking_multiplier_when_retried_then_delays_stay_valid() {
    // Given
    let config = RetryConfig {
        max_attempts: 4,
        initial_delay_ms: 1,
        max_delay_ms: 4,
        backoff_multiplier: -3.0,
        jitter: false,
    };
    let policy = RetryPolicy::from(&config);
    let attempts = AtomicU32::new(0);

    // When
    let result: Result<(), RealtimeError> = with_retry(&policy, "shrinking", || async {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(RealtimeError::transport("reset"))
    })
    .await;

    // Then
    assert_eq!(policy.backoff_multiplier, 1.0);
    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

#[test]
fn given_nan_multiplier_when_converted_then_clamped_to_one() {
    let config = RetryConfig {
        backoff_multiplier: f64::NAN,
        ..RetryConfig::default()
    };

    assert_eq!(RetryPolicy::from(&config).backoff_multiplier, 1.0);
}

#[tokio::test]
async fn given_transient_errors_when_retried_then_eventually_succeeds() {
    let attempts = AtomicU32::new(0);

    let result = with_retry(&fast_policy(5), "flaky", || async {
        if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(RealtimeError::transport("reset"))
        } else {
            Ok(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_persistent_transient_errors_when_retried_then_gives_up_at_max_attempts() {
    let attempts = AtomicU32::new(0);

    let result: Result<(), RealtimeError> = with_retry(&fast_policy(3), "down", || async {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(RealtimeError::transport("refused"))
    })
    .await;

    assert!(matches!(result, Err(RealtimeError::Transport { .. })));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn given_non_retryable_error_when_retried_then_stops_immediately() {
    let attempts = AtomicU32::new(0);

    let result: Result<(), RealtimeError> = with_retry(&fast_policy(5), "bad", || async {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(RealtimeError::internal("malformed"))
    })
    .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
