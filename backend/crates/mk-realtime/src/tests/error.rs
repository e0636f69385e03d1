use crate::RealtimeError;

#[test]
fn given_channel_closed_when_classified_then_not_retryable() {
    let error = RealtimeError::channel_closed("dm-channel");

    assert_eq!(error.error_code(), "channel_closed");
    assert!(!error.is_retryable());
    assert!(error.to_string().contains("'dm-channel' is closed"));
}

#[test]
fn given_transport_failure_when_classified_then_retryable() {
    let error = RealtimeError::transport("socket reset");

    assert_eq!(error.error_code(), "transport");
    assert!(error.is_retryable());
}
