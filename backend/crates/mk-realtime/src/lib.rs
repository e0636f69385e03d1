pub mod broadcast_dispatcher;
pub mod channel_state;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod read_receipt;
pub mod retry;
pub mod single_flight_cache;
pub mod subscriber_registry;
pub mod transport;

pub use broadcast_dispatcher::BroadcastDispatcher;
pub use channel_state::ChannelState;
pub use error::{RealtimeError, Result};
pub use metrics::Metrics;
pub use read_receipt::{NoReadReceipts, ReadReceiptPolicy, ReadReceipts, RecipientMatchPolicy};
pub use retry::{IsRetryable, RetryPolicy, with_retry};
pub use single_flight_cache::{EntryState, ProfileCache, SingleFlightCache};
pub use subscriber_registry::{EventCallback, SubscriberRegistry};
pub use transport::{
    ChannelHandle, ChannelRequest, ChannelSubscription, EntityFetcher, ReadReceiptStore,
    RealtimeTransport,
};

#[cfg(test)]
mod tests;

use tracing::info_span;

/// Create a tracing span for a channel's delivery task.
/// All log entries emitted while fanning out carry the channel name.
pub fn create_channel_span(channel_name: &str) -> tracing::Span {
    info_span!("realtime_channel", channel = %channel_name)
}
