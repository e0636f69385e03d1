use crate::Result as RealtimeResult;

use std::fmt;

use async_trait::async_trait;
use mk_core::{EventFilter, MessageId, RealtimeEvent};
use tokio::sync::mpsc;

/// Opaque handle to an upstream channel, issued by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub id: u64,
    pub name: String,
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// What the dispatcher asks the transport to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub name: String,
    pub filter: EventFilter,
    /// Capacity of the event queue returned in [`ChannelSubscription`]
    pub buffer: usize,
}

/// A confirmed upstream subscription.
///
/// Events arrive on `events` in the order the transport emits them.
/// The transport ends the stream by dropping its sender.
#[derive(Debug)]
pub struct ChannelSubscription {
    pub handle: ChannelHandle,
    pub events: mpsc::Receiver<RealtimeEvent>,
}

/// Push-based realtime transport owned by the managed backend.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open `request.name` and start pushing events matching `request.filter`
    /// into a queue of `request.buffer` slots.
    /// Resolves once the transport has confirmed the subscription.
    async fn open_channel(&self, request: &ChannelRequest) -> RealtimeResult<ChannelSubscription>;

    /// Release the upstream resource behind `handle`
    async fn close_channel(&self, handle: ChannelHandle) -> RealtimeResult<()>;
}

/// Persistent-storage mutation that flags a message as read. Must be idempotent.
#[async_trait]
pub trait ReadReceiptStore: Send + Sync {
    async fn mark_as_read(&self, message_id: &MessageId) -> RealtimeResult<()>;
}

/// Remote lookup of one entity by key. `Ok(None)` means the entity does not exist.
#[async_trait]
pub trait EntityFetcher<K, V>: Send + Sync {
    async fn fetch(&self, key: &K) -> RealtimeResult<Option<V>>;
}
