use crate::{
    ChannelHandle, ChannelRequest, ChannelState, ChannelSubscription, EventCallback, Metrics,
    RealtimeError, RealtimeTransport, ReadReceiptStore, ReadReceipts, Result as RealtimeResult,
    RetryPolicy, SubscriberRegistry, create_channel_span, with_retry,
};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use log::{debug, error, info, warn};
use mk_config::RealtimeConfig;
use mk_core::{EventFilter, MessageId, RealtimeEvent, UserId};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Multiplexes one upstream realtime channel to any number of local listeners.
///
/// Cloning is cheap and every clone drives the same channel. The instance is
/// meant to be created once by the application and handed to whatever needs it.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    request: ChannelRequest,
    transport: Arc<dyn RealtimeTransport>,
    read_receipts: ReadReceipts,
    metrics: Metrics,
    state: Mutex<DispatcherState>,
    // Held for the whole of one event's fan-out
    delivery: AsyncMutex<()>,
}

struct DispatcherState {
    channel: ChannelState,
    handle: Option<ChannelHandle>,
    subscribers: SubscriberRegistry,
    bound_identity: Option<UserId>,
    pump: Option<JoinHandle<()>>,
    upstream_ended: bool,
}

impl BroadcastDispatcher {
    /// Open the configured channel and start delivering events.
    ///
    /// Returns once the transport has confirmed the subscription. A channel
    /// that cannot be opened yields `ConnectionFailed`; no dispatcher exists
    /// in that case.
    pub async fn connect(
        config: &RealtimeConfig,
        retry: &RetryPolicy,
        transport: Arc<dyn RealtimeTransport>,
        read_receipts: ReadReceipts,
    ) -> RealtimeResult<Self> {
        let filter = EventFilter::all(config.schema.clone(), config.table.clone());
        Self::connect_with_filter(config, filter, retry, transport, read_receipts).await
    }

    /// Same as [`connect`](Self::connect) with an explicit filter.
    /// Events the transport pushes outside `filter` are dropped before fan-out.
    pub async fn connect_with_filter(
        config: &RealtimeConfig,
        filter: EventFilter,
        retry: &RetryPolicy,
        transport: Arc<dyn RealtimeTransport>,
        read_receipts: ReadReceipts,
    ) -> RealtimeResult<Self> {
        let dispatcher = Self {
            inner: Arc::new(DispatcherInner {
                request: ChannelRequest {
                    name: config.channel_name.clone(),
                    filter,
                    buffer: config.event_buffer_size,
                },
                transport,
                read_receipts,
                metrics: Metrics::new(),
                state: Mutex::new(DispatcherState {
                    channel: ChannelState::Uninitialized,
                    handle: None,
                    subscribers: SubscriberRegistry::new(),
                    bound_identity: None,
                    pump: None,
                    upstream_ended: false,
                }),
                delivery: AsyncMutex::new(()),
            }),
        };

        dispatcher.open(retry).await?;
        Ok(dispatcher)
    }

    async fn open(&self, retry: &RetryPolicy) -> RealtimeResult<()> {
        let inner = &self.inner;
        inner.transition(ChannelState::Connecting);

        let operation = format!("open channel '{}'", inner.request.name);
        let opened = with_retry(retry, &operation, || {
            inner.transport.open_channel(&inner.request)
        })
        .await;

        let ChannelSubscription { handle, events } = match opened {
            Ok(subscription) => subscription,
            Err(e) => {
                inner.metrics.error_occurred(e.error_code());
                error!("Channel '{}' could not be opened: {}", inner.request.name, e);
                return Err(match e {
                    RealtimeError::ConnectionFailed { .. } => e,
                    other => {
                        RealtimeError::connection_failed(&inner.request.name, other.to_string())
                    }
                });
            }
        };

        // Subscribed before the pump starts so the first event is not dropped
        let mut state = inner.state.lock();
        state.handle = Some(handle.clone());
        state.channel = ChannelState::Subscribed;
        state.pump = Some(spawn_pump(Arc::downgrade(inner), &inner.request, events));
        drop(state);

        inner.metrics.channel_state(ChannelState::Subscribed.as_str());
        info!("Subscribed to channel {handle}");
        Ok(())
    }

    /// Register `callback` under `subscription_id`, replacing any previous
    /// callback with that id. Takes effect from the next delivered event.
    pub fn subscribe<F>(&self, subscription_id: impl Into<String>, callback: F)
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.subscribe_callback(subscription_id, Arc::new(callback));
    }

    pub fn subscribe_callback(&self, subscription_id: impl Into<String>, callback: EventCallback) {
        let subscription_id = subscription_id.into();
        let mut state = self.inner.state.lock();

        if state.channel.is_terminal() {
            debug!("Ignoring subscribe '{subscription_id}' on disconnected dispatcher");
            return;
        }

        let added = state.subscribers.insert(subscription_id.clone(), callback);
        let total = state.subscribers.len();
        drop(state);

        let action = if added { "added" } else { "replaced" };
        self.inner.metrics.subscription_changed(action);
        debug!(
            "Subscriber '{}' {} on channel {} ({} total)",
            subscription_id, action, self.inner.request.name, total
        );
    }

    /// Remove a registration; unknown ids are ignored
    pub fn unsubscribe(&self, subscription_id: &str) {
        let mut state = self.inner.state.lock();
        if !state.subscribers.remove(subscription_id) {
            return;
        }
        let remaining = state.subscribers.len();
        drop(state);

        self.inner.metrics.subscription_changed("removed");
        debug!(
            "Subscriber '{}' removed from channel {} ({} remaining)",
            subscription_id, self.inner.request.name, remaining
        );
    }

    /// Replace the user whose inbound messages get read receipts.
    /// Applies to events delivered after this call.
    pub fn set_bound_identity(&self, user_id: Option<UserId>) {
        let mut state = self.inner.state.lock();
        state.bound_identity = user_id;
        debug!(
            "Bound identity on channel {} set to {:?}",
            self.inner.request.name, state.bound_identity
        );
    }

    pub fn bound_identity(&self) -> Option<UserId> {
        self.inner.state.lock().bound_identity.clone()
    }

    pub fn state(&self) -> ChannelState {
        self.inner.state.lock().channel
    }

    pub fn channel_name(&self) -> &str {
        &self.inner.request.name
    }

    /// True once the transport has ended the event stream without a `disconnect`
    pub fn upstream_ended(&self) -> bool {
        self.inner.state.lock().upstream_ended
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    pub fn subscriber_ids(&self) -> Vec<String> {
        self.inner.state.lock().subscribers.ids()
    }

    /// Release the upstream channel and drop every registration.
    ///
    /// Waits for a fan-out already in progress to finish, so no callback runs
    /// after this returns. Safe to call more than once.
    pub async fn disconnect(&self) {
        let (handle, pump) = {
            let mut state = self.inner.state.lock();
            if state.channel.is_terminal() {
                return;
            }
            state.channel = ChannelState::Disconnected;
            state.subscribers.clear();
            (state.handle.take(), state.pump.take())
        };

        self.inner
            .metrics
            .channel_state(ChannelState::Disconnected.as_str());

        drop(self.inner.delivery.lock().await);

        if let Some(pump) = pump {
            pump.abort();
        }

        if let Some(handle) = handle {
            let label = handle.to_string();
            match self.inner.transport.close_channel(handle).await {
                Ok(()) => info!("Disconnected from channel {label}"),
                Err(e) => {
                    self.inner.metrics.error_occurred(e.error_code());
                    warn!("Closing channel {label} failed: {e}");
                }
            }
        }
    }

    /// Run the read-receipt rule and fan `event` out to a snapshot of the
    /// current subscribers
    pub(crate) async fn deliver(&self, event: RealtimeEvent) {
        self.inner.handle_event(&event).await;
    }
}

impl DispatcherInner {
    fn transition(&self, next: ChannelState) {
        let mut state = self.state.lock();
        debug!(
            "Channel {} transition {} -> {}",
            self.request.name, state.channel, next
        );
        state.channel = next;
        drop(state);
        self.metrics.channel_state(next.as_str());
    }

    async fn handle_event(&self, event: &RealtimeEvent) {
        let _delivering = self.delivery.lock().await;

        let (receipt, snapshot) = {
            let state = self.state.lock();
            if state.channel != ChannelState::Subscribed {
                return;
            }
            let receipt = self
                .read_receipts
                .message_to_mark(event, state.bound_identity.as_ref());
            (receipt, state.subscribers.snapshot())
        };

        self.metrics.event_received(event.kind().as_str());

        if let Some((message_id, store)) = receipt {
            self.spawn_read_receipt(message_id, store);
        }

        for (subscription_id, callback) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                self.metrics.callback_panicked();
                error!(
                    "Subscriber '{}' on channel {} panicked handling {} {}",
                    subscription_id,
                    self.request.name,
                    event.kind(),
                    event.message_id()
                );
            }
        }

        self.metrics.fanout(snapshot.len());
    }

    fn mark_upstream_ended(&self) {
        let mut state = self.state.lock();
        if state.channel != ChannelState::Subscribed {
            return;
        }
        state.upstream_ended = true;
        drop(state);

        let closed = RealtimeError::channel_closed(&self.request.name);
        self.metrics.error_occurred(closed.error_code());
        warn!("Upstream event stream ended: {closed}");
    }

    fn spawn_read_receipt(&self, message_id: MessageId, store: Arc<dyn ReadReceiptStore>) {
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match store.mark_as_read(&message_id).await {
                Ok(()) => {
                    metrics.read_receipt("sent");
                    debug!("Marked message {message_id} as read");
                }
                Err(e) => {
                    metrics.read_receipt("failed");
                    warn!("Read receipt for message {message_id} failed: {e}");
                }
            }
        });
    }
}

impl Drop for DispatcherInner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(pump) = state.pump.take() {
            pump.abort();
        }
        if let Some(handle) = &state.handle {
            debug!("Dispatcher for {handle} dropped without disconnect");
        }
    }
}

fn spawn_pump(
    inner: Weak<DispatcherInner>,
    request: &ChannelRequest,
    mut events: mpsc::Receiver<RealtimeEvent>,
) -> JoinHandle<()> {
    let span = create_channel_span(&request.name);
    let filter = request.filter.clone();
    tokio::spawn(
        async move {
            while let Some(event) = events.recv().await {
                if !filter.matches(&event) {
                    debug!(
                        "Dropping {} {} outside the channel filter",
                        event.kind(),
                        event.message_id()
                    );
                    continue;
                }
                let Some(inner) = inner.upgrade() else {
                    return;
                };
                inner.handle_event(&event).await;
            }
            if let Some(inner) = inner.upgrade() {
                inner.mark_upstream_ended();
            }
        }
        .instrument(span),
    )
}
