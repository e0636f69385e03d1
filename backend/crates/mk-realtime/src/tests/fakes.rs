use crate::{
    ChannelHandle, ChannelRequest, ChannelSubscription, EntityFetcher, RealtimeError, RealtimeTransport,
    ReadReceiptStore, Result as RealtimeResult,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mk_core::{DirectMessage, MessageId, RealtimeEvent, UserId, UserProfile};
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};

pub(crate) const WAIT: Duration = Duration::from_millis(500);

pub(crate) fn insert_event(id: &str, sender: &str, receiver: &str) -> RealtimeEvent {
    RealtimeEvent::Insert {
        record: DirectMessage::new(id, sender, receiver, "hello"),
    }
}

pub(crate) fn update_event(id: &str, sender: &str, receiver: &str) -> RealtimeEvent {
    let mut record = DirectMessage::new(id, sender, receiver, "hello (edited)");
    record.is_read = true;
    RealtimeEvent::Update {
        record,
        previous: None,
    }
}

pub(crate) fn delete_event(id: &str) -> RealtimeEvent {
    RealtimeEvent::Delete {
        id: MessageId::from(id),
    }
}

// =========================================================================
// Transport
// =========================================================================

/// In-process transport; events pushed with `emit` go to the last opened channel
#[derive(Default)]
pub(crate) struct FakeTransport {
    next_id: AtomicU64,
    open_attempts: AtomicU32,
    /// Attempts that fail before one succeeds; u32::MAX fails forever
    failures_remaining: AtomicU32,
    retryable_failures: bool,
    close_fails: bool,
    senders: Mutex<Vec<mpsc::Sender<RealtimeEvent>>>,
    requests: Mutex<Vec<ChannelRequest>>,
    closed: Mutex<Vec<ChannelHandle>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the first `times` open attempts with a retryable transport error
    pub(crate) fn failing(times: u32) -> Arc<Self> {
        Arc::new(Self {
            failures_remaining: AtomicU32::new(times),
            retryable_failures: true,
            ..Self::default()
        })
    }

    /// Fail every open attempt with a non-retryable error
    pub(crate) fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            failures_remaining: AtomicU32::new(u32::MAX),
            retryable_failures: false,
            ..Self::default()
        })
    }

    pub(crate) fn with_failing_close() -> Arc<Self> {
        Arc::new(Self {
            close_fails: true,
            ..Self::default()
        })
    }

    pub(crate) async fn emit(&self, event: RealtimeEvent) -> bool {
        let sender = self.senders.lock().last().cloned();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Drop the sending side, ending the upstream stream
    pub(crate) fn end_stream(&self) {
        self.senders.lock().clear();
    }

    pub(crate) fn open_attempts(&self) -> u32 {
        self.open_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> Vec<ChannelHandle> {
        self.closed.lock().clone()
    }

    pub(crate) fn requests(&self) -> Vec<ChannelRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RealtimeTransport for FakeTransport {
    async fn open_channel(&self, request: &ChannelRequest) -> RealtimeResult<ChannelSubscription> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(if self.retryable_failures {
                RealtimeError::transport("socket reset")
            } else {
                RealtimeError::internal("channel rejected")
            });
        }

        // Pushes every emitted event regardless of the filter
        let (sender, events) = mpsc::channel(request.buffer);
        self.senders.lock().push(sender);
        self.requests.lock().push(request.clone());

        Ok(ChannelSubscription {
            handle: ChannelHandle {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                name: request.name.clone(),
            },
            events,
        })
    }

    async fn close_channel(&self, handle: ChannelHandle) -> RealtimeResult<()> {
        self.closed.lock().push(handle);
        if self.close_fails {
            return Err(RealtimeError::transport("close timed out"));
        }
        Ok(())
    }
}

// =========================================================================
// Read receipts
// =========================================================================

#[derive(Default)]
pub(crate) struct RecordingReceiptStore {
    marked: Mutex<Vec<MessageId>>,
    fail: bool,
    called: Notify,
}

impl RecordingReceiptStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub(crate) fn marked(&self) -> Vec<MessageId> {
        self.marked.lock().clone()
    }

    /// Wait until at least `count` receipts were attempted
    pub(crate) async fn wait_for(&self, count: usize) {
        let deadline = tokio::time::Instant::now() + WAIT;
        while self.marked.lock().len() < count {
            if tokio::time::timeout_at(deadline, self.called.notified())
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

#[async_trait]
impl ReadReceiptStore for RecordingReceiptStore {
    async fn mark_as_read(&self, message_id: &MessageId) -> RealtimeResult<()> {
        self.marked.lock().push(message_id.clone());
        self.called.notify_one();
        if self.fail {
            return Err(RealtimeError::read_receipt(
                message_id.as_str(),
                "row level security denied update",
            ));
        }
        Ok(())
    }
}

// =========================================================================
// Fetcher
// =========================================================================

pub(crate) enum FetchBehavior {
    Found,
    Missing,
    Fail,
    Panic,
}

/// Profile fetcher that counts calls and can hold them until released
pub(crate) struct CountingFetcher {
    calls: AtomicUsize,
    behavior: FetchBehavior,
    gate: Option<Notify>,
}

impl CountingFetcher {
    pub(crate) fn new(behavior: FetchBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior,
            gate: None,
        })
    }

    /// Fetches block until `release` is called
    pub(crate) fn gated(behavior: FetchBehavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior,
            gate: Some(Notify::new()),
        })
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityFetcher<UserId, UserProfile> for CountingFetcher {
    async fn fetch(&self, key: &UserId) -> RealtimeResult<Option<UserProfile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.behavior {
            FetchBehavior::Found => Ok(Some(UserProfile::new(key.clone(), "alice"))),
            FetchBehavior::Missing => Ok(None),
            FetchBehavior::Fail => Err(RealtimeError::fetch(key.as_str(), "503 from profiles")),
            FetchBehavior::Panic => panic!("profile row had unexpected shape"),
        }
    }
}
