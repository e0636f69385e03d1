use crate::ReadReceiptStore;

use std::sync::Arc;

use mk_core::{MessageId, RealtimeEvent, UserId};

/// Decides whether an inbound event should be marked as read.
pub trait ReadReceiptPolicy: Send + Sync {
    /// Message to mark as read for `event`, given the locally bound user
    fn message_to_mark(
        &self,
        event: &RealtimeEvent,
        bound_identity: Option<&UserId>,
    ) -> Option<MessageId>;
}

/// Marks newly created messages addressed to the bound user.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecipientMatchPolicy;

impl ReadReceiptPolicy for RecipientMatchPolicy {
    fn message_to_mark(
        &self,
        event: &RealtimeEvent,
        bound_identity: Option<&UserId>,
    ) -> Option<MessageId> {
        let bound = bound_identity?;
        match event {
            RealtimeEvent::Insert { record } if record.is_addressed_to(bound) => {
                Some(record.id.clone())
            }
            _ => None,
        }
    }
}

/// Never marks anything; the dispatcher only fans out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReadReceipts;

impl ReadReceiptPolicy for NoReadReceipts {
    fn message_to_mark(&self, _: &RealtimeEvent, _: Option<&UserId>) -> Option<MessageId> {
        None
    }
}

/// Read-receipt rule plus the store it writes to
#[derive(Clone)]
pub struct ReadReceipts {
    pub(crate) policy: Arc<dyn ReadReceiptPolicy>,
    pub(crate) store: Option<Arc<dyn ReadReceiptStore>>,
}

impl ReadReceipts {
    pub fn new(policy: Arc<dyn ReadReceiptPolicy>, store: Arc<dyn ReadReceiptStore>) -> Self {
        Self {
            policy,
            store: Some(store),
        }
    }

    /// Recipient-match policy against `store`
    pub fn recipient_match(store: Arc<dyn ReadReceiptStore>) -> Self {
        Self::new(Arc::new(RecipientMatchPolicy), store)
    }

    pub fn disabled() -> Self {
        Self {
            policy: Arc::new(NoReadReceipts),
            store: None,
        }
    }

    pub(crate) fn message_to_mark(
        &self,
        event: &RealtimeEvent,
        bound_identity: Option<&UserId>,
    ) -> Option<(MessageId, Arc<dyn ReadReceiptStore>)> {
        let store = self.store.as_ref()?;
        let message_id = self.policy.message_to_mark(event, bound_identity)?;
        Some((message_id, Arc::clone(store)))
    }
}

impl Default for ReadReceipts {
    fn default() -> Self {
        Self::disabled()
    }
}
