use crate::{MessageId, UserId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the direct message table as delivered by change notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,

    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl DirectMessage {
    pub fn new(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        receiver_id: impl Into<UserId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            content: content.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// True when `user_id` is the receiving side of this message
    pub fn is_addressed_to(&self, user_id: &UserId) -> bool {
        &self.receiver_id == user_id
    }
}
