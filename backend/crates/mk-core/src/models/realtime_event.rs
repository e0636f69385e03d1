use crate::{CoreError, CoreResult, DirectMessage, EventKind, MessageId, UserId};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde_json::Value;

/// A change at the source of truth, forwarded as-is to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Insert {
        record: DirectMessage,
    },
    Update {
        record: DirectMessage,
        previous: Option<DirectMessage>,
    },
    Delete {
        id: MessageId,
    },
}

impl RealtimeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Insert { .. } => EventKind::Insert,
            Self::Update { .. } => EventKind::Update,
            Self::Delete { .. } => EventKind::Delete,
        }
    }

    pub fn message_id(&self) -> &MessageId {
        match self {
            Self::Insert { record } | Self::Update { record, .. } => &record.id,
            Self::Delete { id } => id,
        }
    }

    /// Sender of the message; deletes only carry the id
    pub fn sender_id(&self) -> Option<&UserId> {
        match self {
            Self::Insert { record } | Self::Update { record, .. } => Some(&record.sender_id),
            Self::Delete { .. } => None,
        }
    }

    /// Receiver of the message; deletes only carry the id
    pub fn receiver_id(&self) -> Option<&UserId> {
        match self {
            Self::Insert { record } | Self::Update { record, .. } => Some(&record.receiver_id),
            Self::Delete { .. } => None,
        }
    }

    /// Decode a change notification of the shape
    /// `{ "eventType": "INSERT", "new": {...}, "old": {...} }`.
    #[track_caller]
    pub fn from_change_payload(payload: Value) -> CoreResult<Self> {
        let location = Location::caller();

        let event_type = payload
            .get("eventType")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::InvalidPayload {
                message: "missing eventType".to_string(),
                location: ErrorLocation::from(location),
            })?;

        match EventKind::from_str(event_type)? {
            EventKind::Insert => Ok(Self::Insert {
                record: decode_record(&payload, "new", location)?,
            }),
            EventKind::Update => {
                let record = decode_record(&payload, "new", location)?;
                // `old` only holds the primary key unless replica identity is full
                let previous = decode_record(&payload, "old", location).ok();
                Ok(Self::Update { record, previous })
            }
            EventKind::Delete => {
                let id = payload
                    .get("old")
                    .and_then(|old| old.get("id"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| CoreError::InvalidPayload {
                        message: "delete without old.id".to_string(),
                        location: ErrorLocation::from(location),
                    })?;
                Ok(Self::Delete {
                    id: MessageId::from(id),
                })
            }
        }
    }
}

fn decode_record(
    payload: &Value,
    field: &str,
    location: &'static Location<'static>,
) -> CoreResult<DirectMessage> {
    let raw = payload
        .get(field)
        .filter(|value| value.as_object().is_some_and(|obj| !obj.is_empty()))
        .ok_or_else(|| CoreError::InvalidPayload {
            message: format!("missing '{field}' record"),
            location: ErrorLocation::from(location),
        })?;

    serde_json::from_value(raw.clone()).map_err(|source| CoreError::Decode {
        source,
        location: ErrorLocation::from(location),
    })
}
