use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Failed to open channel '{channel}': {message} {location}")]
    ConnectionFailed {
        channel: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Channel '{channel}' is closed {location}")]
    ChannelClosed {
        channel: String,
        location: ErrorLocation,
    },

    #[error("Transport error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to mark message {message_id} as read: {message} {location}")]
    ReadReceipt {
        message_id: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Fetch failed for key {key}: {message} {location}")]
    Fetch {
        key: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Internal error: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl RealtimeError {
    #[track_caller]
    pub fn connection_failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            channel: channel.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn channel_closed(channel: impl Into<String>) -> Self {
        Self::ChannelClosed {
            channel: channel.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn read_receipt(message_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadReceipt {
            message_id: message_id.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            key: key.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ConnectionFailed { .. })
    }

    /// Short label for metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "connection_failed",
            Self::ChannelClosed { .. } => "channel_closed",
            Self::Transport { .. } => "transport",
            Self::ReadReceipt { .. } => "read_receipt",
            Self::Fetch { .. } => "fetch",
            Self::Internal { .. } => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, RealtimeError>;
