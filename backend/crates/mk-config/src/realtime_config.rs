use crate::error::ensure_in_range;
use crate::{ConfigError, ConfigErrorResult};

use std::ops::RangeInclusive;

use serde::Deserialize;

pub const DEFAULT_CHANNEL_NAME: &str = "dm-channel";
pub const MAX_CHANNEL_NAME_LENGTH: usize = 128;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "messages";

pub const EVENT_BUFFER_SIZE_RANGE: RangeInclusive<usize> = 1..=65_536;
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

const SECTION: &str = "realtime";

/// Upstream realtime channel settings for the message dispatcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Logical channel name; one upstream subscription per name
    pub channel_name: String,
    /// Database schema the change feed is scoped to
    pub schema: String,
    /// Table whose changes are pushed
    pub table: String,
    /// Capacity of the queue between the transport and the dispatcher's
    /// delivery task; passed to the transport when the channel is opened
    pub event_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_name: String::from(DEFAULT_CHANNEL_NAME),
            schema: String::from(DEFAULT_SCHEMA),
            table: String::from(DEFAULT_TABLE),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl RealtimeConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.channel_name.trim().is_empty() {
            return Err(ConfigError::invalid(SECTION, "channel_name", "must not be empty"));
        }

        if self.channel_name.len() > MAX_CHANNEL_NAME_LENGTH {
            return Err(ConfigError::invalid(
                SECTION,
                "channel_name",
                format!(
                    "must be at most {} characters, got {}",
                    MAX_CHANNEL_NAME_LENGTH,
                    self.channel_name.len()
                ),
            ));
        }

        if self.table.trim().is_empty() {
            return Err(ConfigError::invalid(SECTION, "table", "must not be empty"));
        }

        ensure_in_range(
            SECTION,
            "event_buffer_size",
            self.event_buffer_size,
            EVENT_BUFFER_SIZE_RANGE,
        )
    }
}
