use std::fmt;

/// Lifecycle of a dispatcher's upstream subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Uninitialized,
    /// Waiting for the transport to confirm the subscription
    Connecting,
    /// Confirmed; events are being delivered
    Subscribed,
    /// Terminal
    Disconnected,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Disconnected => "disconnected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
