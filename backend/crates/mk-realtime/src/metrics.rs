use metrics::{counter, gauge};

/// Metrics collector for the realtime core
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            prefix: "mk_realtime",
        }
    }

    /// Record channel lifecycle transition
    pub fn channel_state(&self, state: &str) {
        counter!(format!("{}.channel.{}", self.prefix, state)).increment(1);
    }

    /// Record event received from the transport
    pub fn event_received(&self, kind: &str) {
        counter!(format!("{}.events.received", self.prefix)).increment(1);
        counter!(format!("{}.events.received.{}", self.prefix, kind)).increment(1);
    }

    /// Record one fan-out pass
    pub fn fanout(&self, delivered: usize) {
        counter!(format!("{}.fanout.deliveries", self.prefix)).increment(delivered as u64);
        gauge!(format!("{}.fanout.subscribers", self.prefix)).set(delivered as f64);
    }

    /// Record a subscriber callback that panicked
    pub fn callback_panicked(&self) {
        counter!(format!("{}.callbacks.panicked", self.prefix)).increment(1);
    }

    /// Record subscription change
    pub fn subscription_changed(&self, action: &str) {
        counter!(format!("{}.subscriptions.{}", self.prefix, action)).increment(1);
    }

    /// Record read receipt outcome
    pub fn read_receipt(&self, outcome: &str) {
        counter!(format!("{}.read_receipts.{}", self.prefix, outcome)).increment(1);
    }

    /// Record cache lookup outcome (hit, joined, miss)
    pub fn cache_lookup(&self, outcome: &str) {
        counter!(format!("{}.cache.{}", self.prefix, outcome)).increment(1);
    }

    /// Record error occurrence
    pub fn error_occurred(&self, error_type: &str) {
        counter!(format!("{}.errors.total", self.prefix)).increment(1);
        counter!(format!("{}.errors.{}", self.prefix, error_type)).increment(1);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
