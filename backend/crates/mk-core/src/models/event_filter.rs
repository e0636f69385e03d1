use crate::{EventKind, RealtimeEvent};

/// Which change notifications a channel listens for.
///
/// `kind: None` listens to every operation. `filter` is handed to the
/// transport untouched (e.g. `receiver_id=eq.<id>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub schema: String,
    pub table: String,
    pub filter: Option<String>,
}

impl EventFilter {
    pub fn all(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            kind: None,
            schema: schema.into(),
            table: table.into(),
            filter: None,
        }
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Check the operation kind of an event against this filter
    pub fn matches(&self, event: &RealtimeEvent) -> bool {
        self.kind.is_none_or(|kind| kind == event.kind())
    }
}
