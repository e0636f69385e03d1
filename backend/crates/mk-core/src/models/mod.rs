pub mod direct_message;
pub mod event_filter;
pub mod event_kind;
pub mod ids;
pub mod realtime_event;
pub mod user_profile;
