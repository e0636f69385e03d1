pub mod error;
pub mod models;

pub use error::{CoreError, CoreResult};
pub use models::direct_message::DirectMessage;
pub use models::event_filter::EventFilter;
pub use models::event_kind::EventKind;
pub use models::ids::{MessageId, UserId};
pub use models::realtime_event::RealtimeEvent;
pub use models::user_profile::UserProfile;
