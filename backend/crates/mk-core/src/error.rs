use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid change payload: {message} {location}")]
    InvalidPayload {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid event kind: {value} {location}")]
    InvalidEventKind {
        value: String,
        location: ErrorLocation,
    },

    #[error("Payload decode failed: {source} {location}")]
    Decode {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

pub type CoreResult<T> = StdResult<T, CoreError>;
