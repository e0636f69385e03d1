use std::fmt::Display;
use std::ops::RangeInclusive;
use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    /// A setting was read but rejected by its section's rules
    #[error("Invalid {section}.{field}: {reason} {location}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Cannot resolve config directory: {source}")]
    ConfigDir {
        #[source]
        source: std::io::Error,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn invalid(section: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section,
            field,
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// `section.field` of a rejected setting, if this is a validation error
    pub fn setting(&self) -> Option<String> {
        match self {
            ConfigError::Invalid { section, field, .. } => Some(format!("{section}.{field}")),
            _ => None,
        }
    }
}

/// Reject `value` unless it lies in `range`
#[track_caller]
pub(crate) fn ensure_in_range<T>(
    section: &'static str,
    field: &'static str,
    value: T,
    range: RangeInclusive<T>,
) -> ConfigErrorResult<()>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::invalid(
        section,
        field,
        format!("must be {}-{}, got {}", range.start(), range.end(), value),
    ))
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
