use crate::{ConfigError, ConfigErrorResult, DEFAULT_LOG_COLORED, DEFAULT_LOG_LEVEL, LogLevel};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Colored stdout output (ignored when logging to a file)
    pub colored: bool,
    /// Log file path; stdout when unset
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel(DEFAULT_LOG_LEVEL),
            colored: DEFAULT_LOG_COLORED,
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if let Some(file) = &self.file
            && file.trim().is_empty()
        {
            return Err(ConfigError::invalid("logging", "file", "must not be blank"));
        }

        Ok(())
    }
}
