mod config;
mod error;
mod log_level;
mod logging_config;
mod realtime_config;
mod retry_config;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use realtime_config::RealtimeConfig;
pub use retry_config::RetryConfig;

const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_COLORED: bool = true;

const CONFIG_DIR_ENV: &str = "MK_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".mk";
const CONFIG_FILE_NAME: &str = "config.toml";

#[cfg(test)]
mod tests;
