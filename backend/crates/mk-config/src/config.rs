use crate::{
    CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    LoggingConfig, RealtimeConfig, RetryConfig,
};

use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub realtime: RealtimeConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for MK_CONFIG_DIR env var, else use ./.mk/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply MK_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: MK_CONFIG_DIR env var > ./.mk/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir().map_err(|source| ConfigError::ConfigDir { source })?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.realtime.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Log configuration summary.
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  realtime: channel={} ({}.{}), buffer={}",
            self.realtime.channel_name,
            self.realtime.schema,
            self.realtime.table,
            self.realtime.event_buffer_size
        );
        info!(
            "  retry: attempts={}, initial={}ms, max={}ms, backoff={}x, worst case={}ms",
            self.retry.max_attempts,
            self.retry.initial_delay_ms,
            self.retry.max_delay_ms,
            self.retry.backoff_multiplier,
            self.retry.worst_case_backoff_ms()
        );
        info!(
            "  logging: {} (colored: {}, file: {})",
            *self.logging.level,
            self.logging.colored,
            self.logging.file.as_deref().unwrap_or("stdout")
        );
    }

    fn apply_env_overrides(&mut self) {
        // Realtime
        Self::apply_env_string("MK_REALTIME_CHANNEL", &mut self.realtime.channel_name);
        Self::apply_env_string("MK_REALTIME_SCHEMA", &mut self.realtime.schema);
        Self::apply_env_string("MK_REALTIME_TABLE", &mut self.realtime.table);
        Self::apply_env_parse(
            "MK_REALTIME_EVENT_BUFFER",
            &mut self.realtime.event_buffer_size,
        );

        // Retry
        Self::apply_env_parse("MK_RETRY_MAX_ATTEMPTS", &mut self.retry.max_attempts);
        Self::apply_env_parse(
            "MK_RETRY_INITIAL_DELAY_MS",
            &mut self.retry.initial_delay_ms,
        );
        Self::apply_env_parse("MK_RETRY_MAX_DELAY_MS", &mut self.retry.max_delay_ms);
        Self::apply_env_parse(
            "MK_RETRY_BACKOFF_MULTIPLIER",
            &mut self.retry.backoff_multiplier,
        );
        Self::apply_env_bool("MK_RETRY_JITTER", &mut self.retry.jitter);

        // Logging
        Self::apply_env_parse("MK_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("MK_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("MK_LOG_FILE", &mut self.logging.file);
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}
