use crate::{RealtimeError, Result as RealtimeResult};

use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::info;
use mk_config::LoggingConfig;

/// Initialize the global logger with fern.
///
/// Writes to `config.file` when set, otherwise to stdout (colored when
/// `config.colored`). Also bridges `tracing` events into `log`.
pub fn initialize(config: &LoggingConfig) -> RealtimeResult<()> {
    let level_filter = *config.level;

    let base_dispatch = Dispatch::new().level(level_filter);

    let dispatch = if let Some(ref log_path) = config.file {
        let file = fern::log_file(log_path).map_err(|e| {
            RealtimeError::internal(format!("Failed to open log file {log_path}: {e}"))
        })?;

        Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{file}:{line}]",
                    date = humantime::format_rfc3339(SystemTime::now()),
                    level = record.level(),
                    message = message,
                    file = record.file().unwrap_or("unknown"),
                    line = record.line().unwrap_or(0),
                ))
            })
            .chain(file)
    } else if config.colored {
        let colors = ColoredLevelConfig::new()
            .trace(Color::Magenta)
            .debug(Color::Blue)
            .info(Color::Green)
            .warn(Color::Yellow)
            .error(Color::Red);

        Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{file}:{line}]",
                    date = humantime::format_rfc3339(SystemTime::now()),
                    level = colors.color(record.level()),
                    message = message,
                    file = record.file().unwrap_or("unknown"),
                    line = record.line().unwrap_or(0),
                ))
            })
            .chain(std::io::stdout())
    } else {
        Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{file}:{line}]",
                    date = humantime::format_rfc3339(SystemTime::now()),
                    level = record.level(),
                    message = message,
                    file = record.file().unwrap_or("unknown"),
                    line = record.line().unwrap_or(0),
                ))
            })
            .chain(std::io::stdout())
    };

    base_dispatch
        .chain(dispatch)
        .apply()
        .map_err(|e| RealtimeError::internal(format!("Failed to initialize logger: {e}")))?;

    match &config.file {
        Some(path) => info!("Logger initialized: level={level_filter:?}, file={path}"),
        None => info!("Logger initialized: level={level_filter:?}, stdout"),
    }

    // Bridge tracing to log
    tracing_log::LogTracer::init().ok();

    Ok(())
}
