use crate::logger;

use log::LevelFilter;
use mk_config::{LogLevel, LoggingConfig};
use tempfile::TempDir;

#[test]
fn given_log_file_when_initialized_then_records_written_to_file() {
    // Given
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("realtime.log");
    let config = LoggingConfig {
        level: LogLevel(LevelFilter::Info),
        colored: false,
        file: Some(path.to_str().unwrap().to_string()),
    };

    // When
    logger::initialize(&config).unwrap();
    log::logger().flush();

    // Then
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Logger initialized"));
    assert!(contents.contains("INFO"));
}
