use crate::LogLevel;

use std::str::FromStr;

use log::LevelFilter;

#[test]
fn given_known_level_when_parsed_then_matches() {
    assert_eq!(LogLevel::from_str("debug").unwrap(), LogLevel(LevelFilter::Debug));
    assert_eq!(LogLevel::from_str("WARN").unwrap(), LogLevel(LevelFilter::Warn));
    assert_eq!(LogLevel::from_str("off").unwrap(), LogLevel(LevelFilter::Off));
}

#[test]
fn given_unknown_level_when_parsed_then_info() {
    assert_eq!(LogLevel::from_str("verbose").unwrap(), LogLevel(LevelFilter::Info));
}

#[test]
fn given_toml_level_when_deserialized_then_lenient() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        level: LogLevel,
    }

    let parsed: Wrapper = toml::from_str(r#"level = "trace""#).unwrap();
    assert_eq!(*parsed.level, LevelFilter::Trace);

    let fallback: Wrapper = toml::from_str(r#"level = "loud""#).unwrap();
    assert_eq!(*fallback.level, LevelFilter::Info);
}
