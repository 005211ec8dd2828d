//! Tests for logging configuration and format parsing
//!
//! Tests the pure functions in the logging module that handle log format,
//! level and verbosity parsing.

use pws2mqtt::observability::logging::{apply_verbosity, build_filter, parse_level, LogFormat};
use tracing::Level;

#[test]
fn test_log_format_parse_is_case_insensitive() {
    assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
    assert_eq!(LogFormat::parse("COMPACT"), LogFormat::Compact);
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    assert_eq!(LogFormat::parse("  json  "), LogFormat::Json);
    assert_eq!(LogFormat::parse("123"), LogFormat::Json);
}

#[test]
fn test_log_level_parsing() {
    assert_eq!(parse_level("ERROR"), Level::ERROR);
    assert_eq!(parse_level("warn"), Level::WARN);
    assert_eq!(parse_level("Info"), Level::INFO);
    assert_eq!(parse_level("trace"), Level::TRACE);
    assert_eq!(parse_level(""), Level::INFO);
}

#[test]
fn test_verbosity_never_lowers_level() {
    assert_eq!(apply_verbosity(Level::WARN, 1), Level::DEBUG);
    assert_eq!(apply_verbosity(Level::DEBUG, 1), Level::DEBUG);
    assert_eq!(apply_verbosity(Level::ERROR, 3), Level::TRACE);
}

#[test]
fn test_default_filter_quiets_dependencies() {
    let filter = build_filter(Level::DEBUG, None).to_string();
    assert!(filter.contains("rumqttc=warn"));
    assert!(filter.contains("reqwest=warn"));
}

#[test]
fn test_blank_rust_log_is_ignored() {
    let filter = build_filter(Level::INFO, Some("  ")).to_string();
    assert!(filter.contains("hyper=warn"));
}
