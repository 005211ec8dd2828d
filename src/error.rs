//! Top-level error type and exit code mapping
//!
//! Every fatal condition travels up as an [`AppError`]. Only `main` turns it
//! into a process exit, through [`AppError::exit_code`].

use crate::config::ConfigError;
use crate::discovery::PublishError;
use crate::transport::mqtt::MqttError;
use crate::transport::BrokerLifecycleError;
use crate::weather::{FetchError, TerminalFetchFailure};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const MISSING_CONFIG: i32 = 2;
    pub const INVALID_POLL_INTERVAL: i32 = 3;
    pub const INVALID_SENSOR_SET_NAME: i32 = 4;
    pub const BROKER_CLOSED: i32 = 5;
    pub const BROKER_ERROR: i32 = 6;
    pub const STATIONS_EXHAUSTED: i32 = 7;
}

/// Main error type for the service
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    StationsExhausted(#[from] TerminalFetchFailure),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerLifecycleError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("MQTT client error: {0}")]
    Mqtt(#[from] MqttError),

    #[error("Failed to build weather client: {0}")]
    WeatherClient(#[source] FetchError),
}

impl AppError {
    /// Map the error kind to its documented process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(ConfigError::InvalidPollInterval(_)) => {
                exit_codes::INVALID_POLL_INTERVAL
            }
            AppError::Config(ConfigError::InvalidSensorSetName { .. }) => {
                exit_codes::INVALID_SENSOR_SET_NAME
            }
            AppError::Config(ConfigError::Missing(_) | ConfigError::InvalidValue { .. }) => {
                exit_codes::MISSING_CONFIG
            }
            AppError::StationsExhausted(_) => exit_codes::STATIONS_EXHAUSTED,
            AppError::Broker(
                BrokerLifecycleError::Closed(_) | BrokerLifecycleError::Offline(_),
            ) => exit_codes::BROKER_CLOSED,
            AppError::Broker(BrokerLifecycleError::Error(_)) => exit_codes::BROKER_ERROR,
            AppError::Publish(_) | AppError::Mqtt(_) => exit_codes::BROKER_ERROR,
            AppError::WeatherClient(_) => exit_codes::MISSING_CONFIG,
        }
    }
}

fn secret_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(password|token|api_?key|key|secret)([=:]\s*)[^\s&]+")
            .expect("secret pattern is a valid regex")
    })
}

/// Sanitize error messages so credentials never reach the log stream
///
/// reqwest errors embed the full request URL, which carries the API key as a
/// query parameter.
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = secret_pattern()
        .replace_all(message, "${1}${2}***")
        .to_string();

    // Truncate very long messages - ensure total length is <= 500
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let mut cut = 500 - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for service operations
pub type AppResult<T> = Result<T, AppError>;
