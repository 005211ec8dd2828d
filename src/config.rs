//! Configuration loading and validation
//!
//! The service is configured entirely through environment-style key/value pairs.
//! [`Config::from_lookup`] builds one immutable [`Config`] from any lookup function
//! so that nothing below `main` ever reads the process environment directly.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable names
pub mod keys {
    pub const SENSOR_SET_NAME: &str = "SENSOR_SET_NAME";
    pub const API_KEY: &str = "WU_API_KEY";
    pub const STATION_IDS: &str = "WU_STATION_IDS";
    pub const MAX_RETRIES: &str = "WU_MAX_RETRIES";
    pub const API_URL: &str = "WU_API_URL";
    pub const HTTP_TIMEOUT: &str = "WU_HTTP_TIMEOUT";
    pub const MQTT_HOST: &str = "MQTT_HOST";
    pub const MQTT_PORT: &str = "MQTT_PORT";
    pub const MQTT_CLIENT_ID: &str = "MQTT_CLIENT_ID";
    pub const MQTT_TLS: &str = "MQTT_TLS";
    pub const MQTT_USERNAME: &str = "MQTT_USERNAME";
    pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";
    pub const POLL_INTERVAL: &str = "POLL_INTERVAL";
}

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_CLIENT_ID: &str = "pws2mqtt";
pub const DEFAULT_POLL_INTERVAL: &str = "1m";
pub const DEFAULT_API_URL: &str = "https://api.weather.com/v2/pws/observations/current";
pub const DEFAULT_HTTP_TIMEOUT: &str = "10s";

/// Characters MQTT reserves inside topic names
const RESERVED_TOPIC_CHARS: [char; 3] = ['+', '#', '\0'];

const REDACTED: &str = "***";

/// Complete runtime configuration, built once at startup
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Config {
    pub sensor_set: SensorSetSection,
    pub weather: WeatherSection,
    pub mqtt: MqttSection,
    pub schedule: ScheduleSection,
}

/// Device and topic identity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorSetSection {
    /// Used as the device identifier and as a topic path segment
    pub name: String,
}

/// Upstream weather API settings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherSection {
    pub api_key: String,
    /// Stations in fallback order
    pub station_ids: Vec<String>,
    /// Attempts per station before falling back to the next one
    pub max_retries: u32,
    pub api_url: String,
    #[serde(serialize_with = "serialize_duration")]
    pub http_timeout: Duration,
}

/// MQTT broker connection settings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MqttSection {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScheduleSection {
    pub poll: PollMode,
}

/// How often publish cycles run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// First cycle immediately, then one per interval
    Interval(Duration),
    /// Exactly one cycle, then exit
    Once,
}

impl Serialize for PollMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PollMode::Interval(interval) => serializer.serialize_str(&format_duration(*interval)),
            PollMode::Once => serializer.serialize_str("once"),
        }
    }
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

/// Configuration loading errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("Invalid poll interval '{0}': expected a duration such as 5m, 2m30s or 1h")]
    InvalidPollInterval(String),
    #[error("Invalid sensor set name '{name}': {reason}")]
    InvalidSensorSetName { name: String, reason: String },
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup
    ///
    /// Validation order matters to callers: the sensor set name and the poll
    /// interval are checked before anything that could lead to network activity.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let name = lookup(keys::SENSOR_SET_NAME).ok_or(ConfigError::Missing(keys::SENSOR_SET_NAME))?;
        validate_sensor_set_name(&name)?;

        let poll = match lookup(keys::POLL_INTERVAL) {
            None => PollMode::Interval(parse_poll_interval(DEFAULT_POLL_INTERVAL)?),
            Some(raw) => parse_poll_mode(&raw)?,
        };

        let api_key = required(keys::API_KEY)?;
        let station_ids = parse_station_ids(&required(keys::STATION_IDS)?)?;

        let max_retries = match lookup(keys::MAX_RETRIES) {
            Some(raw) if !raw.trim().is_empty() => parse_max_retries(&raw)?,
            _ => DEFAULT_MAX_RETRIES,
        };

        let api_url = lookup(keys::API_URL)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url).map_err(|e| ConfigError::InvalidValue {
            key: keys::API_URL,
            reason: e.to_string(),
        })?;

        let http_timeout_raw = lookup(keys::HTTP_TIMEOUT)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_TIMEOUT.to_string());
        let http_timeout =
            parse_duration(&http_timeout_raw).ok_or_else(|| ConfigError::InvalidValue {
                key: keys::HTTP_TIMEOUT,
                reason: format!("'{http_timeout_raw}' is not a duration"),
            })?;

        let host = required(keys::MQTT_HOST)?;
        let port_raw = required(keys::MQTT_PORT)?;
        let port = port_raw
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                key: keys::MQTT_PORT,
                reason: format!("'{port_raw}': {e}"),
            })?;
        let tls = match lookup(keys::MQTT_TLS) {
            Some(raw) if !raw.trim().is_empty() => parse_bool(keys::MQTT_TLS, &raw)?,
            _ => false,
        };
        let client_id = lookup(keys::MQTT_CLIENT_ID)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
        let username = lookup(keys::MQTT_USERNAME).filter(|value| !value.is_empty());
        let password = lookup(keys::MQTT_PASSWORD).filter(|value| !value.is_empty());

        Ok(Config {
            sensor_set: SensorSetSection { name },
            weather: WeatherSection {
                api_key,
                station_ids,
                max_retries,
                api_url,
                http_timeout,
            },
            mqtt: MqttSection {
                host,
                port,
                tls,
                client_id,
                username,
                password,
            },
            schedule: ScheduleSection { poll },
        })
    }

    /// Copy of the configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.weather.api_key = REDACTED.to_string();
        if config.mqtt.password.is_some() {
            config.mqtt.password = Some(REDACTED.to_string());
        }
        config
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        Config {
            sensor_set: SensorSetSection {
                name: "backyard".to_string(),
            },
            weather: WeatherSection {
                api_key: "test-api-key".to_string(),
                station_ids: vec!["KTEST1".to_string()],
                max_retries: DEFAULT_MAX_RETRIES,
                api_url: DEFAULT_API_URL.to_string(),
                http_timeout: Duration::from_secs(10),
            },
            mqtt: MqttSection {
                host: "localhost".to_string(),
                port: 1883,
                tls: false,
                client_id: DEFAULT_CLIENT_ID.to_string(),
                username: None,
                password: None,
            },
            schedule: ScheduleSection {
                poll: PollMode::Once,
            },
        }
    }
}

/// Reject names that would break the topic hierarchy
pub fn validate_sensor_set_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidSensorSetName {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if let Some(ch) = name.chars().find(|c| RESERVED_TOPIC_CHARS.contains(c)) {
        return Err(ConfigError::InvalidSensorSetName {
            name: name.replace('\0', "\\0"),
            reason: format!("contains reserved topic character {ch:?}"),
        });
    }

    Ok(())
}

/// Parse the poll setting: empty or `once` selects one-shot mode
fn parse_poll_mode(raw: &str) -> Result<PollMode, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("once") {
        return Ok(PollMode::Once);
    }
    Ok(PollMode::Interval(parse_poll_interval(trimmed)?))
}

fn parse_poll_interval(raw: &str) -> Result<Duration, ConfigError> {
    parse_duration(raw)
        .filter(|interval| *interval >= Duration::from_millis(1))
        .ok_or_else(|| ConfigError::InvalidPollInterval(raw.to_string()))
}

fn parse_station_ids(raw: &str) -> Result<Vec<String>, ConfigError> {
    let ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ConfigError::Missing(keys::STATION_IDS));
    }
    Ok(ids)
}

fn parse_max_retries(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: keys::MAX_RETRIES,
            reason: "must be at least 1".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::InvalidValue {
            key: keys::MAX_RETRIES,
            reason: format!("'{}': {e}", raw.trim()),
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            reason: format!("expected true or false, got '{other}'"),
        }),
    }
}

fn duration_segment() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+)(ms|s|m|h|d)").expect("duration segment pattern is a valid regex")
    })
}

/// Parse a compound duration such as `5m`, `2m30s`, `1h` or `500ms`
///
/// A bare integer is read as milliseconds. Returns `None` for anything else.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(millis) = raw.parse::<u64>() {
        return Some(Duration::from_millis(millis));
    }

    let segment = duration_segment();
    let mut rest = raw;
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let captures = segment.captures(rest)?;
        let amount: u64 = captures[1].parse().ok()?;
        let unit_millis: u64 = match &captures[2] {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            _ => return None,
        };
        total = total.checked_add(Duration::from_millis(amount.checked_mul(unit_millis)?))?;
        rest = &rest[captures[0].len()..];
    }

    Some(total)
}

/// Render a duration in the same compound notation [`parse_duration`] accepts
pub fn format_duration(duration: Duration) -> String {
    let mut millis = duration.as_millis();
    if millis == 0 {
        return "0ms".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [("h", 3_600_000u128), ("m", 60_000), ("s", 1_000), ("ms", 1)] {
        let count = millis / size;
        if count > 0 {
            out.push_str(&format!("{count}{unit}"));
            millis %= size;
        }
    }
    out
}
