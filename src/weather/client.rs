//! Weather Underground PWS HTTP client
//!
//! The public observation endpoint only answers requests that look like they
//! come from the wunderground.com web app, so every request carries a browser
//! user agent plus matching `Referer` and `Origin` headers.

use super::{FetchError, Observation, ObservationResponse, WeatherSource};
use crate::config::{WeatherSection, DEFAULT_API_URL};
use crate::error::sanitize_error_message;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const WUNDERGROUND_ORIGIN: &str = "https://www.wunderground.com";
const WUNDERGROUND_REFERER: &str = "https://www.wunderground.com/";

/// Client configuration
#[derive(Debug, Clone)]
pub struct WundergroundConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for WundergroundConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&WeatherSection> for WundergroundConfig {
    fn from(section: &WeatherSection) -> Self {
        Self {
            api_key: section.api_key.clone(),
            base_url: section.api_url.clone(),
            timeout: section.http_timeout,
        }
    }
}

/// Weather Underground current-observation client
pub struct WundergroundClient {
    config: WundergroundConfig,
    client: Client,
}

impl WundergroundClient {
    pub fn new(config: WundergroundConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(Self::provider_headers())
            .build()
            .map_err(|e| FetchError::Transport(sanitize_error_message(&e.to_string())))?;

        Ok(Self { config, client })
    }

    /// Headers the provider requires on every request
    fn provider_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(WUNDERGROUND_REFERER));
        headers.insert(ORIGIN, HeaderValue::from_static(WUNDERGROUND_ORIGIN));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers
    }

    /// Query parameters for one station
    fn query<'a>(&'a self, station_id: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("apiKey", self.config.api_key.as_str()),
            ("stationId", station_id),
            ("numericPrecision", "decimal"),
            ("format", "json"),
            ("units", "m"),
        ]
    }
}

#[async_trait]
impl WeatherSource for WundergroundClient {
    async fn fetch(&self, station_id: &str) -> Result<Observation, FetchError> {
        debug!(station_id, "Requesting current observation");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query(station_id))
            .send()
            .await
            .map_err(|e| FetchError::Transport(sanitize_error_message(&e.to_string())))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(FetchError::NoContent);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body: ObservationResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(sanitize_error_message(&e.to_string())))?;

        body.observations
            .into_iter()
            .next()
            .ok_or(FetchError::NoObservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters() {
        let client = WundergroundClient::new(WundergroundConfig {
            api_key: "key".to_string(),
            ..Default::default()
        })
        .unwrap();

        let query = client.query("KTEST1");
        assert!(query.contains(&("apiKey", "key")));
        assert!(query.contains(&("stationId", "KTEST1")));
        assert!(query.contains(&("units", "m")));
        assert!(query.contains(&("format", "json")));
        assert!(query.contains(&("numericPrecision", "decimal")));
    }

    #[test]
    fn test_provider_headers() {
        let headers = WundergroundClient::provider_headers();
        assert_eq!(headers[ORIGIN], WUNDERGROUND_ORIGIN);
        assert_eq!(headers[REFERER], WUNDERGROUND_REFERER);
        assert!(headers[USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_config_from_weather_section() {
        let section = crate::config::Config::test_config().weather;
        let config = WundergroundConfig::from(&section);
        assert_eq!(config.api_key, "test-api-key");
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
