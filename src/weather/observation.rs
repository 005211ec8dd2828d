//! Weather Underground PWS observation payload
//!
//! Field names follow the provider's JSON. Every field is optional: stations
//! omit sensors they do not have, and report `null` for sensors that are
//! temporarily down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body of the current-observation endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObservationResponse {
    #[serde(default)]
    pub observations: Vec<Observation>,
}

/// One station observation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(rename = "stationID", default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub obs_time_utc: Option<String>,
    #[serde(default)]
    pub obs_time_local: Option<String>,
    #[serde(default)]
    pub solar_radiation: Option<f64>,
    #[serde(default)]
    pub winddir: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Unit-converted values, present when `units=m` is requested
    #[serde(default)]
    pub metric: Option<MetricGroup>,
}

/// Metric-unit measurement group
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricGroup {
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub heat_index: Option<f64>,
    #[serde(default)]
    pub dewpt: Option<f64>,
    #[serde(default)]
    pub wind_chill: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub precip_rate: Option<f64>,
    #[serde(default)]
    pub precip_total: Option<f64>,
    #[serde(default)]
    pub elev: Option<f64>,
}

impl Observation {
    /// Observation timestamp, if present and well formed
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        self.obs_time_utc
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|time| time.with_timezone(&Utc))
    }

    /// Age of the observation relative to `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.observed_at().map(|observed| now - observed)
    }
}
