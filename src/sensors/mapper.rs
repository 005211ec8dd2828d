//! Observation to sensor descriptor mapping
//!
//! The schema is fixed. Top-level fields come first (observation time, solar
//! radiation, wind direction, humidity), followed by the metric group in
//! [`METRIC_TABLE`] order. Fields that are absent or null are skipped.

use crate::weather::{MetricGroup, Observation};
use std::fmt;

/// State value of one sensor, rendered bare on the state topic
#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Text(text) => f.write_str(text),
            SensorValue::Number(number) => write!(f, "{number}"),
        }
    }
}

/// One discoverable sensor and its current value
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDescriptor {
    pub key: &'static str,
    pub display_name: &'static str,
    pub device_class: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub value: SensorValue,
}

/// Static metadata for a metric-group field
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub key: &'static str,
    pub display_name: &'static str,
    pub device_class: Option<&'static str>,
    pub unit: &'static str,
    pub read: fn(&MetricGroup) -> Option<f64>,
}

/// Metric-group fields in publish order
pub static METRIC_TABLE: [MetricSpec; 10] = [
    MetricSpec {
        key: "temperature",
        display_name: "Temperature",
        device_class: Some("temperature"),
        unit: "°C",
        read: |m| m.temp,
    },
    MetricSpec {
        key: "heat_index",
        display_name: "Heat Index",
        device_class: Some("temperature"),
        unit: "°C",
        read: |m| m.heat_index,
    },
    MetricSpec {
        key: "dew_point",
        display_name: "Dew Point",
        device_class: Some("temperature"),
        unit: "°C",
        read: |m| m.dewpt,
    },
    MetricSpec {
        key: "wind_chill",
        display_name: "Wind Chill",
        device_class: Some("temperature"),
        unit: "°C",
        read: |m| m.wind_chill,
    },
    MetricSpec {
        key: "wind_speed",
        display_name: "Wind Speed",
        device_class: Some("wind_speed"),
        unit: "km/h",
        read: |m| m.wind_speed,
    },
    MetricSpec {
        key: "wind_gust",
        display_name: "Wind Gust",
        device_class: Some("wind_speed"),
        unit: "km/h",
        read: |m| m.wind_gust,
    },
    MetricSpec {
        key: "pressure",
        display_name: "Pressure",
        device_class: Some("pressure"),
        unit: "hPa",
        read: |m| m.pressure,
    },
    MetricSpec {
        key: "precipitation_rate",
        display_name: "Precipitation Rate",
        device_class: None,
        unit: "mm/h",
        read: |m| m.precip_rate,
    },
    MetricSpec {
        key: "precipitation_total",
        display_name: "Precipitation Total",
        device_class: None,
        unit: "mm",
        read: |m| m.precip_total,
    },
    MetricSpec {
        key: "elevation",
        display_name: "Elevation",
        device_class: None,
        unit: "m",
        read: |m| m.elev,
    },
];

/// Map an observation into descriptors in fixed schema order
pub fn map_observation(observation: &Observation) -> Vec<SensorDescriptor> {
    let mut descriptors = Vec::with_capacity(4 + METRIC_TABLE.len());

    if let Some(time) = &observation.obs_time_utc {
        descriptors.push(SensorDescriptor {
            key: "observation_time",
            display_name: "Observation Time",
            device_class: None,
            unit: None,
            value: SensorValue::Text(time.clone()),
        });
    }

    let scalars = [
        ("solar_radiation", "Solar Radiation", None, "W/m²", observation.solar_radiation),
        ("wind_direction", "Wind Direction", None, "°", observation.winddir),
        ("humidity", "Humidity", Some("humidity"), "%", observation.humidity),
    ];
    for (key, display_name, device_class, unit, value) in scalars {
        if let Some(value) = value {
            descriptors.push(SensorDescriptor {
                key,
                display_name,
                device_class,
                unit: Some(unit),
                value: SensorValue::Number(value),
            });
        }
    }

    if let Some(metric) = &observation.metric {
        descriptors.extend(METRIC_TABLE.iter().filter_map(|spec| {
            (spec.read)(metric).map(|value| SensorDescriptor {
                key: spec.key,
                display_name: spec.display_name,
                device_class: spec.device_class,
                unit: Some(spec.unit),
                value: SensorValue::Number(value),
            })
        }));
    }

    descriptors
}
