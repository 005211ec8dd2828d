//! Discovery config payloads

use super::topics::TopicBuilder;
use crate::sensors::SensorDescriptor;
use serde::{Deserialize, Serialize};

pub const MANUFACTURER: &str = "Weather Underground";

/// Device block shared by every sensor of a sensor set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceIdentity {
    pub identifiers: Vec<String>,
    pub name: String,
    pub manufacturer: String,
}

impl DeviceIdentity {
    pub fn new(device_id: &str) -> Self {
        Self {
            identifiers: vec![device_id.to_string()],
            name: device_id.to_string(),
            manufacturer: MANUFACTURER.to_string(),
        }
    }
}

/// Retained payload on a sensor's config topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    pub name: String,
    pub state_topic: String,
    pub unique_id: String,
    pub device: DeviceIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
}

impl DiscoveryConfig {
    pub fn for_sensor(
        device: &DeviceIdentity,
        sensor_set: &str,
        descriptor: &SensorDescriptor,
    ) -> Self {
        Self {
            name: format!("{sensor_set} {}", descriptor.display_name),
            state_topic: TopicBuilder::build_state_topic(sensor_set, descriptor.key),
            unique_id: TopicBuilder::build_unique_id(sensor_set, descriptor.key),
            device: device.clone(),
            device_class: descriptor.device_class.map(str::to_string),
            unit_of_measurement: descriptor.unit.map(str::to_string),
        }
    }
}
