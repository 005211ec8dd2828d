//! Home Assistant MQTT discovery topic construction

/// Discovery prefix Home Assistant listens on
pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// Entity component all published metrics are announced as
pub const COMPONENT: &str = "sensor";

/// Topic construction for one sensor set
pub struct TopicBuilder;

impl TopicBuilder {
    /// Build sensor base path: `homeassistant/sensor/{sensor_set}/{key}`
    fn build_base(sensor_set: &str, key: &str) -> String {
        format!("{DISCOVERY_PREFIX}/{COMPONENT}/{sensor_set}/{key}")
    }

    /// Build discovery config topic: `homeassistant/sensor/{sensor_set}/{key}/config`
    pub fn build_config_topic(sensor_set: &str, key: &str) -> String {
        format!("{}/config", Self::build_base(sensor_set, key))
    }

    /// Build state topic: `homeassistant/sensor/{sensor_set}/{key}/state`
    pub fn build_state_topic(sensor_set: &str, key: &str) -> String {
        format!("{}/state", Self::build_base(sensor_set, key))
    }

    /// Build unique entity id: `{sensor_set}_{key}`
    pub fn build_unique_id(sensor_set: &str, key: &str) -> String {
        format!("{sensor_set}_{key}")
    }
}
