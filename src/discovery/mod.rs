//! Home Assistant MQTT discovery: topics, config payloads and the publisher

pub mod messages;
pub mod publisher;
pub mod topics;

pub use messages::{DeviceIdentity, DiscoveryConfig, MANUFACTURER};
pub use publisher::{DiscoveryPublisher, PublishError};
pub use topics::{TopicBuilder, COMPONENT, DISCOVERY_PREFIX};
