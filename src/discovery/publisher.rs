//! Discovery publisher
//!
//! Writes one retained config message and one retained state message per
//! sensor, config first. There is no atomicity across sensors: a consumer may
//! see a cycle half applied.

use super::messages::{DeviceIdentity, DiscoveryConfig};
use super::topics::TopicBuilder;
use crate::sensors::SensorDescriptor;
use crate::transport::Transport;
use thiserror::Error;
use tracing::debug;

/// A message the transport refused to accept
#[derive(Debug, Error)]
#[error("Failed to publish to {topic}: {source}")]
pub struct PublishError {
    pub topic: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Publishes sensor descriptors through any [`Transport`]
pub struct DiscoveryPublisher<'a, T: Transport + ?Sized> {
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> DiscoveryPublisher<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Publish every descriptor as a (config, state) pair
    ///
    /// Returns the number of sensors published.
    pub async fn publish(
        &self,
        device: &DeviceIdentity,
        sensor_set: &str,
        descriptors: &[SensorDescriptor],
    ) -> Result<usize, PublishError> {
        for descriptor in descriptors {
            let config_topic = TopicBuilder::build_config_topic(sensor_set, descriptor.key);
            let config = DiscoveryConfig::for_sensor(device, sensor_set, descriptor);
            let config_payload = serde_json::to_vec(&config).map_err(|e| PublishError {
                topic: config_topic.clone(),
                source: Box::new(e),
            })?;
            self.send(&config_topic, config_payload).await?;

            let state_payload = descriptor.value.to_string().into_bytes();
            self.send(&config.state_topic, state_payload).await?;

            debug!(
                sensor = descriptor.key,
                value = %descriptor.value,
                "Published sensor"
            );
        }

        Ok(descriptors.len())
    }

    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), PublishError> {
        self.transport
            .publish(topic, payload, true)
            .await
            .map_err(|e| PublishError {
                topic: topic.to_string(),
                source: Box::new(e),
            })
    }
}
