//! Pure connection configuration for the MQTT client
//!
//! This module contains pure functions that turn the broker section of the
//! configuration into rumqttc options.

use crate::config::MqttSection;
use rumqttc::v5::MqttOptions;
use rumqttc::Transport as RumqttcTransport;
use std::time::Duration;
use thiserror::Error;

/// Keep-alive interval negotiated with the broker
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Capacity of the client request channel
pub const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid broker configuration: {0}")]
    InvalidConfig(String),
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Disconnect failed")]
    DisconnectFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Event loop already started")]
    AlreadyStarted,
}

/// Pure function to configure MQTT options from config
pub fn configure_mqtt_options(config: &MqttSection) -> Result<MqttOptions, MqttError> {
    if config.host.trim().is_empty() {
        return Err(MqttError::InvalidConfig("broker host is empty".to_string()));
    }
    if config.client_id.trim().is_empty() {
        return Err(MqttError::InvalidConfig("client id is empty".to_string()));
    }

    let mut mqtt_options = MqttOptions::new(&config.client_id, &config.host, config.port);

    if config.tls {
        mqtt_options.set_transport(RumqttcTransport::tls_with_default_config());
    }

    if let Some(username) = &config.username {
        let password = config.password.clone().unwrap_or_default();
        mqtt_options.set_credentials(username, &password);
    }

    mqtt_options.set_keep_alive(KEEP_ALIVE);

    Ok(mqtt_options)
}
