//! MQTT transport implementation
//!
//! Split into pure option building and event routing, plus the impure
//! client that drives the rumqttc event loop.

pub mod client;
pub mod connection;
pub mod message_handler;

pub use client::MqttClient;
pub use connection::{configure_mqtt_options, MqttError, KEEP_ALIVE};
pub use message_handler::{EventRoute, MessageHandler};
