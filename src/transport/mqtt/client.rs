//! Impure I/O operations for MQTT client
//!
//! This module owns the rumqttc client and drives its event loop on a
//! background task. Lifecycle changes are forwarded to the caller as
//! [`BrokerEvent`]s; publishing goes through the [`Transport`] impl.

use super::connection::{configure_mqtt_options, MqttError, REQUEST_CHANNEL_CAPACITY};
use super::message_handler::MessageHandler;
use crate::config::MqttSection;
use crate::mqtt_span;
use crate::transport::{BrokerEvent, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::v5::{AsyncClient, EventLoop};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Capacity of the lifecycle event channel handed to the caller
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// How long `disconnect` waits for the event loop to flush and stop
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// MQTT client publishing retained discovery traffic
pub struct MqttClient {
    client: AsyncClient,
    event_loop: Mutex<Option<EventLoop>>,
    broker: String,
    event_loop_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl MqttClient {
    /// Build the client without touching the network
    pub fn new(config: &MqttSection) -> Result<Self, MqttError> {
        let mqtt_options = configure_mqtt_options(config)?;
        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CHANNEL_CAPACITY);

        Ok(MqttClient {
            client,
            event_loop: Mutex::new(Some(event_loop)),
            broker: format!("{}:{}", config.host, config.port),
            event_loop_handle: None,
            shutdown_tx: None,
        })
    }

    /// Start the event loop and return the lifecycle event stream
    ///
    /// rumqttc connects lazily on the first poll, so the first event on the
    /// returned channel is either `Connected` or a terminal failure. The
    /// event loop stops after any terminal event; there is no reconnection.
    pub fn connect(&mut self) -> Result<mpsc::Receiver<BrokerEvent>, MqttError> {
        let mut event_loop = self
            .event_loop
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(MqttError::AlreadyStarted)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let broker = self.broker.clone();

        info!(broker = %broker, "Connecting to MQTT broker");

        let span = mqtt_span!(operation = "event_loop", broker = %broker);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("Shutdown signal received, stopping MQTT event loop");
                            break;
                        }
                    }
                    polled = event_loop.poll() => match polled {
                        Ok(event) => {
                            let route = MessageHandler::route_mqtt_event(&event);
                            if let Some(broker_event) = route.broker_event() {
                                if events_tx.send(broker_event).await.is_err() {
                                    debug!("Event receiver dropped, stopping MQTT event loop");
                                    break;
                                }
                            }
                            if route.ends_event_loop() {
                                debug!(?route, "MQTT event loop finished");
                                break;
                            }
                        }
                        Err(e) => {
                            let broker_event = MessageHandler::classify_connection_error(&e);
                            warn!(broker = %broker, error = %e, "MQTT connection failed");
                            let _ = events_tx.send(broker_event).await;
                            break;
                        }
                    }
                }
            }
        }.instrument(span));

        self.event_loop_handle = Some(handle);
        self.shutdown_tx = Some(shutdown_tx);
        Ok(events_rx)
    }

    /// Send DISCONNECT and wait briefly for the event loop to flush it
    pub async fn disconnect(&mut self) -> Result<(), MqttError> {
        let result = self
            .client
            .disconnect()
            .await
            .map_err(|e| MqttError::DisconnectFailed(Box::new(e)));

        if let Some(handle) = self.event_loop_handle.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => debug!("MQTT event loop shut down gracefully"),
                Ok(Err(e)) if !e.is_cancelled() => {
                    warn!(error = %e, "MQTT event loop ended with error")
                }
                Err(_) => {
                    warn!("MQTT event loop didn't shut down in time, forcing stop");
                    if let Some(shutdown_tx) = &self.shutdown_tx {
                        let _ = shutdown_tx.send(true);
                    }
                }
                _ => {}
            }
        }

        info!("MQTT client disconnected");
        result
    }

    /// Whether the background event loop has been started
    pub fn is_started(&self) -> bool {
        self.event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[async_trait]
impl Transport for MqttClient {
    type Error = MqttError;

    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), MqttError> {
        let qos = MessageHandler::determine_qos_level(retain);
        self.client
            .publish(topic, qos, retain, Bytes::from(payload))
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(true);
        }

        // Can't disconnect asynchronously here; callers wanting a clean
        // DISCONNECT must call `disconnect()` first.
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}
