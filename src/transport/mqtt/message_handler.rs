//! Pure routing of rumqttc events into broker lifecycle events
//!
//! This module contains pure functions that classify MQTT event-loop output
//! so the impure client only has to forward the result.

use crate::transport::BrokerEvent;
use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{ConnectionError, Event, StateError};
use rumqttc::Outgoing;

/// Pure message routing decisions based on MQTT events
pub struct MessageHandler;

impl MessageHandler {
    /// Route MQTT event to appropriate handler (pure routing decision)
    pub fn route_mqtt_event(event: &Event) -> EventRoute {
        match event {
            Event::Incoming(incoming) => match incoming {
                Packet::ConnAck(connack) if connack.code == ConnectReturnCode::Success => {
                    EventRoute::ConnectionAcknowledged
                }
                Packet::ConnAck(connack) => {
                    EventRoute::ConnectionRefused(format!("{:?}", connack.code))
                }
                Packet::Disconnect(disconnect) => {
                    EventRoute::Disconnected(format!("{:?}", disconnect.reason_code))
                }
                other => EventRoute::InfrastructureEvent(format!("{other:?}")),
            },
            Event::Outgoing(Outgoing::Disconnect) => EventRoute::ClientDisconnected,
            Event::Outgoing(_) => EventRoute::OutgoingEvent,
        }
    }

    /// Classify an event-loop error (pure function)
    ///
    /// Lost sockets count as the broker going offline; everything else is a
    /// protocol-level failure.
    pub fn classify_connection_error(error: &ConnectionError) -> BrokerEvent {
        match error {
            ConnectionError::Io(e) => BrokerEvent::Offline(e.to_string()),
            ConnectionError::MqttState(StateError::Io(e)) => BrokerEvent::Offline(e.to_string()),
            ConnectionError::ConnectionRefused(code) => {
                BrokerEvent::Error(format!("Connection refused: {code:?}"))
            }
            ConnectionError::RequestsDone => {
                BrokerEvent::Closed("Client request channel closed".to_string())
            }
            other => BrokerEvent::Error(other.to_string()),
        }
    }

    /// Determine QoS level based on message type (pure function)
    pub fn determine_qos_level(retain: bool) -> QoS {
        match retain {
            true => QoS::AtLeastOnce, // Retained discovery traffic is worth an ack
            false => QoS::AtMostOnce,
        }
    }
}

/// Routing decisions for MQTT events
#[derive(Debug, Clone, PartialEq)]
pub enum EventRoute {
    /// Connection acknowledged - ready to publish
    ConnectionAcknowledged,
    /// Broker answered the handshake with a failure code
    ConnectionRefused(String),
    /// Broker sent DISCONNECT
    Disconnected(String),
    /// Our own DISCONNECT left the client, the event loop is done
    ClientDisconnected,
    /// Infrastructure event (PingResp, PubAck, etc.)
    InfrastructureEvent(String),
    /// Outgoing event (handled automatically)
    OutgoingEvent,
}

impl EventRoute {
    /// Lifecycle event to forward to the scheduler, if any
    pub fn broker_event(&self) -> Option<BrokerEvent> {
        match self {
            EventRoute::ConnectionAcknowledged => Some(BrokerEvent::Connected),
            EventRoute::ConnectionRefused(code) => {
                Some(BrokerEvent::Error(format!("Connection refused: {code}")))
            }
            EventRoute::Disconnected(reason) => Some(BrokerEvent::Closed(reason.clone())),
            EventRoute::ClientDisconnected
            | EventRoute::InfrastructureEvent(_)
            | EventRoute::OutgoingEvent => None,
        }
    }

    /// Whether the event loop should stop polling after this route
    pub fn ends_event_loop(&self) -> bool {
        matches!(
            self,
            EventRoute::ConnectionRefused(_)
                | EventRoute::Disconnected(_)
                | EventRoute::ClientDisconnected
        )
    }
}
