//! Broker transport
//!
//! The core sees the broker through two seams: the [`Transport`] trait for
//! writes, and a channel of [`BrokerEvent`]s for connection lifecycle. The
//! MQTT implementation lives in [`mqtt`].

use thiserror::Error;

pub mod mqtt;

/// Write side of the broker connection
///
/// Publishes are fire-and-forget: a successful return means the message was
/// handed to the client, not that the broker acknowledged it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish a payload to the given topic
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool)
        -> Result<(), Self::Error>;
}

/// Connection lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    /// Broker accepted the connection
    Connected,
    /// Broker ended the session
    Closed(String),
    /// Network connection to the broker was lost
    Offline(String),
    /// Protocol, TLS or authentication failure
    Error(String),
}

impl BrokerEvent {
    /// Lifecycle error for events that end the process, `None` for `Connected`
    pub fn into_terminal(self) -> Option<BrokerLifecycleError> {
        match self {
            BrokerEvent::Connected => None,
            BrokerEvent::Closed(reason) => Some(BrokerLifecycleError::Closed(reason)),
            BrokerEvent::Offline(reason) => Some(BrokerLifecycleError::Offline(reason)),
            BrokerEvent::Error(reason) => Some(BrokerLifecycleError::Error(reason)),
        }
    }
}

/// Fatal broker condition; there is no reconnection
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BrokerLifecycleError {
    #[error("Broker connection closed: {0}")]
    Closed(String),
    #[error("Broker offline: {0}")]
    Offline(String),
    #[error("Broker protocol error: {0}")]
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_is_not_terminal() {
        assert_eq!(BrokerEvent::Connected.into_terminal(), None);
    }

    #[test]
    fn test_lifecycle_events_are_terminal() {
        assert_eq!(
            BrokerEvent::Closed("bye".to_string()).into_terminal(),
            Some(BrokerLifecycleError::Closed("bye".to_string()))
        );
        assert_eq!(
            BrokerEvent::Offline("reset".to_string()).into_terminal(),
            Some(BrokerLifecycleError::Offline("reset".to_string()))
        );
        assert_eq!(
            BrokerEvent::Error("refused".to_string()).into_terminal(),
            Some(BrokerLifecycleError::Error("refused".to_string()))
        );
    }
}
