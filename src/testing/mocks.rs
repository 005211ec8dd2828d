//! Mock implementations for testing
//!
//! Provides a mock [`Transport`] and a scripted [`WeatherSource`] so the
//! publish cycle can be exercised without a broker or network access.

use crate::transport::Transport;
use crate::weather::{FetchError, Observation, WeatherSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// A message captured by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

impl PublishedMessage {
    /// Payload as UTF-8 text, lossy
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Error returned by a failing [`MockTransport`]
#[derive(Debug, Error)]
#[error("Mock publish failure")]
pub struct MockTransportError;

/// Mock transport for testing
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    pub published_messages: Arc<Mutex<Vec<PublishedMessage>>>,
    pub should_fail: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub async fn get_published_messages(&self) -> Vec<PublishedMessage> {
        self.published_messages.lock().await.clone()
    }

    /// Messages published to a single topic, oldest first
    pub async fn messages_for(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published_messages
            .lock()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub async fn clear_history(&self) {
        self.published_messages.lock().await.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Error = MockTransportError;

    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<(), Self::Error> {
        if self.should_fail {
            return Err(MockTransportError);
        }

        self.published_messages.lock().await.push(PublishedMessage {
            topic: topic.to_string(),
            payload,
            retain,
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum StationScript {
    AlwaysFail(FetchError),
    SucceedOnAttempt(u32, Observation),
}

/// Weather source with per-station scripted outcomes
///
/// Stations without a script answer with HTTP 404. A station scripted with
/// `succeed_on_attempt` fails with HTTP 503 until the given attempt.
#[derive(Debug, Default, Clone)]
pub struct MockWeatherSource {
    scripts: HashMap<String, StationScript>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockWeatherSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_fail(mut self, station_id: &str, error: FetchError) -> Self {
        self.scripts
            .insert(station_id.to_string(), StationScript::AlwaysFail(error));
        self
    }

    pub fn succeed_on_attempt(mut self, station_id: &str, attempt: u32, observation: Observation) -> Self {
        self.scripts.insert(
            station_id.to_string(),
            StationScript::SucceedOnAttempt(attempt, observation),
        );
        self
    }

    /// Station ids in the order they were fetched
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn fetch(&self, station_id: &str) -> Result<Observation, FetchError> {
        self.calls.lock().await.push(station_id.to_string());

        let attempt = {
            let mut attempts = self.attempts.lock().await;
            let count = attempts.entry(station_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.scripts.get(station_id) {
            Some(StationScript::AlwaysFail(error)) => Err(error.clone()),
            Some(StationScript::SucceedOnAttempt(target, observation)) if attempt >= *target => {
                Ok(observation.clone())
            }
            Some(StationScript::SucceedOnAttempt(..)) => Err(FetchError::Status { status: 503 }),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}
