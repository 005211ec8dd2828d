//! End-to-end publish cycle tests
//!
//! Drives the scheduler with the in-crate mocks and checks what reaches the
//! broker: topic order, retained flags, discovery payloads and exit codes.

use pws2mqtt::config::Config;
use pws2mqtt::error::exit_codes;
use pws2mqtt::scheduler::Scheduler;
use pws2mqtt::testing::{MockTransport, MockWeatherSource};
use pws2mqtt::transport::BrokerEvent;
use pws2mqtt::weather::{FetchError, MetricGroup, Observation, StationRetrier};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

fn one_shot_config(stations: &str, max_retries: &str) -> Config {
    let env = HashMap::from([
        ("SENSOR_SET_NAME", "backyard".to_string()),
        ("WU_API_KEY", "test-api-key".to_string()),
        ("WU_STATION_IDS", stations.to_string()),
        ("WU_MAX_RETRIES", max_retries.to_string()),
        ("MQTT_HOST", "localhost".to_string()),
        ("MQTT_PORT", "1883".to_string()),
        ("POLL_INTERVAL", "once".to_string()),
    ]);
    Config::from_lookup(|key| env.get(key).cloned()).unwrap()
}

fn humidity_and_temperature() -> Observation {
    Observation {
        humidity: Some(55.0),
        metric: Some(MetricGroup {
            temp: Some(18.2),
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn connected() -> (mpsc::Sender<BrokerEvent>, mpsc::Receiver<BrokerEvent>) {
    let (tx, rx) = mpsc::channel(4);
    tx.send(BrokerEvent::Connected).await.unwrap();
    (tx, rx)
}

#[tokio::test]
async fn test_humidity_and_temperature_publish_four_retained_messages() {
    let config = one_shot_config("KTEST1", "5");
    let source = MockWeatherSource::new().succeed_on_attempt("KTEST1", 1, humidity_and_temperature());
    let transport = MockTransport::new();
    let (_tx, rx) = connected().await;

    Scheduler::new(&config, &source, &transport)
        .run(rx)
        .await
        .unwrap();

    let messages = transport.get_published_messages().await;
    let topics: Vec<&str> = messages.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "homeassistant/sensor/backyard/humidity/config",
            "homeassistant/sensor/backyard/humidity/state",
            "homeassistant/sensor/backyard/temperature/config",
            "homeassistant/sensor/backyard/temperature/state",
        ]
    );
    assert!(messages.iter().all(|m| m.retain));

    let config_payload: Value = serde_json::from_slice(&messages[2].payload).unwrap();
    assert_eq!(config_payload["name"], "backyard Temperature");
    assert_eq!(config_payload["unique_id"], "backyard_temperature");
    assert_eq!(
        config_payload["state_topic"],
        "homeassistant/sensor/backyard/temperature/state"
    );
    assert_eq!(config_payload["device"]["identifiers"][0], "backyard");
    assert_eq!(config_payload["device"]["manufacturer"], "Weather Underground");

    assert_eq!(messages[1].payload_str(), "55");
    assert_eq!(messages[3].payload_str(), "18.2");
}

#[tokio::test(start_paused = true)]
async fn test_fallback_after_station_exhausts_retries() {
    let config = one_shot_config("A,B", "2");
    let source = MockWeatherSource::new()
        .always_fail("A", FetchError::Status { status: 500 })
        .succeed_on_attempt("B", 1, humidity_and_temperature());
    let transport = MockTransport::new();
    let (_tx, rx) = connected().await;

    Scheduler::new(&config, &source, &transport)
        .run(rx)
        .await
        .unwrap();

    assert_eq!(source.calls().await, vec!["A", "A", "B"]);
    assert_eq!(transport.get_published_messages().await.len(), 4);
}

#[tokio::test]
async fn test_null_pressure_publishes_no_pressure_topics() {
    let config = one_shot_config("KTEST1", "1");
    let observation = Observation {
        metric: Some(MetricGroup {
            temp: Some(18.2),
            pressure: None,
            ..Default::default()
        }),
        ..Default::default()
    };
    let source = MockWeatherSource::new().succeed_on_attempt("KTEST1", 1, observation);
    let transport = MockTransport::new();
    let (_tx, rx) = connected().await;

    Scheduler::new(&config, &source, &transport)
        .run(rx)
        .await
        .unwrap();

    let messages = transport.get_published_messages().await;
    assert!(!messages.iter().any(|m| m.topic.contains("/pressure/")));
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_all_stations_exhausted_exits_7_without_publishing() {
    let config = one_shot_config("A,B", "2");
    let source = MockWeatherSource::new()
        .always_fail("A", FetchError::NoContent)
        .always_fail("B", FetchError::NoObservations);
    let transport = MockTransport::new();
    let (_tx, rx) = connected().await;

    let error = Scheduler::new(&config, &source, &transport)
        .with_retrier(StationRetrier::new(2).with_retry_delay(Duration::ZERO))
        .run(rx)
        .await
        .unwrap_err();

    assert_eq!(error.exit_code(), exit_codes::STATIONS_EXHAUSTED);
    assert_eq!(source.calls().await, vec!["A", "A", "B", "B"]);
    assert!(transport.get_published_messages().await.is_empty());
}

#[tokio::test]
async fn test_broker_offline_before_connect_exits_5_without_fetching() {
    let config = one_shot_config("KTEST1", "5");
    let source = MockWeatherSource::new().succeed_on_attempt("KTEST1", 1, humidity_and_temperature());
    let transport = MockTransport::new();
    let (tx, rx) = mpsc::channel(1);
    tx.send(BrokerEvent::Offline("connection refused".to_string()))
        .await
        .unwrap();

    let error = Scheduler::new(&config, &source, &transport)
        .run(rx)
        .await
        .unwrap_err();

    assert_eq!(error.exit_code(), exit_codes::BROKER_CLOSED);
    assert!(source.calls().await.is_empty());
    assert!(transport.get_published_messages().await.is_empty());
}

#[tokio::test]
async fn test_consecutive_cycles_republish_retained_state() {
    let config = one_shot_config("KTEST1", "1");
    let source = MockWeatherSource::new().succeed_on_attempt("KTEST1", 1, humidity_and_temperature());
    let transport = MockTransport::new();
    let scheduler = Scheduler::new(&config, &source, &transport);

    scheduler.run_cycle().await.unwrap();
    scheduler.run_cycle().await.unwrap();

    let state = transport
        .messages_for("homeassistant/sensor/backyard/humidity/state")
        .await;
    assert_eq!(state.len(), 2);
    assert!(state.iter().all(|m| m.retain && m.payload_str() == "55"));
}
