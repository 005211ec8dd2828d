//! Integration tests for the Weather Underground client
//!
//! Tests behavioral contracts against a local mock server:
//! - provider-mandated headers and query parameters
//! - status handling, including the 204 "station offline" answer
//! - decode failures and empty observation lists
//! - credentials never leaking into error text

use pws2mqtt::weather::{FetchError, WeatherSource, WundergroundClient, WundergroundConfig};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OBSERVATIONS_PATH: &str = "/v2/pws/observations/current";

fn test_config(base_uri: &str) -> WundergroundConfig {
    WundergroundConfig {
        api_key: "test-api-key".to_string(),
        base_url: format!("{base_uri}{OBSERVATIONS_PATH}"),
        timeout: Duration::from_secs(5),
    }
}

fn observation_body() -> serde_json::Value {
    serde_json::json!({
        "observations": [
            {
                "stationID": "KTEST1",
                "obsTimeUtc": "2024-01-01T12:00:00Z",
                "obsTimeLocal": "2024-01-01 13:00:00",
                "solarRadiation": 120.5,
                "winddir": 270,
                "humidity": 55,
                "metric": {
                    "temp": 18.2,
                    "heatIndex": 18.2,
                    "dewpt": 9.1,
                    "windChill": 18.2,
                    "windSpeed": 11.3,
                    "windGust": 17.7,
                    "pressure": 1013.2,
                    "precipRate": 0.0,
                    "precipTotal": 1.4,
                    "elev": 42.0
                }
            }
        ]
    })
}

#[tokio::test]
async fn test_fetch_sends_provider_headers_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(OBSERVATIONS_PATH))
        .and(query_param("apiKey", "test-api-key"))
        .and(query_param("stationId", "KTEST1"))
        .and(query_param("numericPrecision", "decimal"))
        .and(query_param("format", "json"))
        .and(query_param("units", "m"))
        .and(header("origin", "https://www.wunderground.com"))
        .and(header("referer", "https://www.wunderground.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();
    let observation = client.fetch("KTEST1").await.unwrap();

    assert_eq!(observation.station_id.as_deref(), Some("KTEST1"));
    assert_eq!(observation.humidity, Some(55.0));
    assert_eq!(observation.winddir, Some(270.0));
    let metric = observation.metric.unwrap();
    assert_eq!(metric.temp, Some(18.2));
    assert_eq!(metric.pressure, Some(1013.2));
}

#[tokio::test]
async fn test_fetch_sends_browser_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(observation_body()))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();
    client.fetch("KTEST1").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let user_agent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(user_agent.starts_with("Mozilla/5.0"));
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();
    let result = client.fetch("KTEST1").await;

    assert_eq!(result, Err(FetchError::Status { status: 500 }));
}

#[tokio::test]
async fn test_unauthorized_maps_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();

    assert_eq!(
        client.fetch("KTEST1").await,
        Err(FetchError::Status { status: 401 })
    );
}

#[tokio::test]
async fn test_no_content_means_station_offline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();

    assert_eq!(client.fetch("KTEST1").await, Err(FetchError::NoContent));
}

#[tokio::test]
async fn test_empty_observation_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "observations": [] })),
        )
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();

    assert_eq!(client.fetch("KTEST1").await, Err(FetchError::NoObservations));
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();

    assert!(matches!(
        client.fetch("KTEST1").await,
        Err(FetchError::Decode(_))
    ));
}

#[tokio::test]
async fn test_null_fields_decode_as_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "observations": [
                {
                    "stationID": "KTEST1",
                    "humidity": 55,
                    "solarRadiation": null,
                    "metric": { "temp": 18.2, "pressure": null }
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = WundergroundClient::new(test_config(&mock_server.uri())).unwrap();
    let observation = client.fetch("KTEST1").await.unwrap();

    assert_eq!(observation.solar_radiation, None);
    assert_eq!(observation.metric.unwrap().pressure, None);
}

#[tokio::test]
async fn test_timeout_error_does_not_leak_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(observation_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.timeout = Duration::from_millis(100);
    let client = WundergroundClient::new(config).unwrap();

    match client.fetch("KTEST1").await {
        Err(FetchError::Transport(message)) => {
            assert!(!message.contains("test-api-key"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}
