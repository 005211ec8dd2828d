//! Upstream weather data: the HTTP client and the station fallback retrier
//!
//! The rest of the service only sees the [`WeatherSource`] trait, which turns a
//! station identifier into one observation or a [`FetchError`].

pub mod client;
pub mod observation;
pub mod retrier;

pub use client::{WundergroundClient, WundergroundConfig};
pub use observation::{MetricGroup, Observation, ObservationResponse};
pub use retrier::{Resolved, StationFailure, StationRetrier, TerminalFetchFailure};

use thiserror::Error;

/// Failure of a single fetch, recoverable by retry or station fallback
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Upstream returned HTTP {status}")]
    Status { status: u16 },
    #[error("Station returned no content")]
    NoContent,
    #[error("Failed to decode response: {0}")]
    Decode(String),
    #[error("Response contained no observations")]
    NoObservations,
}

/// Source of station observations
///
/// Implementations perform exactly one upstream request per call and never
/// retry; retry policy belongs to [`StationRetrier`].
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, station_id: &str) -> Result<Observation, FetchError>;
}
