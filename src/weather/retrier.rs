//! Station fallback with bounded per-station retries
//!
//! Stations are tried strictly in configured order. Each station gets its full
//! attempt budget, with a fixed delay between attempts, before the next station
//! is tried. The first observation wins.

use super::{FetchError, Observation, WeatherSource};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Delay between two attempts against the same station
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Successful resolution of one cycle's observation
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub station_id: String,
    /// 1-based attempt number that succeeded for this station
    pub attempt: u32,
    pub observation: Observation,
}

/// Outcome for one station that used up its attempt budget
#[derive(Debug, Clone, PartialEq)]
pub struct StationFailure {
    pub station_id: String,
    pub attempts: u32,
    pub last_error: FetchError,
}

impl fmt::Display for StationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} attempts, last error: {})",
            self.station_id, self.attempts, self.last_error
        )
    }
}

/// Every configured station exhausted its attempt budget
#[derive(Debug, Clone, Error, PartialEq)]
#[error("All stations exhausted without a successful fetch: {}", format_failures(.failures))]
pub struct TerminalFetchFailure {
    pub failures: Vec<StationFailure>,
}

fn format_failures(failures: &[StationFailure]) -> String {
    if failures.is_empty() {
        return "no stations configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Retry and fallback policy
#[derive(Debug, Clone)]
pub struct StationRetrier {
    max_retries: u32,
    retry_delay: Duration,
}

impl StationRetrier {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Resolve one observation, trying stations in order
    pub async fn resolve<S>(
        &self,
        source: &S,
        station_ids: &[String],
    ) -> Result<Resolved, TerminalFetchFailure>
    where
        S: WeatherSource + ?Sized,
    {
        let mut failures = Vec::with_capacity(station_ids.len());

        for station_id in station_ids {
            match self.try_station(source, station_id).await {
                Ok(resolved) => return Ok(resolved),
                Err(failure) => {
                    warn!(
                        station_id = %failure.station_id,
                        attempts = failure.attempts,
                        error = %failure.last_error,
                        "Station exhausted its retry budget, falling back"
                    );
                    failures.push(failure);
                }
            }
        }

        Err(TerminalFetchFailure { failures })
    }

    async fn try_station<S>(&self, source: &S, station_id: &str) -> Result<Resolved, StationFailure>
    where
        S: WeatherSource + ?Sized,
    {
        let mut attempt = 1;
        loop {
            match source.fetch(station_id).await {
                Ok(observation) => {
                    info!(station_id, attempt, "Fetched observation");
                    return Ok(Resolved {
                        station_id: station_id.to_string(),
                        attempt,
                        observation,
                    });
                }
                Err(error) if attempt < self.max_retries => {
                    warn!(
                        station_id,
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "Fetch failed, retrying after {:?}",
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(StationFailure {
                        station_id: station_id.to_string(),
                        attempts: attempt,
                        last_error: error,
                    });
                }
            }
        }
    }
}
