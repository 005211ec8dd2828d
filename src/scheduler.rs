//! Publish cycle scheduling
//!
//! The scheduler waits for the broker to accept the connection, runs one
//! cycle immediately, then either stops (one-shot) or repeats on a fixed
//! interval. Cycles run inline, so two cycles never overlap; ticks missed
//! while a cycle overruns are skipped. Any `Closed`, `Offline` or `Error`
//! broker event ends the run, including in the middle of a cycle.

use crate::config::{Config, PollMode};
use crate::cycle_span;
use crate::discovery::{DeviceIdentity, DiscoveryPublisher};
use crate::error::AppError;
use crate::sensors::map_observation;
use crate::transport::{BrokerEvent, BrokerLifecycleError, Transport};
use crate::weather::{StationRetrier, WeatherSource};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, Instrument};

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the broker to accept the connection
    Connecting,
    /// Publishing cycles
    Running,
    /// A terminal broker event arrived; the run is over
    Terminated,
}

impl SchedulerState {
    /// Pure state transition for a broker event
    pub fn on_broker_event(self, event: &BrokerEvent) -> SchedulerState {
        match (self, event) {
            (SchedulerState::Terminated, _) => SchedulerState::Terminated,
            (_, BrokerEvent::Connected) => SchedulerState::Running,
            (_, BrokerEvent::Closed(_) | BrokerEvent::Offline(_) | BrokerEvent::Error(_)) => {
                SchedulerState::Terminated
            }
        }
    }
}

/// Summary of one successful publish cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub station_id: String,
    pub attempt: u32,
    pub sensors_published: usize,
    /// Seconds between the observation timestamp and the cycle, when known
    pub observation_age_secs: Option<i64>,
}

/// Drives fetch, map and publish for one sensor set
pub struct Scheduler<'a, S: WeatherSource + ?Sized, T: Transport + ?Sized> {
    source: &'a S,
    transport: &'a T,
    retrier: StationRetrier,
    sensor_set: String,
    station_ids: Vec<String>,
    poll: PollMode,
}

impl<'a, S: WeatherSource + ?Sized, T: Transport + ?Sized> Scheduler<'a, S, T> {
    pub fn new(config: &Config, source: &'a S, transport: &'a T) -> Self {
        Self {
            source,
            transport,
            retrier: StationRetrier::new(config.weather.max_retries),
            sensor_set: config.sensor_set.name.clone(),
            station_ids: config.weather.station_ids.clone(),
            poll: config.schedule.poll,
        }
    }

    pub fn with_retrier(mut self, retrier: StationRetrier) -> Self {
        self.retrier = retrier;
        self
    }

    /// Run one fetch, map and publish cycle
    pub async fn run_cycle(&self) -> Result<CycleReport, AppError> {
        let span = cycle_span!(sensor_set = %self.sensor_set);

        async move {
            let resolved = self.retrier.resolve(self.source, &self.station_ids).await?;
            let observation_age_secs = resolved
                .observation
                .age_at(Utc::now())
                .map(|age| age.num_seconds());

            let descriptors = map_observation(&resolved.observation);
            let device = DeviceIdentity::new(&self.sensor_set);
            let sensors_published = DiscoveryPublisher::new(self.transport)
                .publish(&device, &self.sensor_set, &descriptors)
                .await?;

            info!(
                station_id = %resolved.station_id,
                attempt = resolved.attempt,
                sensors = sensors_published,
                observation_age_secs,
                "Publish cycle complete"
            );

            Ok(CycleReport {
                station_id: resolved.station_id,
                attempt: resolved.attempt,
                sensors_published,
                observation_age_secs,
            })
        }
        .instrument(span)
        .await
    }

    /// Run until one-shot completion or a fatal error
    pub async fn run(&self, mut events: mpsc::Receiver<BrokerEvent>) -> Result<(), AppError> {
        let mut state = SchedulerState::Connecting;

        while state == SchedulerState::Connecting {
            let event = next_event(&mut events).await;
            state = state.on_broker_event(&event);
            if let Some(error) = event.into_terminal() {
                return Err(error.into());
            }
        }

        info!(sensor_set = %self.sensor_set, poll = ?self.poll, "Broker connected, starting publish cycles");

        match self.poll {
            PollMode::Once => {
                tokio::select! {
                    biased;
                    error = next_terminal(&mut events) => Err(error.into()),
                    result = self.run_cycle() => {
                        result?;
                        info!("One-shot cycle finished");
                        Ok(())
                    }
                }
            }
            PollMode::Interval(period) => {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        biased;
                        error = next_terminal(&mut events) => return Err(error.into()),
                        _ = ticker.tick() => {
                            tokio::select! {
                                biased;
                                error = next_terminal(&mut events) => return Err(error.into()),
                                result = self.run_cycle() => { result?; }
                            }
                            debug!(next_in = ?period, "Waiting for next tick");
                        }
                    }
                }
            }
        }
    }
}

/// Next lifecycle event; a dropped event loop counts as a closed connection
async fn next_event(events: &mut mpsc::Receiver<BrokerEvent>) -> BrokerEvent {
    events
        .recv()
        .await
        .unwrap_or_else(|| BrokerEvent::Closed("broker event stream ended".to_string()))
}

/// Wait for the first terminal lifecycle event
async fn next_terminal(events: &mut mpsc::Receiver<BrokerEvent>) -> BrokerLifecycleError {
    loop {
        if let Some(error) = next_event(events).await.into_terminal() {
            return error;
        }
    }
}
