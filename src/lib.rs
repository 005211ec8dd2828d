//! pws2mqtt - Weather Underground to Home Assistant bridge
//!
//! Polls a Weather Underground personal weather station on a schedule and
//! publishes every available metric to an MQTT broker using the Home
//! Assistant discovery convention: one retained config topic and one
//! retained state topic per sensor.
//!
//! # Overview
//!
//! - [`weather`]: HTTP client for the current-observation endpoint and the
//!   station fallback retrier
//! - [`sensors`]: mapping of an observation into ordered sensor descriptors
//! - [`discovery`]: topics, config payloads and the publisher
//! - [`transport`]: broker seam and the rumqttc implementation
//! - [`scheduler`]: connect-wait, immediate first cycle, then interval or
//!   one-shot
//!
//! # Quick Start
//!
//! ```rust
//! use pws2mqtt::sensors::map_observation;
//! use pws2mqtt::weather::{MetricGroup, Observation};
//!
//! let observation = Observation {
//!     humidity: Some(55.0),
//!     metric: Some(MetricGroup {
//!         temp: Some(18.2),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//!
//! let keys: Vec<_> = map_observation(&observation).iter().map(|d| d.key).collect();
//! assert_eq!(keys, vec!["humidity", "temperature"]);
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod observability;
pub mod scheduler;
pub mod sensors;
pub mod testing;
pub mod transport;
pub mod weather;

pub use config::{Config, ConfigError, PollMode};
pub use error::{AppError, AppResult};
pub use scheduler::{CycleReport, Scheduler, SchedulerState};
pub use transport::mqtt::MqttClient;
