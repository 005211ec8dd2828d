//! Sensor descriptors derived from observations

pub mod mapper;

pub use mapper::{map_observation, MetricSpec, SensorDescriptor, SensorValue, METRIC_TABLE};
