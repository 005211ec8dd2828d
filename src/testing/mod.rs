//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the publish cycle
//! without an MQTT broker or the Weather Underground API.

pub mod mocks;

pub use mocks::*;
