//! Core domain types and service traits for ThermWatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use crate::sensors::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Lower bound (exclusive) of a plausible CPU temperature reading.
pub const MIN_VALID_CELSIUS: f64 = 0.0;
/// Upper bound (exclusive) of a plausible CPU temperature reading.
pub const MAX_VALID_CELSIUS: f64 = 120.0;

/// A validated Celsius temperature.
///
/// The only way to build one from a sensor value is [`Temperature::new`],
/// which rejects anything outside `(0, 120)`, including zero and NaN.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
    /// Returns `Some` if `celsius` lies strictly inside the validity range.
    pub fn new(celsius: f64) -> Option<Self> {
        if is_valid_celsius(celsius) {
            Some(Self(celsius))
        } else {
            None
        }
    }

    /// Builds a temperature that did not come from a sensor (the thermal
    /// model). The value is clamped by the caller and is always in range.
    pub(crate) fn estimated(celsius: f64) -> Self {
        Self(celsius)
    }

    pub fn celsius(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°C", self.0)
    }
}

/// Checks the `(0, 120)` exclusive window. NaN fails every comparison.
pub fn is_valid_celsius(celsius: f64) -> bool {
    celsius > MIN_VALID_CELSIUS && celsius < MAX_VALID_CELSIUS
}

/// Usage and temperature of the primary GPU.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpuInfo {
    pub usage_percent: f64,
    pub temperature_celsius: f64,
}

/// One complete snapshot of CPU/GPU usage and temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(rename = "cpuUsage")]
    pub cpu_usage_percent: f64,
    #[serde(rename = "cpuTemp")]
    pub cpu_temp_celsius: f64,
    #[serde(rename = "gpuUsage")]
    pub gpu_usage_percent: f64,
    #[serde(rename = "gpuTemp")]
    pub gpu_temp_celsius: f64,
    /// Name of the sensor source that produced `cpu_temp_celsius`.
    pub cpu_temp_source: String,
}

/// RFC 3339 local time with millisecond precision, as written to every output.
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn serialize_timestamp<S: Serializer>(timestamp: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(timestamp))
}

// =============================================================================
// Service Traits
// =============================================================================

/// A single strategy for obtaining a CPU temperature reading.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// A short, stable name used for logging, metrics and attribution.
    fn name(&self) -> &str;

    /// The execution budget the resolver grants this source.
    fn timeout(&self) -> Duration;

    /// Tries to produce a reading within `budget`.
    ///
    /// # Returns
    /// * `Ok(Temperature)` only for a parsed value inside the validity range
    /// * `Err` for process failures, timeouts, unparseable output or
    ///   out-of-range values
    async fn attempt(&self, budget: Duration) -> Result<Temperature, SourceError>;
}

/// Runs an external program and captures its standard output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args`, killing it if it outlives `timeout`.
    ///
    /// Standard error is logged, never returned. A non-zero exit status is an
    /// error.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<String, SourceError>;
}

/// The OS-counter collaborator: a cheap synchronous CPU usage read from an
/// already-initialized handle, and a time-boxed GPU query.
#[async_trait]
pub trait CounterProvider: Send {
    /// Total CPU utilization across all cores, `0..=100`.
    fn cpu_usage_percent(&mut self) -> f64;

    /// Usage and temperature of the primary GPU. Zeros if unavailable.
    async fn gpu_info(&mut self) -> GpuInfo;
}
