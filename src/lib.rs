/// ThermWatch - CPU/GPU utilization and temperature monitor
///
/// This library provides the sensor fallback chain, the performance counters,
/// the sampling loop and the console/CSV output used by the `thermwatch`
/// binary.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod counters;
pub mod poll;
pub mod sampler;
pub mod sensors;
pub mod sink;

// Re-export core types for convenience
pub use core::*;
