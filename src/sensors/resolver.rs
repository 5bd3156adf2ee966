//! The priority-ordered fallback chain for CPU temperature.

use crate::core::{SensorSource, Temperature};
use crate::sensors::simulated::{ThermalModel, SIMULATED_SOURCE_NAME};
use crate::sensors::SourceError;
use std::time::Instant;
use tracing::{debug, instrument};

/// The outcome of one [`TemperatureResolver::resolve`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub temperature: Temperature,
    /// Name of the source that produced the value, or `"simulated"`.
    pub source: String,
}

impl Resolution {
    pub fn is_simulated(&self) -> bool {
        self.source == SIMULATED_SOURCE_NAME
    }
}

/// Tries each sensor source in order and returns the first valid reading.
///
/// Sources run strictly one after another, each inside its own timeout, so
/// a full miss costs at most the sum of all budgets. Failures of any kind
/// are logged and skipped. When every source misses, the thermal model
/// produces an estimate from the current CPU usage, so resolution never
/// fails.
pub struct TemperatureResolver {
    sources: Vec<Box<dyn SensorSource>>,
    model: ThermalModel,
}

impl TemperatureResolver {
    pub fn new(sources: Vec<Box<dyn SensorSource>>, model: ThermalModel) -> Self {
        Self { sources, model }
    }

    /// Names of the configured sources, in priority order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, cpu_usage_percent: f64) -> Resolution {
        let start = Instant::now();

        for source in &self.sources {
            let name = source.name();
            let budget = source.timeout();
            let outcome = match tokio::time::timeout(budget, source.attempt(budget)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Timeout(budget)),
            };

            match outcome {
                Ok(temperature) => {
                    debug!(source = name, celsius = temperature.celsius(), "Sensor source succeeded");
                    metrics::counter!("sensor_attempts_total", "source" => name.to_string(), "outcome" => "success")
                        .increment(1);
                    metrics::histogram!("temperature_resolve_duration_seconds")
                        .record(start.elapsed().as_secs_f64());
                    return Resolution {
                        temperature,
                        source: name.to_string(),
                    };
                }
                Err(e) => {
                    debug!(source = name, error = %e, "Sensor source missed, trying next");
                    metrics::counter!("sensor_attempts_total", "source" => name.to_string(), "outcome" => outcome_label(&e))
                        .increment(1);
                }
            }
        }

        let temperature = self.model.estimate(cpu_usage_percent);
        debug!(
            cpu_usage_percent,
            celsius = temperature.celsius(),
            "All sensor sources missed, using thermal model"
        );
        metrics::counter!("sensor_fallback_total").increment(1);
        metrics::histogram!("temperature_resolve_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        Resolution {
            temperature,
            source: SIMULATED_SOURCE_NAME.to_string(),
        }
    }
}

fn outcome_label(error: &SourceError) -> &'static str {
    match error {
        SourceError::Timeout(_) => "timeout",
        SourceError::OutOfRange(_) => "out_of_range",
        SourceError::NotFound => "not_found",
        SourceError::Parse(_) => "parse_error",
        SourceError::Io { .. } | SourceError::Failed { .. } => "unavailable",
    }
}
