//! Combines the counter reads and the resolved CPU temperature into samples.

use crate::core::{CounterProvider, Sample};
use crate::sensors::TemperatureResolver;
use chrono::Local;
use tracing::trace;

pub struct MetricSampler {
    counters: Box<dyn CounterProvider>,
    resolver: TemperatureResolver,
}

impl MetricSampler {
    pub fn new(counters: Box<dyn CounterProvider>, resolver: TemperatureResolver) -> Self {
        Self { counters, resolver }
    }

    pub fn resolver(&self) -> &TemperatureResolver {
        &self.resolver
    }

    /// Takes one sample. The CPU read is cheap and the GPU query is
    /// time-boxed; resolving the CPU temperature may take seconds when
    /// sources time out.
    pub async fn sample(&mut self) -> Sample {
        let timestamp = Local::now();
        let cpu_usage_percent = self.counters.cpu_usage_percent();
        let gpu = self.counters.gpu_info().await;
        let resolution = self.resolver.resolve(cpu_usage_percent).await;

        metrics::counter!("samples_total").increment(1);
        trace!(
            cpu_usage_percent,
            cpu_temp = resolution.temperature.celsius(),
            source = %resolution.source,
            "Sample taken"
        );

        Sample {
            timestamp,
            cpu_usage_percent,
            cpu_temp_celsius: resolution.temperature.celsius(),
            gpu_usage_percent: gpu.usage_percent,
            gpu_temp_celsius: gpu.temperature_celsius,
            cpu_temp_source: resolution.source,
        }
    }
}
