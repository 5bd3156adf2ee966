use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use thermwatch::{
    app::{App, AppBuilder},
    config::{Config, OutputFormat},
    core::{GpuInfo, SensorSource},
    counters::test_utils::FakeCounters,
    sink::test_utils::SharedBuffer,
};

/// Handles a test keeps after the builder takes ownership of the fakes.
pub struct TestHarness {
    pub builder: AppBuilder,
    pub output: SharedBuffer,
    pub counter_reads: Arc<AtomicUsize>,
}

/// A config that renders plain text lines and never touches the disk.
pub fn text_config() -> Config {
    let mut config = Config::default();
    config.output.format = OutputFormat::Text;
    config
}

pub fn default_gpu() -> GpuInfo {
    GpuInfo {
        usage_percent: 12.5,
        temperature_celsius: 48.0,
    }
}

/// Builds an app around fake counters, the given sources and a captured console.
pub fn harness(config: Config, cpu_usage: f64, sources: Vec<Box<dyn SensorSource>>) -> TestHarness {
    let counters = FakeCounters::new(cpu_usage, default_gpu());
    let counter_reads = counters.reads();
    let output = SharedBuffer::new();
    let builder = App::builder(config)
        .counters_override(Box::new(counters))
        .sources_override(sources)
        .output_override(Box::new(output.clone()));
    TestHarness {
        builder,
        output,
        counter_reads,
    }
}
