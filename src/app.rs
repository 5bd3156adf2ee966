//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{CommandRunner, CounterProvider, SensorSource},
    counters::{CounterInitError, NvidiaSmiGpu, SysinfoCounters},
    poll::{PollLoop, PollMode, PollState},
    sampler::MetricSampler,
    sensors::{
        wmi::WMI_CLASSES, BridgeSource, ShellCimSource, TemperatureResolver, TokioCommandRunner,
        WmiSource,
    },
    sink::{CsvLog, MetricSink, SinkOptions},
};
use anyhow::Result;
use chrono::Local;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument};

/// A fully wired monitor, ready to run.
pub struct App {
    poll: PollLoop,
    log_path: Option<std::path::PathBuf>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Where samples are being logged, if logging is active.
    pub fn log_path(&self) -> Option<&std::path::Path> {
        self.log_path.as_deref()
    }

    /// Runs the poll loop until it stops, then hands back the final state.
    pub async fn run(mut self, shutdown_rx: watch::Receiver<bool>) -> Result<AppReport> {
        self.poll.run(shutdown_rx).await;
        info!("Monitor stopped.");
        Ok(AppReport {
            state: self.poll.state(),
            cycles: self.poll.cycles(),
            samples_buffered: self.poll.sink().history().len(),
        })
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppReport {
    pub state: PollState,
    pub cycles: u64,
    pub samples_buffered: usize,
}

/// Builder for the main application.
///
/// Every external dependency can be swapped out, so tests can drive the
/// whole pipeline without real counters, sensors or a terminal.
pub struct AppBuilder {
    config: Config,
    counters_override: Option<Box<dyn CounterProvider>>,
    sources_override: Option<Vec<Box<dyn SensorSource>>>,
    runner_override: Option<Arc<dyn CommandRunner>>,
    output_override: Option<Box<dyn Write + Send>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            counters_override: None,
            sources_override: None,
            runner_override: None,
            output_override: None,
        }
    }

    /// Overrides the performance counters for testing.
    pub fn counters_override(mut self, counters: Box<dyn CounterProvider>) -> Self {
        self.counters_override = Some(counters);
        self
    }

    /// Replaces the whole sensor chain for testing.
    pub fn sources_override(mut self, sources: Vec<Box<dyn SensorSource>>) -> Self {
        self.sources_override = Some(sources);
        self
    }

    /// Overrides the command runner used by the default sensor chain and the GPU query.
    pub fn runner_override(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner_override = Some(runner);
        self
    }

    /// Overrides the console writer for testing.
    pub fn output_override(mut self, out: Box<dyn Write + Send>) -> Self {
        self.output_override = Some(out);
        self
    }

    /// Builds and initializes all application components, returning a runnable `App`.
    ///
    /// Fails only if the performance counters cannot be opened.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<App> {
        let config = self.config;
        let runner = self
            .runner_override
            .unwrap_or_else(|| Arc::new(TokioCommandRunner::new()));

        // =========================================================================
        // 1. Performance counters
        // =========================================================================
        let counters: Box<dyn CounterProvider> = match self.counters_override {
            Some(counters) => counters,
            None => {
                let gpu = NvidiaSmiGpu::new(runner.clone());
                let opened = tokio::task::spawn_blocking(move || SysinfoCounters::open(gpu))
                    .await
                    .map_err(|e| CounterInitError::Join(e.to_string()))??;
                Box::new(opened)
            }
        };

        // =========================================================================
        // 2. Sensor chain, in priority order
        // =========================================================================
        let sources = match self.sources_override {
            Some(sources) => sources,
            None => default_sources(&config, runner)?,
        };
        let resolver = TemperatureResolver::new(sources, config.sensors.thermal_model.clone());
        info!("Sensor chain: {}", resolver.source_names().join(" -> "));
        let sampler = MetricSampler::new(counters, resolver);

        // =========================================================================
        // 3. Sink
        // =========================================================================
        let started_at = Local::now();
        let log = if config.output.log_enabled {
            match CsvLog::create(&config.output.log_dir, started_at) {
                Ok(log) => Some(log),
                Err(e) => {
                    error!(
                        "Could not open log file in {}: {}. Continuing without logging.",
                        config.output.log_dir.display(),
                        e
                    );
                    None
                }
            }
        } else {
            None
        };
        let log_path = log.as_ref().map(|l| l.path().to_path_buf());

        let options = SinkOptions {
            format: config.output.format,
            history_capacity: config.output.history_capacity,
            trend_window: config.output.trend_window,
            refresh_interval: config.refresh_interval(),
        };
        let out = self
            .output_override
            .unwrap_or_else(|| Box::new(std::io::stdout()));
        let sink = MetricSink::new(options, out, log).with_started_at(started_at);

        // =========================================================================
        // 4. Poll loop
        // =========================================================================
        let mode = if config.poll.quick_test {
            PollMode::Diagnostic
        } else {
            PollMode::continuous(config.poll_interval())
        };

        Ok(App {
            poll: PollLoop::new(sampler, sink, mode),
            log_path,
        })
    }
}

/// Bridge, the three WMI classes, then the shell query.
fn default_sources(
    config: &Config,
    runner: Arc<dyn CommandRunner>,
) -> Result<Vec<Box<dyn SensorSource>>> {
    let sensors = &config.sensors;
    let mut sources: Vec<Box<dyn SensorSource>> = Vec::with_capacity(5);
    sources.push(Box::new(BridgeSource::new(
        sensors.bridge_path.clone(),
        Duration::from_millis(sensors.bridge_timeout_ms),
        runner.clone(),
    )));
    for class in WMI_CLASSES {
        sources.push(Box::new(WmiSource::new(
            class,
            Duration::from_millis(sensors.wmi_timeout_ms),
            runner.clone(),
        )));
    }
    sources.push(Box::new(ShellCimSource::new(
        Duration::from_millis(sensors.shell_timeout_ms),
        runner,
    )?));
    Ok(sources)
}
