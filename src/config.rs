//! Configuration management for ThermWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer built-in defaults, an optional `thermwatch.toml` file,
//! `THERMWATCH_` environment variables and command-line flags.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::cli::Cli;
use crate::sensors::ThermalModel;

/// Shortest allowed poll period.
pub const MIN_INTERVAL_MS: u64 = 100;
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_CONFIG_FILE: &str = "thermwatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for diagnostics written to stderr.
    pub log_level: String,
    /// Sampling cadence and mode.
    pub poll: PollConfig,
    /// Console format and CSV logging.
    pub output: OutputConfig,
    /// Sensor source locations and budgets.
    pub sensors: SensorsConfig,
}

/// Configuration for the poll loop.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PollConfig {
    /// Milliseconds between samples. Clamped to at least 100.
    pub interval_ms: u64,
    /// Take exactly one sample and exit.
    pub quick_test: bool,
}

/// The console rendering format.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        };
        f.write_str(name)
    }
}

/// Configuration for output and logging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Append every sample to a CSV file.
    pub log_enabled: bool,
    /// Directory receiving one CSV file per run.
    pub log_dir: PathBuf,
    /// Samples kept in memory for trends and the summary.
    pub history_capacity: usize,
    /// Samples shown in each trend line.
    pub trend_window: usize,
    /// Minimum milliseconds between table redraws. Defaults to the poll
    /// interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_ms: Option<u64>,
}

/// Configuration for the sensor fallback chain.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SensorsConfig {
    /// Path to the privileged sensor bridge executable.
    pub bridge_path: PathBuf,
    pub bridge_timeout_ms: u64,
    /// Budget for each of the three WMI classes.
    pub wmi_timeout_ms: u64,
    pub shell_timeout_ms: u64,
    /// Parameters of the usage-derived fallback estimate.
    pub thermal_model: ThermalModel,
}

impl Config {
    /// Loads the configuration, layering defaults, the TOML file, environment
    /// variables and command-line flags, then normalizes it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&config_path, cli)
    }

    fn load_from(config_path: &Path, cli: &Cli) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g., THERMWATCH_POLL__INTERVAL_MS=500
            .merge(Env::prefixed("THERMWATCH_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config.normalize())
    }

    /// Clamps values that have a hard floor or range.
    pub fn normalize(mut self) -> Self {
        if self.poll.interval_ms < MIN_INTERVAL_MS {
            warn!(
                "Poll interval {}ms is below the minimum, using {}ms",
                self.poll.interval_ms, MIN_INTERVAL_MS
            );
            self.poll.interval_ms = MIN_INTERVAL_MS;
        }
        self.output.history_capacity = self.output.history_capacity.max(1);
        self.output.trend_window = self.output.trend_window.clamp(1, self.output.history_capacity);

        let model = &self.sensors.thermal_model;
        let sane_bounds = model.min_celsius > 0.0
            && model.max_celsius < 120.0
            && model.min_celsius <= model.max_celsius;
        if !sane_bounds {
            warn!("Thermal model bounds must lie inside (0, 120), using defaults");
            self.sensors.thermal_model.min_celsius = ThermalModel::default().min_celsius;
            self.sensors.thermal_model.max_celsius = ThermalModel::default().max_celsius;
        }

        let noise = self.sensors.thermal_model.noise_celsius;
        if !noise.is_finite() || noise < 0.0 {
            warn!("Thermal model noise {} is not a finite non-negative value, using default", noise);
            self.sensors.thermal_model.noise_celsius = ThermalModel::default().noise_celsius;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.output.refresh_interval_ms.unwrap_or(self.poll.interval_ms))
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            poll: PollConfig {
                interval_ms: DEFAULT_INTERVAL_MS,
                quick_test: false,
            },
            output: OutputConfig {
                format: OutputFormat::Table,
                log_enabled: false,
                log_dir: PathBuf::from("logs"),
                history_capacity: 100,
                trend_window: 20,
                refresh_interval_ms: None,
            },
            sensors: SensorsConfig {
                bridge_path: PathBuf::from("sensor-bridge.exe"),
                bridge_timeout_ms: 3000,
                wmi_timeout_ms: 2000,
                shell_timeout_ms: 3000,
                thermal_model: ThermalModel::default(),
            },
        }
    }
}
