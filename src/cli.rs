//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `thermwatch.toml` file and environment variables.
//!
//! Parsing is lenient: unknown flags are ignored and malformed `--format` or
//! `--interval` values leave the configured default in place.

use clap::{error::ErrorKind, Parser};
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{OutputFormat, MIN_INTERVAL_MS};

/// Periodically samples CPU/GPU utilization and temperature.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None, ignore_errors = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Take a single sample, print it and exit.
    #[arg(long)]
    pub quick_test: bool,

    /// Append every sample to a CSV log file.
    #[arg(short, long)]
    pub log: bool,

    /// Output format: table, csv, json or text.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Milliseconds between samples (minimum 100).
    #[arg(short, long, value_name = "MS")]
    pub interval: Option<String>,
}

impl Cli {
    /// Parses the process arguments. `--help` and `--version` print and exit;
    /// any other parse failure falls back to the defaults.
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => cli,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
                _ => {
                    debug!("Ignoring unparseable arguments: {}", e);
                    Self::default()
                }
            },
        }
    }

    /// The requested format, if it names a known one.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.format.as_deref().and_then(|f| f.parse().ok())
    }

    /// The requested interval, clamped to the minimum, if it is a number.
    pub fn interval_ms(&self) -> Option<u64> {
        self.interval
            .as_deref()
            .and_then(|i| i.trim().parse::<u64>().ok())
            .map(|ms| ms.max(MIN_INTERVAL_MS))
    }
}

fn insert_nested(dict: &mut Dict, section: &str, key: &str, value: Value) {
    let entry = dict
        .entry(section.to_string())
        .or_insert_with(|| Value::from(Dict::new()));
    if let Value::Dict(_, inner) = entry {
        inner.insert(key.to_string(), value);
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        // Flags only override when present, so `false` never masks a file or env setting.
        if self.quick_test {
            insert_nested(&mut dict, "poll", "quick_test", Value::from(true));
        }

        if self.log {
            insert_nested(&mut dict, "output", "log_enabled", Value::from(true));
        }

        match (self.format.as_deref(), self.output_format()) {
            (_, Some(format)) => {
                insert_nested(&mut dict, "output", "format", Value::from(format.to_string()))
            }
            (Some(raw), None) => debug!(format = raw, "Unknown --format value, keeping default"),
            (None, None) => {}
        }

        match (self.interval.as_deref(), self.interval_ms()) {
            (_, Some(ms)) => insert_nested(&mut dict, "poll", "interval_ms", Value::from(ms)),
            (Some(raw), None) => debug!(interval = raw, "Malformed --interval value, keeping default"),
            (None, None) => {}
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
