//! Append-only CSV log of accepted samples.

use crate::core::{format_timestamp, Sample};
use crate::sink::SinkError;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const CSV_HEADER: [&str; 5] = [
    "Timestamp",
    "CPU Usage (%)",
    "CPU Temp (°C)",
    "GPU Usage (%)",
    "GPU Temp (°C)",
];

/// Formats a sample as the five CSV fields, numbers to two decimals.
pub fn csv_fields(sample: &Sample) -> [String; 5] {
    [
        format_timestamp(&sample.timestamp),
        format!("{:.2}", sample.cpu_usage_percent),
        format!("{:.2}", sample.cpu_temp_celsius),
        format!("{:.2}", sample.gpu_usage_percent),
        format!("{:.2}", sample.gpu_temp_celsius),
    ]
}

/// Same-second runs get a numeric suffix; this bounds the search.
const MAX_NAME_SUFFIX: u32 = 1000;

/// One log file per run, header written once per file.
pub struct CsvLog {
    path: PathBuf,
    writer: csv::Writer<Box<dyn Write + Send>>,
}

impl CsvLog {
    /// Creates a fresh `<dir>/thermwatch-<timestamp>.csv` and writes the
    /// header row. An existing file is never reused: a run started in the
    /// same second as another gets `thermwatch-<timestamp>-<n>.csv`.
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> Result<Self, SinkError> {
        fs::create_dir_all(dir)?;
        let stem = format!("thermwatch-{}", started_at.format("%Y%m%d-%H%M%S"));
        for n in 0..MAX_NAME_SUFFIX {
            let path = if n == 0 {
                dir.join(format!("{}.csv", stem))
            } else {
                dir.join(format!("{}-{}.csv", stem, n))
            };
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    info!("Logging samples to {}", path.display());
                    return Self::with_writer(path, Box::new(file), true);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free log file name for {} in {}", stem, dir.display()),
        )
        .into())
    }

    /// Opens `path` for appending. The header is written only if the file
    /// is empty.
    pub fn create_at(path: PathBuf) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let empty = file.metadata()?.len() == 0;
        info!("Logging samples to {}", path.display());
        Self::with_writer(path, Box::new(file), empty)
    }

    /// Logs to an arbitrary writer; `path` is only used in messages.
    pub fn with_writer(
        path: PathBuf,
        out: Box<dyn Write + Send>,
        write_header: bool,
    ) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
        if write_header {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it. After a failed flush the row stays
    /// buffered and goes out with the next successful append.
    pub fn append(&mut self, sample: &Sample) -> Result<(), SinkError> {
        self.writer.write_record(csv_fields(sample))?;
        self.writer.flush()?;
        Ok(())
    }
}
