//! Sample consumer: console rendering, CSV logging and the trend window.

pub mod history;
pub mod log_file;
pub mod render;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod throttle;

pub use history::{History, Stats, Summary, DEFAULT_HISTORY_CAPACITY};
pub use log_file::CsvLog;
pub use throttle::RenderThrottle;

use crate::config::OutputFormat;
use crate::core::Sample;
use chrono::{DateTime, Local};
use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rendering and retention settings for a [`MetricSink`].
#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub format: OutputFormat,
    pub history_capacity: usize,
    pub trend_window: usize,
    /// Minimum time between two table redraws.
    pub refresh_interval: Duration,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            trend_window: 20,
            refresh_interval: Duration::from_millis(1000),
        }
    }
}

pub struct MetricSink {
    options: SinkOptions,
    history: History,
    log: Option<CsvLog>,
    out: Box<dyn Write + Send>,
    throttle: RenderThrottle,
    started_at: DateTime<Local>,
    csv_header_written: bool,
}

impl MetricSink {
    pub fn new(options: SinkOptions, out: Box<dyn Write + Send>, log: Option<CsvLog>) -> Self {
        Self {
            history: History::new(options.history_capacity),
            throttle: RenderThrottle::new(options.refresh_interval),
            options,
            log,
            out,
            started_at: Local::now(),
            csv_header_written: false,
        }
    }

    /// Overrides the session start used for the summary's elapsed time.
    pub fn with_started_at(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Buffers, logs and renders one sample. Write failures are reported and
    /// never stop the caller.
    pub fn consume(&mut self, sample: Sample) {
        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.append(&sample) {
                metrics::counter!("log_write_failures_total").increment(1);
                error!("Failed to append sample to {}: {}", log.path().display(), e);
            }
        }

        self.history.push(sample);

        if let Err(e) = self.render_latest() {
            error!("Failed to render sample: {}", e);
        }
    }

    fn render_latest(&mut self) -> Result<(), SinkError> {
        let Some(sample) = self.history.latest() else {
            return Ok(());
        };

        match self.options.format {
            OutputFormat::Table => {
                if !self.throttle.try_acquire(Instant::now()) {
                    return Ok(());
                }
                let table = render::render_table(sample, &self.history, self.options.trend_window);
                queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
                self.out.write_all(table.as_bytes())?;
            }
            OutputFormat::Csv => {
                let row = render::render_csv_row(sample)?;
                if !self.csv_header_written {
                    self.out.write_all(render::render_csv_header()?.as_bytes())?;
                    self.csv_header_written = true;
                }
                self.out.write_all(row.as_bytes())?;
            }
            OutputFormat::Json => {
                self.out.write_all(render::render_json(sample)?.as_bytes())?;
            }
            OutputFormat::Text => {
                self.out.write_all(render::render_text(sample).as_bytes())?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Count, elapsed time and per-metric statistics over the buffered window.
    pub fn summary(&self) -> Option<Summary> {
        self.history.summary(self.started_at)
    }

    /// Writes the summary in the configured format. Nothing is written when
    /// no sample was consumed.
    pub fn emit_summary(&mut self) {
        let Some(summary) = self.summary() else {
            return;
        };
        let rendered = match self.options.format {
            OutputFormat::Json => render::render_summary_json(&summary),
            _ => Ok(render::render_summary(&summary)),
        };
        let result = rendered.and_then(|text| {
            self.out.write_all(text.as_bytes())?;
            self.out.flush()?;
            Ok(())
        });
        if let Err(e) = result {
            error!("Failed to write summary: {}", e);
        }
    }
}
