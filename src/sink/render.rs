//! Console formats for samples and the end-of-run summary.

use crate::core::Sample;
use crate::sink::history::{History, Stats, Summary};
use crate::sink::log_file::{csv_fields, CSV_HEADER};
use crate::sink::SinkError;
use serde_json::json;

/// Eight shade levels, lowest first.
pub const SPARK_LEVELS: [char; 8] = ['_', '.', '-', ':', '=', '+', '*', '#'];

const TABLE_INNER_WIDTH: usize = 44;

/// Renders `values` as a min-max normalized sparkline. A flat series sits
/// on the lowest level.
pub fn sparkline(values: &[f64]) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            let level = if span > 0.0 {
                (((v - min) / span) * top).round() as usize
            } else {
                0
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn table_row(content: &str) -> String {
    format!("| {:<width$} |\n", content, width = TABLE_INNER_WIDTH)
}

fn table_rule() -> String {
    format!("+{}+\n", "-".repeat(TABLE_INNER_WIDTH + 2))
}

/// Fixed-width box for the latest sample plus CPU and GPU temperature trends
/// over the last `trend_window` buffered samples.
pub fn render_table(sample: &Sample, history: &History, trend_window: usize) -> String {
    let mut out = String::new();
    out.push_str(&table_rule());
    out.push_str(&table_row(&format!(
        "{:<30}{:>14}",
        "THERMWATCH",
        sample.timestamp.format("%H:%M:%S").to_string()
    )));
    out.push_str(&table_rule());
    out.push_str(&table_row(&format!(
        "CPU   usage {:>7.2} %    temp {:>7.2} °C",
        sample.cpu_usage_percent, sample.cpu_temp_celsius
    )));
    out.push_str(&table_row(&format!(
        "GPU   usage {:>7.2} %    temp {:>7.2} °C",
        sample.gpu_usage_percent, sample.gpu_temp_celsius
    )));
    out.push_str(&table_rule());
    out.push_str(&table_row(&format!(
        "source: {:<19} samples: {:>7}",
        sample.cpu_temp_source,
        history.len()
    )));
    out.push_str(&table_rule());

    let cpu: Vec<f64> = history.recent(trend_window).map(|s| s.cpu_temp_celsius).collect();
    let gpu: Vec<f64> = history.recent(trend_window).map(|s| s.gpu_temp_celsius).collect();
    out.push_str(&format!("  CPU temp  [{:<width$}]\n", sparkline(&cpu), width = trend_window));
    out.push_str(&format!("  GPU temp  [{:<width$}]\n", sparkline(&gpu), width = trend_window));
    out.push_str("  Ctrl+C to stop\n");
    out
}

/// One line per sample for plain terminals and pipes.
pub fn render_text(sample: &Sample) -> String {
    format!(
        "[{}] CPU {:.2}% {:.2}°C ({}) | GPU {:.2}% {:.2}°C\n",
        sample.timestamp.format("%H:%M:%S"),
        sample.cpu_usage_percent,
        sample.cpu_temp_celsius,
        sample.cpu_temp_source,
        sample.gpu_usage_percent,
        sample.gpu_temp_celsius
    )
}

/// A JSON object per line.
pub fn render_json(sample: &Sample) -> Result<String, SinkError> {
    let mut line = serde_json::to_string(sample)?;
    line.push('\n');
    Ok(line)
}

/// CSV header line, printed once before the first row.
pub fn render_csv_header() -> Result<String, SinkError> {
    csv_line(&CSV_HEADER)
}

/// The same row the log file receives.
pub fn render_csv_row(sample: &Sample) -> Result<String, SinkError> {
    csv_line(&csv_fields(sample))
}

fn csv_line<T: AsRef<[u8]>>(fields: &[T]) -> Result<String, SinkError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn stats_row(label: &str, stats: &Stats, unit: &str) -> String {
    format!(
        "  {:<10} avg {:>7.2}{unit}  min {:>7.2}{unit}  max {:>7.2}{unit}\n",
        label, stats.avg, stats.min, stats.max
    )
}

/// Human-readable end-of-run summary.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::from("\n=== Session summary ===\n");
    out.push_str(&format!(
        "  Samples: {}   Elapsed: {:.1}s\n",
        summary.count,
        summary.elapsed.as_secs_f64()
    ));
    out.push_str(&stats_row("CPU usage", &summary.cpu_usage, "%"));
    out.push_str(&stats_row("CPU temp", &summary.cpu_temp, "°C"));
    out.push_str(&stats_row("GPU usage", &summary.gpu_usage, "%"));
    out.push_str(&stats_row("GPU temp", &summary.gpu_temp, "°C"));
    out
}

/// The summary as a single JSON line, for `json` output.
pub fn render_summary_json(summary: &Summary) -> Result<String, SinkError> {
    let mut line = serde_json::to_string(&json!({ "summary": summary }))?;
    line.push('\n');
    Ok(line)
}
