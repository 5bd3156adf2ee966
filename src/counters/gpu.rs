//! Primary GPU utilization and temperature from `nvidia-smi`.

use crate::core::{CommandRunner, GpuInfo};
use crate::sensors::SourceError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

pub const NVIDIA_SMI: &str = "nvidia-smi";
pub const DEFAULT_GPU_TIMEOUT: Duration = Duration::from_millis(1500);
pub const DEFAULT_GPU_RETRY_INTERVAL: Duration = Duration::from_secs(30);

const QUERY_FIELDS: &str =
    "utilization.gpu,utilization.memory,utilization.encoder,utilization.decoder,temperature.gpu";

/// Reads the first GPU reported by the NVIDIA driver.
///
/// Every query is time-boxed. After a failure the tool is left alone for
/// `retry_interval` and reads return zeros, matching a machine without a
/// supported GPU; the next query after that tries again.
pub struct NvidiaSmiGpu {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    retry_interval: Duration,
    last_failure: Option<Instant>,
}

impl NvidiaSmiGpu {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            timeout: DEFAULT_GPU_TIMEOUT,
            retry_interval: DEFAULT_GPU_RETRY_INTERVAL,
            last_failure: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// `false` while backing off after a failed query.
    pub fn is_available(&self) -> bool {
        self.last_failure.is_none()
    }

    pub async fn read(&mut self) -> GpuInfo {
        if let Some(failed_at) = self.last_failure {
            if failed_at.elapsed() < self.retry_interval {
                return GpuInfo::default();
            }
        }

        match self.query().await {
            Ok(info) => {
                if self.last_failure.take().is_some() {
                    info!("nvidia-smi is responding again");
                }
                info
            }
            Err(e) => {
                if self.last_failure.is_none() {
                    debug!(error = %e, "nvidia-smi unavailable, GPU metrics will read as zero");
                }
                self.last_failure = Some(Instant::now());
                GpuInfo::default()
            }
        }
    }

    async fn query(&self) -> Result<GpuInfo, SourceError> {
        let args = vec![
            format!("--query-gpu={}", QUERY_FIELDS),
            "--format=csv,noheader,nounits".to_string(),
        ];
        let stdout = tokio::time::timeout(self.timeout, self.runner.run(NVIDIA_SMI, &args, self.timeout))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))??;
        parse_query_line(&stdout)
            .ok_or_else(|| SourceError::Parse(format!("unexpected nvidia-smi output: {}", stdout.trim())))
    }
}

/// Parses the first line of the CSV query output.
///
/// Usage is the mean of the utilization domains the driver reports
/// (`[N/A]` domains are skipped); temperature is the GPU core sensor.
pub fn parse_query_line(stdout: &str) -> Option<GpuInfo> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return None;
    }

    let domains: Vec<f64> = fields[..4]
        .iter()
        .filter_map(|f| f.parse::<f64>().ok())
        .collect();
    let usage_percent = if domains.is_empty() {
        0.0
    } else {
        domains.iter().sum::<f64>() / domains.len() as f64
    };
    let temperature_celsius = fields[4].parse::<f64>().unwrap_or(0.0);

    Some(GpuInfo {
        usage_percent,
        temperature_celsius,
    })
}
