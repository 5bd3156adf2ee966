use crate::core::{CounterProvider, GpuInfo};
use crate::counters::{CounterInitError, NvidiaSmiGpu};
use async_trait::async_trait;
use sysinfo::System;
use tracing::{debug, info};

/// CPU usage via `sysinfo`, GPU state via [`NvidiaSmiGpu`].
pub struct SysinfoCounters {
    system: System,
    gpu: NvidiaSmiGpu,
}

impl SysinfoCounters {
    /// Opens the counters and primes the CPU usage delta.
    ///
    /// CPU usage is computed between two refreshes, so the first refresh is
    /// discarded and followed by a short sleep. This blocks for
    /// [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`]; call it from a blocking
    /// context. The GPU is queried lazily on the first sample.
    pub fn open(gpu: NvidiaSmiGpu) -> Result<Self, CounterInitError> {
        let mut system = System::new();
        system.refresh_cpu();
        if system.cpus().is_empty() {
            return Err(CounterInitError::NoCpus);
        }
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        debug!(cpus = system.cpus().len(), "CPU counter warmed up");

        info!("Performance counters opened");
        Ok(Self { system, gpu })
    }
}

#[async_trait]
impl CounterProvider for SysinfoCounters {
    fn cpu_usage_percent(&mut self) -> f64 {
        self.system.refresh_cpu();
        f64::from(self.system.global_cpu_info().cpu_usage()).clamp(0.0, 100.0)
    }

    async fn gpu_info(&mut self) -> GpuInfo {
        self.gpu.read().await
    }
}
