use crate::core::{CounterProvider, GpuInfo};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counter provider returning scripted CPU usage and a fixed GPU reading.
///
/// The last queued usage repeats once the queue is drained.
#[derive(Debug, Clone)]
pub struct FakeCounters {
    usages: VecDeque<f64>,
    last_usage: f64,
    gpu: GpuInfo,
    reads: Arc<AtomicUsize>,
}

impl FakeCounters {
    pub fn new(cpu_usage_percent: f64, gpu: GpuInfo) -> Self {
        Self {
            usages: VecDeque::new(),
            last_usage: cpu_usage_percent,
            gpu,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_usages(mut self, usages: impl IntoIterator<Item = f64>) -> Self {
        self.usages.extend(usages);
        self
    }

    /// Handle counting CPU reads, i.e. sample cycles.
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }

    pub fn read_count(handle: &Arc<AtomicUsize>) -> usize {
        handle.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterProvider for FakeCounters {
    fn cpu_usage_percent(&mut self) -> f64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.usages.pop_front() {
            self.last_usage = next;
        }
        self.last_usage
    }

    async fn gpu_info(&mut self) -> GpuInfo {
        self.gpu
    }
}
