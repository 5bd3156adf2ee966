//! Bounded in-memory sample window and the summary computed over it.

use crate::core::Sample;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// FIFO ring buffer of the most recent samples.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The last `n` samples, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Sample> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }

    /// Summary of the buffered window, `None` when nothing was buffered.
    pub fn summary(&self, started_at: DateTime<Local>) -> Option<Summary> {
        let latest = self.samples.back()?;
        let elapsed = (latest.timestamp - started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        Some(Summary {
            count: self.samples.len(),
            elapsed,
            cpu_usage: Stats::over(self.samples.iter().map(|s| s.cpu_usage_percent)),
            cpu_temp: Stats::over(self.samples.iter().map(|s| s.cpu_temp_celsius)),
            gpu_usage: Stats::over(self.samples.iter().map(|s| s.gpu_usage_percent)),
            gpu_temp: Stats::over(self.samples.iter().map(|s| s.gpu_temp_celsius)),
        })
    }
}

/// Average, minimum and maximum of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Callers guarantee a non-empty iterator.
    fn over(values: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        Self {
            avg: sum / count.max(1) as f64,
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub cpu_usage: Stats,
    pub cpu_temp: Stats,
    pub gpu_usage: Stats,
    pub gpu_temp: Stats,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
