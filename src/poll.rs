//! The scheduling loop driving sampler and sink.

use crate::config::MIN_INTERVAL_MS;
use crate::sampler::MetricSampler;
use crate::sink::MetricSink;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// One sample, then stop.
    Diagnostic,
    /// Sample every `interval` until shutdown is signalled.
    Continuous { interval: Duration },
}

impl PollMode {
    /// Continuous mode with the interval clamped to the minimum.
    pub fn continuous(interval: Duration) -> Self {
        PollMode::Continuous {
            interval: interval.max(Duration::from_millis(MIN_INTERVAL_MS)),
        }
    }
}

pub struct PollLoop {
    sampler: MetricSampler,
    sink: MetricSink,
    mode: PollMode,
    state: PollState,
    cycles: u64,
}

impl PollLoop {
    pub fn new(sampler: MetricSampler, sink: MetricSink, mode: PollMode) -> Self {
        Self {
            sampler,
            sink,
            mode,
            state: PollState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Completed sample+consume cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sink(&self) -> &MetricSink {
        &self.sink
    }

    async fn cycle(&mut self) {
        let sample = self.sampler.sample().await;
        self.sink.consume(sample);
        self.cycles += 1;
    }

    /// Runs until the mode's stop condition, then emits the summary.
    ///
    /// Shutdown is only observed between cycles: a cycle that has started
    /// always finishes, including a slow temperature resolve.
    pub async fn run(&mut self, mut shutdown_rx: watch::Receiver<bool>) {
        if self.state != PollState::Idle {
            return;
        }
        self.state = PollState::Running;

        match self.mode {
            PollMode::Diagnostic => {
                info!("Running a single diagnostic sample.");
                self.cycle().await;
            }
            PollMode::Continuous { interval } => {
                info!("Polling every {}ms.", interval.as_millis());
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    tokio::select! {
                        biased;
                        changed = shutdown_rx.changed() => {
                            // A dropped sender also means nobody can keep us running.
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!("Poll loop received shutdown signal.");
                                break;
                            }
                            continue;
                        }
                        _ = ticker.tick() => {}
                    }
                    self.cycle().await;
                    debug!(cycles = self.cycles, "Poll cycle complete");
                }
            }
        }

        self.state = PollState::Stopped;
        self.sink.emit_summary();
        info!("Poll loop stopped after {} cycles.", self.cycles);
    }
}
