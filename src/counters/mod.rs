//! OS performance counters: total CPU usage and primary GPU state.
//!
//! The counters are an owned handle opened once at startup and handed to the
//! sampler. Opening is the only step in the whole pipeline that may abort the
//! program, since without a CPU counter no sample can ever be produced.

pub mod gpu;
pub mod host;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use thiserror::Error;

pub use crate::core::{CounterProvider, GpuInfo};
pub use gpu::NvidiaSmiGpu;
pub use host::SysinfoCounters;

#[derive(Error, Debug)]
pub enum CounterInitError {
    #[error("no CPUs reported by the operating system")]
    NoCpus,

    #[error("counter initialization task failed: {0}")]
    Join(String),
}
