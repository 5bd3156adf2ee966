//! CPU temperature acquisition.
//!
//! This module holds the individual sensor sources, the process runner they
//! share, and the [`TemperatureResolver`] that walks them in priority order.

pub mod bridge;
pub mod resolver;
pub mod runner;
pub mod shell;
pub mod simulated;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod wmi;

use std::time::Duration;
use thiserror::Error;

use crate::core::Temperature;

pub use crate::core::SensorSource;
pub use bridge::BridgeSource;
pub use resolver::{Resolution, TemperatureResolver};
pub use runner::TokioCommandRunner;
pub use shell::ShellCimSource;
pub use simulated::ThermalModel;
pub use wmi::{RawUnit, WmiClass, WmiSource};

/// Why a sensor source produced no reading. None of these ever reach the
/// caller of [`TemperatureResolver::resolve`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("`{program}` exited unsuccessfully ({status})")]
    Failed { program: String, status: String },

    #[error("unparseable output: {0}")]
    Parse(String),

    #[error("no temperature reported")]
    NotFound,

    #[error("reading {0} is outside the valid range")]
    OutOfRange(f64),
}

/// Applies the validity window to a converted reading.
pub fn validate(celsius: f64) -> Result<Temperature, SourceError> {
    Temperature::new(celsius).ok_or(SourceError::OutOfRange(celsius))
}
