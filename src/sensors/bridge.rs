//! The privileged hardware-sensor bridge.
//!
//! The bridge is a separate helper executable with direct access to the
//! on-die sensors. It takes no arguments and prints a single JSON line such
//! as `{"cpuTemperature": 52.25}` (already averaged across cores) or
//! `{"cpuTemperature": null}` when it could not read anything.

use crate::core::{CommandRunner, SensorSource, Temperature};
use crate::sensors::{validate, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const BRIDGE_SOURCE_NAME: &str = "bridge";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgeReport {
    #[serde(default)]
    cpu_temperature: Option<Value>,
}

/// Sensor source backed by the privileged helper process.
pub struct BridgeSource {
    path: PathBuf,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl BridgeSource {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            path: path.into(),
            timeout,
            runner,
        }
    }
}

#[async_trait]
impl SensorSource for BridgeSource {
    fn name(&self) -> &str {
        BRIDGE_SOURCE_NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, budget: Duration) -> Result<Temperature, SourceError> {
        let program = self.path.to_string_lossy();
        let stdout = self.runner.run(&program, &[], budget).await?;
        parse_bridge_output(&stdout)
    }
}

/// Extracts `cpuTemperature` from the bridge's stdout.
///
/// The last line that looks like a JSON object wins, so a stray banner before
/// the payload does not break parsing. The field must be a JSON number.
pub fn parse_bridge_output(stdout: &str) -> Result<Temperature, SourceError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .last()
        .ok_or_else(|| SourceError::Parse("no JSON object in bridge output".to_string()))?;

    let report: BridgeReport =
        serde_json::from_str(line).map_err(|e| SourceError::Parse(e.to_string()))?;

    match report.cpu_temperature {
        None | Some(Value::Null) => Err(SourceError::NotFound),
        Some(Value::Number(n)) => {
            let celsius = n
                .as_f64()
                .ok_or_else(|| SourceError::Parse(format!("non-finite number {}", n)))?;
            validate(celsius)
        }
        Some(other) => Err(SourceError::Parse(format!(
            "cpuTemperature is not a number: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::test_utils::FakeCommandRunner;

    #[test]
    fn test_parse_valid_reading() {
        let t = parse_bridge_output("{\"cpuTemperature\": 52.25}\n").unwrap();
        assert_eq!(t.celsius(), 52.25);
    }

    #[test]
    fn test_parse_ignores_leading_noise() {
        let t = parse_bridge_output("Loading sensors...\n{\"cpuTemperature\":48}\n").unwrap();
        assert_eq!(t.celsius(), 48.0);
    }

    #[test]
    fn test_null_and_missing_are_not_found() {
        assert!(matches!(
            parse_bridge_output("{\"cpuTemperature\": null}"),
            Err(SourceError::NotFound)
        ));
        assert!(matches!(parse_bridge_output("{}"), Err(SourceError::NotFound)));
    }

    #[test]
    fn test_non_numeric_is_parse_error() {
        assert!(matches!(
            parse_bridge_output("{\"cpuTemperature\": \"52\"}"),
            Err(SourceError::Parse(_))
        ));
        assert!(matches!(parse_bridge_output("garbage"), Err(SourceError::Parse(_))));
        assert!(matches!(parse_bridge_output("{broken"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            parse_bridge_output("{\"cpuTemperature\": 0}"),
            Err(SourceError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_bridge_output("{\"cpuTemperature\": 130.5}"),
            Err(SourceError::OutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn test_attempt_runs_configured_helper() {
        let runner = Arc::new(FakeCommandRunner::new());
        runner.add_success("helper.exe", "{\"cpuTemperature\": 61.5}");
        let source = BridgeSource::new("helper.exe", Duration::from_secs(3), runner.clone());

        let t = source.attempt(source.timeout()).await.unwrap();
        assert_eq!(t.celsius(), 61.5);
        assert_eq!(runner.get_call_count("helper.exe"), 1);
    }
}
