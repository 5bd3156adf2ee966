//! ACPI thermal zone read through a PowerShell CIM query.
//!
//! This reaches the same class as the `wmi-acpi` source but through a
//! different host process, which survives setups where `wmic` is missing.

use crate::core::{CommandRunner, SensorSource, Temperature};
use crate::sensors::wmi::RawUnit;
use crate::sensors::{validate, SourceError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

pub const SHELL_SOURCE_NAME: &str = "shell-cim";

const CIM_QUERY: &str = "Get-CimInstance -Namespace root/wmi -ClassName MSAcpi_ThermalZoneTemperature -ErrorAction Stop | Select-Object -ExpandProperty CurrentTemperature";

pub struct ShellCimSource {
    shell: String,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
    integer: Regex,
}

impl ShellCimSource {
    pub fn new(timeout: Duration, runner: Arc<dyn CommandRunner>) -> Result<Self, regex::Error> {
        Ok(Self {
            shell: "powershell".to_string(),
            timeout,
            runner,
            integer: Regex::new(r"\d+")?,
        })
    }

    fn args() -> Vec<String> {
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            CIM_QUERY.to_string(),
        ]
    }

    /// Takes the first integer in the output as tenths of a Kelvin.
    pub fn parse(&self, stdout: &str) -> Result<Temperature, SourceError> {
        let m = self.integer.find(stdout).ok_or(SourceError::NotFound)?;
        let raw: f64 = m
            .as_str()
            .parse()
            .map_err(|e| SourceError::Parse(format!("{}: {}", m.as_str(), e)))?;
        validate(RawUnit::DeciKelvin.to_celsius(raw))
    }
}

#[async_trait]
impl SensorSource for ShellCimSource {
    fn name(&self) -> &str {
        SHELL_SOURCE_NAME
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, budget: Duration) -> Result<Temperature, SourceError> {
        let stdout = self.runner.run(&self.shell, &Self::args(), budget).await?;
        self.parse(&stdout)
    }
}
