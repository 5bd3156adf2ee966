//! WMI thermal classes queried through `wmic`.
//!
//! Each class is its own sensor source so the resolver can time-box and
//! attribute them individually. They run in the order ACPI thermal zone,
//! temperature probe, thermal zone performance counter.

use crate::core::{CommandRunner, SensorSource, Temperature};
use crate::sensors::{validate, SourceError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The unit a WMI property reports its raw integer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawUnit {
    /// Tenths of a Kelvin (`MSAcpi_ThermalZoneTemperature`).
    DeciKelvin,
    /// Whole degrees Celsius.
    Celsius,
    /// Tenths of a degree.
    DeciCelsius,
}

impl RawUnit {
    pub fn to_celsius(self, raw: f64) -> f64 {
        match self {
            RawUnit::DeciKelvin => raw / 10.0 - 273.15,
            RawUnit::Celsius => raw,
            RawUnit::DeciCelsius => raw / 10.0,
        }
    }
}

/// A WMI class/property pair that carries a temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WmiClass {
    pub source_name: &'static str,
    pub namespace: &'static str,
    pub class: &'static str,
    pub property: &'static str,
    pub unit: RawUnit,
}

pub const ACPI_THERMAL_ZONE: WmiClass = WmiClass {
    source_name: "wmi-acpi",
    namespace: "root\\wmi",
    class: "MSAcpi_ThermalZoneTemperature",
    property: "CurrentTemperature",
    unit: RawUnit::DeciKelvin,
};

pub const TEMPERATURE_PROBE: WmiClass = WmiClass {
    source_name: "wmi-probe",
    namespace: "root\\cimv2",
    class: "Win32_TemperatureProbe",
    property: "CurrentReading",
    unit: RawUnit::Celsius,
};

pub const THERMAL_ZONE_INFORMATION: WmiClass = WmiClass {
    source_name: "wmi-thermal-zone",
    namespace: "root\\cimv2",
    class: "Win32_PerfFormattedData_Counters_ThermalZoneInformation",
    property: "Temperature",
    unit: RawUnit::DeciCelsius,
};

/// The three WMI classes in the order they are tried.
pub const WMI_CLASSES: [WmiClass; 3] = [ACPI_THERMAL_ZONE, TEMPERATURE_PROBE, THERMAL_ZONE_INFORMATION];

pub struct WmiSource {
    class: WmiClass,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl WmiSource {
    pub fn new(class: WmiClass, timeout: Duration, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            class,
            timeout,
            runner,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            format!("/namespace:\\\\{}", self.class.namespace),
            "PATH".to_string(),
            self.class.class.to_string(),
            "get".to_string(),
            self.class.property.to_string(),
            "/value".to_string(),
        ]
    }
}

#[async_trait]
impl SensorSource for WmiSource {
    fn name(&self) -> &str {
        self.class.source_name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, budget: Duration) -> Result<Temperature, SourceError> {
        let stdout = self.runner.run("wmic", &self.args(), budget).await?;
        parse_wmic_values(&stdout, &self.class)
    }
}

/// Parses `wmic ... get <Property> /value` output.
///
/// Every instance prints a `Property=value` line. The first instance whose
/// converted value is inside the validity range is returned; if instances
/// exist but none are valid, the first one is reported as out of range.
pub fn parse_wmic_values(stdout: &str, class: &WmiClass) -> Result<Temperature, SourceError> {
    let prefix = format!("{}=", class.property);
    let mut first_rejected = None;

    for line in stdout.lines().map(str::trim) {
        let Some(raw) = line.strip_prefix(&prefix) else {
            continue;
        };
        let Ok(raw) = raw.trim().parse::<f64>() else {
            continue;
        };
        match validate(class.unit.to_celsius(raw)) {
            Ok(t) => return Ok(t),
            Err(e) => {
                first_rejected.get_or_insert(e);
            }
        }
    }

    Err(first_rejected.unwrap_or(SourceError::NotFound))
}
