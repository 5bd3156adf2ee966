//! Usage-derived temperature estimate, the terminal fallback.

use crate::core::Temperature;
use rand::{distr::Uniform, Rng};
use serde::{Deserialize, Serialize};

pub const SIMULATED_SOURCE_NAME: &str = "simulated";

/// A nonlinear thermal model mapping CPU load to an approximate temperature:
/// `idle + max_rise * (usage / 100) ^ exponent + noise`, clamped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThermalModel {
    pub idle_celsius: f64,
    pub max_rise_celsius: f64,
    pub exponent: f64,
    /// Half-width of the uniform noise band.
    pub noise_celsius: f64,
    pub min_celsius: f64,
    pub max_celsius: f64,
}

impl Default for ThermalModel {
    fn default() -> Self {
        Self {
            idle_celsius: 37.0,
            max_rise_celsius: 35.0,
            exponent: 1.5,
            noise_celsius: 1.0,
            min_celsius: 30.0,
            max_celsius: 95.0,
        }
    }
}

impl ThermalModel {
    /// Estimates a temperature with fresh random noise.
    ///
    /// A noise band that cannot be sampled (negative, NaN, infinite or too
    /// wide) contributes no noise.
    pub fn estimate(&self, cpu_usage_percent: f64) -> Temperature {
        let noise = if self.noise_celsius > 0.0 {
            Uniform::new_inclusive(-self.noise_celsius, self.noise_celsius)
                .map(|band| rand::rng().sample(band))
                .unwrap_or(0.0)
        } else {
            0.0
        };
        self.estimate_with_noise(cpu_usage_percent, noise)
    }

    /// Deterministic form of [`estimate`](Self::estimate).
    pub fn estimate_with_noise(&self, cpu_usage_percent: f64, noise: f64) -> Temperature {
        let usage = if cpu_usage_percent.is_finite() {
            cpu_usage_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let celsius = self.idle_celsius
            + self.max_rise_celsius * (usage / 100.0).powf(self.exponent)
            + noise;
        Temperature::estimated(celsius.max(self.min_celsius).min(self.max_celsius))
    }
}
