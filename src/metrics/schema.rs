// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Names, help text and units of the per-device gauges.

use crate::error::Result;
use crate::metrics::MetricRegistry;
use crate::utils::milliwatts_to_watts;

/// Label carrying the device index on every gauge.
pub const DEVICE_LABEL: &str = "gpu";

pub const CLOCK_MHZ: &str = "nvidia_gpu_clock_mhz";
pub const UTILIZATION_GPU: &str = "nvidia_gpu_utilization_gpu_percent";
pub const UTILIZATION_MEMORY: &str = "nvidia_gpu_utilization_memory_percent";
pub const MEMORY_TOTAL: &str = "nvidia_gpu_memory_total_mib";
pub const MEMORY_FREE: &str = "nvidia_gpu_memory_free_mib";
pub const MEMORY_USED: &str = "nvidia_gpu_memory_used_mib";
pub const POWER_WATTS: &str = "nvidia_gpu_power_usage_watts";
pub const POWER_MILLIWATTS: &str = "nvidia_gpu_power_usage_milliwatts";
pub const TEMPERATURE: &str = "nvidia_gpu_temperature_celsius";

/// Unit the power gauge is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerUnit {
    #[default]
    Watts,
    /// NVML's native unit, published unconverted.
    Milliwatts,
}

impl PowerUnit {
    pub fn metric_name(&self) -> &'static str {
        match self {
            PowerUnit::Watts => POWER_WATTS,
            PowerUnit::Milliwatts => POWER_MILLIWATTS,
        }
    }

    fn help(&self) -> &'static str {
        match self {
            PowerUnit::Watts => "Current GPU power draw in watts",
            PowerUnit::Milliwatts => "Current GPU power draw in milliwatts",
        }
    }

    pub fn convert(&self, milliwatts: u32) -> f64 {
        match self {
            PowerUnit::Watts => milliwatts_to_watts(milliwatts),
            PowerUnit::Milliwatts => milliwatts as f64,
        }
    }
}

/// Register every per-device gauge. Must run once, before the scrape loop
/// starts; a second call fails with [`crate::Error::DuplicateMetric`].
pub fn register_gpu_metrics(registry: &MetricRegistry, power_unit: PowerUnit) -> Result<()> {
    let gauges = [
        (CLOCK_MHZ, "Current GPU graphics clock in MHz"),
        (UTILIZATION_GPU, "GPU compute utilization in percent"),
        (UTILIZATION_MEMORY, "GPU memory controller utilization in percent"),
        (MEMORY_TOTAL, "Total GPU memory in MiB"),
        (MEMORY_FREE, "Free GPU memory in MiB"),
        (MEMORY_USED, "Used GPU memory in MiB"),
        (power_unit.metric_name(), power_unit.help()),
        (TEMPERATURE, "Current GPU temperature in Celsius"),
    ];

    for (name, help) in gauges {
        registry.register_vector(name, help, &[DEVICE_LABEL])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_power_conversion() {
        assert_eq!(PowerUnit::Watts.convert(150_000), 150.0);
        assert_eq!(PowerUnit::Milliwatts.convert(150_000), 150_000.0);
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = MetricRegistry::new();
        register_gpu_metrics(&registry, PowerUnit::Watts).unwrap();
        assert!(matches!(
            register_gpu_metrics(&registry, PowerUnit::Watts),
            Err(Error::DuplicateMetric(_))
        ));
    }

    #[test]
    fn test_power_gauge_follows_unit() {
        let registry = MetricRegistry::new();
        register_gpu_metrics(&registry, PowerUnit::Milliwatts).unwrap();
        registry.set_vector(POWER_MILLIWATTS, &["0"], 1.0).unwrap();
        assert!(registry.set_vector(POWER_WATTS, &["0"], 1.0).is_err());
    }
}
