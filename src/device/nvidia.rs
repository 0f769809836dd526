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

use crate::device::{
    DeviceEnumerator, MemoryUsage, SensorError, SensorReader, SensorResult, Utilization,
};
use crate::error::{Error, Result};
use nvml_wrapper::enum_wrappers::device::{Clock, ClockId, TemperatureSensor};
use nvml_wrapper::error::NvmlError;
use nvml_wrapper::{cuda_driver_version_major, cuda_driver_version_minor, Device, Nvml};

/// Clock domain sampled for the frequency gauge.
const CLOCK_DOMAIN: Clock = Clock::Graphics;
/// Clock reading type sampled for the frequency gauge.
const CLOCK_ID: ClockId = ClockId::Current;
/// Temperature sensor location sampled for the temperature gauge.
const TEMPERATURE_SENSOR: TemperatureSensor = TemperatureSensor::Gpu;

/// NVML-backed device enumerator.
///
/// Owns the NVML session for the lifetime of the process. NVML is shut down
/// when this value is dropped.
pub struct NvmlEnumerator {
    nvml: Nvml,
}

impl NvmlEnumerator {
    /// Establish the NVML session. Failure here is fatal for the exporter.
    pub fn init() -> Result<Self> {
        let nvml = Nvml::init().map_err(|e| Error::PlatformInit(format!("NVML: {e}")))?;
        Ok(Self { nvml })
    }

    /// Driver and CUDA versions, for the startup log line.
    pub fn driver_summary(&self) -> String {
        let driver = self
            .nvml
            .sys_driver_version()
            .unwrap_or_else(|_| "Unknown".to_string());
        match self.nvml.sys_cuda_driver_version() {
            Ok(version) => format!(
                "driver {driver}, CUDA {}.{}",
                cuda_driver_version_major(version),
                cuda_driver_version_minor(version)
            ),
            Err(_) => format!("driver {driver}"),
        }
    }
}

impl DeviceEnumerator for NvmlEnumerator {
    type Handle<'a> = Device<'a>;

    fn device_count(&self) -> SensorResult<u32> {
        self.nvml.device_count().map_err(SensorError::from)
    }

    fn handle_for(&self, index: u32) -> SensorResult<Device<'_>> {
        self.nvml.device_by_index(index).map_err(SensorError::from)
    }
}

impl SensorReader for Device<'_> {
    fn clock_mhz(&self) -> SensorResult<u32> {
        Ok(self.clock(CLOCK_DOMAIN, CLOCK_ID)?)
    }

    fn utilization(&self) -> SensorResult<Utilization> {
        let rates = self.utilization_rates()?;
        Ok(Utilization {
            gpu: rates.gpu,
            memory: rates.memory,
        })
    }

    fn memory(&self) -> SensorResult<MemoryUsage> {
        let info = self.memory_info()?;
        Ok(MemoryUsage {
            total: info.total,
            free: info.free,
            used: info.used,
        })
    }

    fn power_milliwatts(&self) -> SensorResult<u32> {
        Ok(self.power_usage()?)
    }

    fn temperature_celsius(&self) -> SensorResult<u32> {
        Ok(self.temperature(TEMPERATURE_SENSOR)?)
    }
}

impl From<NvmlError> for SensorError {
    fn from(error: NvmlError) -> Self {
        match error {
            NvmlError::NotSupported | NvmlError::FunctionNotFound => SensorError::Unsupported,
            NvmlError::InvalidArg | NvmlError::GpuLost | NvmlError::NotFound => {
                SensorError::InvalidHandle
            }
            NvmlError::NoPermission => SensorError::NoPermission,
            other => SensorError::QueryFailed(other.to_string()),
        }
    }
}
