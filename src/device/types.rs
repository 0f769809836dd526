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

use std::fmt;
use thiserror::Error;

/// One independent sensor query issued per device per scrape cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Clock,
    Utilization,
    Memory,
    Power,
    Temperature,
}

impl SensorKind {
    /// Every sensor queried for each device, in query order.
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Clock,
        SensorKind::Utilization,
        SensorKind::Memory,
        SensorKind::Power,
        SensorKind::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Clock => "clock",
            SensorKind::Utilization => "utilization",
            SensorKind::Memory => "memory",
            SensorKind::Power => "power",
            SensorKind::Temperature => "temperature",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute-engine and memory-controller busy percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utilization {
    pub gpu: u32,
    pub memory: u32,
}

/// Framebuffer memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

/// Why a single sensor query (or a device lookup) failed.
///
/// These are always reading-local or cycle-local; none of them stop the
/// exporter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor unsupported on this device")]
    Unsupported,
    #[error("device handle invalid")]
    InvalidHandle,
    #[error("insufficient permissions")]
    NoPermission,
    #[error("query failed: {0}")]
    QueryFailed(String),
}

pub type SensorResult<T> = Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_names_are_unique() {
        let mut names: Vec<&str> = SensorKind::ALL.iter().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SensorKind::ALL.len());
    }

    #[test]
    fn test_sensor_error_display() {
        assert_eq!(
            SensorError::Unsupported.to_string(),
            "sensor unsupported on this device"
        );
        assert_eq!(
            SensorError::QueryFailed("timeout".to_string()).to_string(),
            "query failed: timeout"
        );
    }
}
