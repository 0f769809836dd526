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

//! Unified error types for the exporter.
//!
//! Sensor-level failures live in [`crate::device::SensorError`]; this module
//! covers everything that can stop the exporter from starting or serving.

use thiserror::Error;

/// The main error type for exporter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The hardware library session could not be established.
    ///
    /// There is no fallback telemetry source, so this is fatal at startup.
    #[error("Platform initialization failed: {0}")]
    PlatformInit(String),

    /// A metric name was registered twice.
    #[error("Metric already registered: {0}")]
    DuplicateMetric(String),

    /// A write referenced a metric that was never registered.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A write supplied the wrong number of label values for a metric.
    #[error("Metric {name} expects {expected} label value(s), got {actual}")]
    LabelMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// An I/O error occurred, typically while binding the listener.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PlatformInit("NVML not found".to_string());
        assert_eq!(
            err.to_string(),
            "Platform initialization failed: NVML not found"
        );

        let err = Error::DuplicateMetric("nvidia_gpu_clock_mhz".to_string());
        assert_eq!(
            err.to_string(),
            "Metric already registered: nvidia_gpu_clock_mhz"
        );

        let err = Error::LabelMismatch {
            name: "nvidia_gpu_clock_mhz".to_string(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Metric nvidia_gpu_clock_mhz expects 1 label value(s), got 2"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
