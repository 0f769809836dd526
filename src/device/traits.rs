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

use crate::device::{MemoryUsage, SensorResult, Utilization};

/// Produces the ordered set of device handles for one hardware session.
///
/// The session itself is established when the implementor is constructed and
/// torn down when it is dropped; it is never reinitialized mid-process.
pub trait DeviceEnumerator: Send + Sync {
    /// Handle valid only while the enumerator (and its session) is alive.
    type Handle<'a>: SensorReader
    where
        Self: 'a;

    fn device_count(&self) -> SensorResult<u32>;

    /// Handle for `index` in `0..device_count()`.
    fn handle_for(&self, index: u32) -> SensorResult<Self::Handle<'_>>;
}

/// Per-device sensor queries. Each call is independent of the others.
pub trait SensorReader {
    /// Current graphics clock in MHz.
    fn clock_mhz(&self) -> SensorResult<u32>;

    fn utilization(&self) -> SensorResult<Utilization>;

    fn memory(&self) -> SensorResult<MemoryUsage>;

    /// Board power draw in milliwatts.
    fn power_milliwatts(&self) -> SensorResult<u32>;

    /// GPU die temperature in degrees Celsius.
    fn temperature_celsius(&self) -> SensorResult<u32>;
}
