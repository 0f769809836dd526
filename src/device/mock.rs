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

//! Scripted in-memory devices.
//!
//! Every sensor of every device can be set to a value or a failure at any
//! time, and every query issued through a handle is counted. Used by the test
//! suite and by the `gpu-exporter-mock` binary.

use crate::device::{
    DeviceEnumerator, MemoryUsage, SensorError, SensorReader, SensorResult, Utilization,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

const GIB: u64 = 1024 * 1024 * 1024;

/// Scripted readings for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct MockDevice {
    /// Result of looking the device up by index.
    pub handle: SensorResult<()>,
    pub clock: SensorResult<u32>,
    pub utilization: SensorResult<Utilization>,
    pub memory: SensorResult<MemoryUsage>,
    pub power: SensorResult<u32>,
    pub temperature: SensorResult<u32>,
}

impl MockDevice {
    /// A device where every sensor succeeds, with values derived from `index`.
    pub fn healthy(index: u32) -> Self {
        let total = 80 * GIB;
        let used = (10 + u64::from(index)) * GIB;
        Self {
            handle: Ok(()),
            clock: Ok(1410 + index),
            utilization: Ok(Utilization {
                gpu: 50 + index,
                memory: 30 + index,
            }),
            memory: Ok(MemoryUsage {
                total,
                free: total - used,
                used,
            }),
            power: Ok(150_000 + index * 1000),
            temperature: Ok(60 + index),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    enumeration: Option<SensorError>,
    devices: Vec<MockDevice>,
}

/// Enumerator over [`MockDevice`]s.
#[derive(Debug, Default)]
pub struct MockEnumerator {
    script: Mutex<Script>,
    queries: AtomicUsize,
}

impl MockEnumerator {
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            script: Mutex::new(Script {
                enumeration: None,
                devices,
            }),
            queries: AtomicUsize::new(0),
        }
    }

    /// `count` healthy devices.
    pub fn with_devices(count: u32) -> Self {
        Self::new((0..count).map(MockDevice::healthy).collect())
    }

    /// Mutate the script for device `index`. Out-of-range indices are ignored.
    pub fn update_device<F>(&self, index: u32, f: F)
    where
        F: FnOnce(&mut MockDevice),
    {
        if let Some(device) = self.script().devices.get_mut(index as usize) {
            f(device);
        }
    }

    /// Make `device_count` fail with `error` until cleared with `None`.
    pub fn fail_enumeration(&self, error: Option<SensorError>) {
        self.script().enumeration = error;
    }

    /// Sensor queries issued so far (handle lookups are not counted).
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panic while holding the lock cannot leave the script inconsistent.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeviceEnumerator for MockEnumerator {
    type Handle<'a> = MockHandle<'a>;

    fn device_count(&self) -> SensorResult<u32> {
        let script = self.script();
        match &script.enumeration {
            Some(error) => Err(error.clone()),
            None => Ok(script.devices.len() as u32),
        }
    }

    fn handle_for(&self, index: u32) -> SensorResult<MockHandle<'_>> {
        let device = self
            .script()
            .devices
            .get(index as usize)
            .cloned()
            .ok_or(SensorError::InvalidHandle)?;
        device.handle.clone()?;
        Ok(MockHandle {
            queries: &self.queries,
            device,
        })
    }
}

/// Snapshot of a [`MockDevice`] taken when the handle was obtained.
pub struct MockHandle<'a> {
    queries: &'a AtomicUsize,
    device: MockDevice,
}

impl MockHandle<'_> {
    fn record<T: Clone>(&self, reading: &SensorResult<T>) -> SensorResult<T> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        reading.clone()
    }
}

impl SensorReader for MockHandle<'_> {
    fn clock_mhz(&self) -> SensorResult<u32> {
        self.record(&self.device.clock)
    }

    fn utilization(&self) -> SensorResult<Utilization> {
        self.record(&self.device.utilization)
    }

    fn memory(&self) -> SensorResult<MemoryUsage> {
        self.record(&self.device.memory)
    }

    fn power_milliwatts(&self) -> SensorResult<u32> {
        self.record(&self.device.power)
    }

    fn temperature_celsius(&self) -> SensorResult<u32> {
        self.record(&self.device.temperature)
    }
}
