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

//! The scrape loop: enumerate devices, query every sensor, publish successes.
//!
//! Failures never abort a cycle. An enumeration failure skips the cycle, a
//! handle failure skips one device, and a sensor failure skips one reading;
//! in every case the gauges keep whatever value they last held.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::device::{DeviceEnumerator, SensorKind, SensorReader, SensorResult};
use crate::metrics::schema::{
    CLOCK_MHZ, MEMORY_FREE, MEMORY_TOTAL, MEMORY_USED, TEMPERATURE, UTILIZATION_GPU,
    UTILIZATION_MEMORY,
};
use crate::metrics::{MetricRegistry, MetricWrite, PowerUnit};
use crate::utils::bytes_to_mib;

/// What one scrape cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Devices reported by enumeration (0 if enumeration failed).
    pub devices: u32,
    /// Sensor queries issued.
    pub queries: usize,
    /// Registry write batches applied, one per successful query.
    pub writes: usize,
    /// Failed handle lookups and sensor queries.
    pub failures: usize,
}

pub struct Scraper<E> {
    enumerator: Arc<E>,
    registry: Arc<MetricRegistry>,
    power_unit: PowerUnit,
}

impl<E: DeviceEnumerator> Scraper<E> {
    pub fn new(enumerator: Arc<E>, registry: Arc<MetricRegistry>, power_unit: PowerUnit) -> Self {
        Self {
            enumerator,
            registry,
            power_unit,
        }
    }

    /// Run one full pass over every device and sensor.
    pub fn scrape_once(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let count = match self.enumerator.device_count() {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to get device count, skipping scrape cycle");
                return report;
            }
        };
        report.devices = count;

        for index in 0..count {
            let device = match self.enumerator.handle_for(index) {
                Ok(device) => device,
                Err(e) => {
                    tracing::warn!(gpu = index, error = %e, "Failed to get device handle");
                    report.failures += 1;
                    continue;
                }
            };
            let label = index.to_string();

            for kind in SensorKind::ALL {
                report.queries += 1;
                let writes = match self.read_sensor(&device, kind, &label) {
                    Ok(writes) => writes,
                    Err(e) => {
                        tracing::warn!(
                            gpu = index,
                            sensor = %kind,
                            error = %e,
                            "Sensor query failed, keeping previous value"
                        );
                        report.failures += 1;
                        continue;
                    }
                };
                match self.registry.apply(&writes) {
                    Ok(()) => report.writes += 1,
                    // Only reachable if the schema was not registered.
                    Err(e) => tracing::error!(
                        gpu = index,
                        sensor = %kind,
                        error = %e,
                        "Failed to publish reading"
                    ),
                }
            }
        }

        tracing::debug!(
            devices = report.devices,
            queries = report.queries,
            writes = report.writes,
            failures = report.failures,
            "Scrape cycle complete"
        );
        report
    }

    /// Query one sensor and turn the reading into gauge writes. Readings that
    /// span several gauges are returned together so they land in one batch.
    fn read_sensor<R: SensorReader>(
        &self,
        device: &R,
        kind: SensorKind,
        label: &str,
    ) -> SensorResult<Vec<MetricWrite<'static>>> {
        let write = |name: &'static str, value: f64| {
            MetricWrite::vector(name, vec![label.to_string()], value)
        };

        let writes = match kind {
            SensorKind::Clock => vec![write(CLOCK_MHZ, device.clock_mhz()? as f64)],
            SensorKind::Utilization => {
                let utilization = device.utilization()?;
                vec![
                    write(UTILIZATION_GPU, utilization.gpu as f64),
                    write(UTILIZATION_MEMORY, utilization.memory as f64),
                ]
            }
            SensorKind::Memory => {
                let memory = device.memory()?;
                vec![
                    write(MEMORY_TOTAL, bytes_to_mib(memory.total)),
                    write(MEMORY_FREE, bytes_to_mib(memory.free)),
                    write(MEMORY_USED, bytes_to_mib(memory.used)),
                ]
            }
            SensorKind::Power => {
                let milliwatts = device.power_milliwatts()?;
                vec![write(
                    self.power_unit.metric_name(),
                    self.power_unit.convert(milliwatts),
                )]
            }
            SensorKind::Temperature => {
                vec![write(TEMPERATURE, device.temperature_celsius()? as f64)]
            }
        };
        Ok(writes)
    }
}

impl<E: DeviceEnumerator + 'static> Scraper<E> {
    /// Scrape, sleep `interval`, repeat until `cancel` fires.
    ///
    /// A cycle that overruns the interval delays the next one rather than
    /// overlapping it.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        tracing::info!("Scrape loop started, interval {interval:?}");
        while !cancel.is_cancelled() {
            self.scrape_once();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::info!("Scrape loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{MockEnumerator, SensorError};
    use crate::metrics::register_gpu_metrics;
    use crate::metrics::schema::POWER_WATTS;

    fn setup(mock: Arc<MockEnumerator>) -> (Scraper<MockEnumerator>, Arc<MetricRegistry>) {
        let registry = Arc::new(MetricRegistry::new());
        register_gpu_metrics(&registry, PowerUnit::Watts).unwrap();
        (
            Scraper::new(mock, registry.clone(), PowerUnit::Watts),
            registry,
        )
    }

    #[test]
    fn test_query_count_per_cycle() {
        for count in [0, 1, 3] {
            let mock = Arc::new(MockEnumerator::with_devices(count));
            let (scraper, _) = setup(mock.clone());
            let report = scraper.scrape_once();
            let expected = count as usize * SensorKind::ALL.len();
            assert_eq!(report.queries, expected);
            assert_eq!(report.writes, expected);
            assert_eq!(mock.query_count(), expected);
        }
    }

    #[test]
    fn test_enumeration_failure_skips_cycle() {
        let mock = Arc::new(MockEnumerator::with_devices(2));
        mock.fail_enumeration(Some(SensorError::QueryFailed("driver reset".to_string())));
        let (scraper, registry) = setup(mock.clone());

        let report = scraper.scrape_once();
        assert_eq!(report, CycleReport::default());
        assert_eq!(mock.query_count(), 0);
        assert_eq!(registry.render(), "");
    }

    #[test]
    fn test_handle_failure_skips_only_that_device() {
        let mock = Arc::new(MockEnumerator::with_devices(2));
        mock.update_device(0, |d| d.handle = Err(SensorError::InvalidHandle));
        let (scraper, registry) = setup(mock);

        let report = scraper.scrape_once();
        assert_eq!(report.queries, SensorKind::ALL.len());
        assert_eq!(report.failures, 1);
        assert_eq!(registry.value(TEMPERATURE, &["0"]), None);
        assert_eq!(registry.value(TEMPERATURE, &["1"]), Some(61.0));
    }

    #[test]
    fn test_failed_read_keeps_previous_value() {
        let mock = Arc::new(MockEnumerator::with_devices(1));
        let (scraper, registry) = setup(mock.clone());
        scraper.scrape_once();
        assert_eq!(registry.value(POWER_WATTS, &["0"]), Some(150.0));

        mock.update_device(0, |d| {
            d.power = Err(SensorError::Unsupported);
            d.clock = Ok(1800);
        });
        let report = scraper.scrape_once();
        assert_eq!(report.failures, 1);
        assert_eq!(registry.value(POWER_WATTS, &["0"]), Some(150.0));
        assert_eq!(registry.value(CLOCK_MHZ, &["0"]), Some(1800.0));
    }

    #[test]
    fn test_memory_published_in_mib() {
        let mock = Arc::new(MockEnumerator::with_devices(1));
        let (scraper, registry) = setup(mock);
        scraper.scrape_once();
        assert_eq!(registry.value(MEMORY_TOTAL, &["0"]), Some(81920.0));
        assert_eq!(registry.value(MEMORY_USED, &["0"]), Some(10240.0));
        assert_eq!(registry.value(MEMORY_FREE, &["0"]), Some(71680.0));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mock = Arc::new(MockEnumerator::with_devices(1));
        let (scraper, _) = setup(mock.clone());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scraper.run(Duration::from_secs(3600), cancel.clone()));

        // The first cycle runs immediately, then the loop sleeps.
        while mock.query_count() < SensorKind::ALL.len() {
            tokio::task::yield_now().await;
        }
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scrape loop did not stop")
            .unwrap();
        assert_eq!(mock.query_count(), SensorKind::ALL.len());
    }
}
