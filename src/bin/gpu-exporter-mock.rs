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

//! Exporter backed by synthetic devices, for trying the endpoint without
//! NVIDIA hardware.

use anyhow::Result;
use clap::Parser;
use rand::{rng, Rng};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use gpu_exporter::api::{cancel_on_shutdown_signal, init_tracing, run_exporter};
use gpu_exporter::cli::ExporterArgs;
use gpu_exporter::common::config::ExporterConfig;
use gpu_exporter::device::{MemoryUsage, MockEnumerator, SensorError, SensorResult, Utilization};

#[derive(Parser)]
#[command(author, version, about = "GPU exporter serving synthetic devices", long_about = None)]
struct MockCli {
    #[command(flatten)]
    exporter: ExporterArgs,
    /// Number of synthetic GPUs.
    #[arg(long, default_value_t = 4)]
    devices: u32,
    /// Probability (0.0-1.0) that any single sensor reading fails.
    #[arg(long, default_value_t = 0.05)]
    failure_rate: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MockCli::parse();
    if !(0.0..=1.0).contains(&cli.failure_rate) {
        anyhow::bail!("--failure-rate must be between 0.0 and 1.0");
    }
    init_tracing();
    let config = ExporterConfig::from(&cli.exporter);

    let mock = Arc::new(MockEnumerator::with_devices(cli.devices));
    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());

    let jitter = tokio::spawn(jitter_devices(
        mock.clone(),
        cli.devices,
        cli.failure_rate,
        config.interval,
        cancel.clone(),
    ));

    tracing::info!("Serving {} synthetic GPU(s)", cli.devices);
    let result = run_exporter(&config, mock, cancel).await;
    jitter.await?;
    Ok(result?)
}

/// Randomize every device's readings once per interval, occasionally
/// replacing a reading with a failure.
async fn jitter_devices(
    mock: Arc<MockEnumerator>,
    devices: u32,
    failure_rate: f64,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    const TOTAL_MEMORY: u64 = 80 * 1024 * 1024 * 1024;

    loop {
        for index in 0..devices {
            let mut rng = rng();
            let used = rng.random_range(0..=TOTAL_MEMORY);
            let clock: u32 = rng.random_range(210..=1980);
            let power: u32 = rng.random_range(60_000..=400_000);
            let temperature: u32 = rng.random_range(30..=85);
            let utilization = Utilization {
                gpu: rng.random_range(0..=100),
                memory: rng.random_range(0..=100),
            };
            let fails: [bool; 4] = std::array::from_fn(|_| rng.random_bool(failure_rate));

            mock.update_device(index, |device| {
                device.clock = or_fail(clock, fails[0]);
                device.power = or_fail(power, fails[1]);
                device.temperature = or_fail(temperature, fails[2]);
                device.utilization = or_fail(utilization, fails[3]);
                device.memory = Ok(MemoryUsage {
                    total: TOTAL_MEMORY,
                    free: TOTAL_MEMORY - used,
                    used,
                });
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn or_fail<T>(value: T, fail: bool) -> SensorResult<T> {
    if fail {
        Err(SensorError::QueryFailed("synthetic failure".to_string()))
    } else {
        Ok(value)
    }
}
