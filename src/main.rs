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

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use gpu_exporter::api::{cancel_on_shutdown_signal, init_tracing, run_exporter};
use gpu_exporter::cli::Cli;
use gpu_exporter::common::config::ExporterConfig;
use gpu_exporter::device::{DeviceEnumerator, NvmlEnumerator};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let config = ExporterConfig::from(&cli.exporter);

    // Without NVML there is nothing to export.
    let enumerator = match NvmlEnumerator::init() {
        Ok(enumerator) => enumerator,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match enumerator.device_count() {
        Ok(count) => tracing::info!(
            "Found {count} GPU(s), {}",
            enumerator.driver_summary()
        ),
        Err(e) => tracing::warn!("Failed to get device count at startup: {e}"),
    }

    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());

    match run_exporter(&config, Arc::new(enumerator), cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
