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

use clap::{Args, Parser};
use std::net::IpAddr;

use crate::common::config::AppConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub exporter: ExporterArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExporterArgs {
    /// The port to listen on for the metrics endpoint.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_PORT)]
    pub port: u16,
    /// The address to bind the metrics endpoint to.
    #[arg(short, long, default_value_t = AppConfig::DEFAULT_BIND)]
    pub bind: IpAddr,
    /// The interval in seconds between scrape cycles.
    #[arg(
        short,
        long,
        default_value_t = AppConfig::DEFAULT_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,
    /// Publish power draw in milliwatts, as reported by NVML, instead of watts.
    #[arg(long)]
    pub raw_power: bool,
}
