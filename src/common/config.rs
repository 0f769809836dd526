use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::cli::ExporterArgs;
use crate::metrics::PowerUnit;

/// Application configuration constants
pub struct AppConfig;

impl AppConfig {
    pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_INTERVAL_SECS: u64 = 5;
}

/// Runtime settings for one exporter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Pause between the end of one scrape cycle and the start of the next.
    pub interval: Duration,
    pub power_unit: PowerUnit,
}

impl ExporterConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            bind: AppConfig::DEFAULT_BIND,
            port: AppConfig::DEFAULT_PORT,
            interval: Duration::from_secs(AppConfig::DEFAULT_INTERVAL_SECS),
            power_unit: PowerUnit::Watts,
        }
    }
}

impl From<&ExporterArgs> for ExporterConfig {
    fn from(args: &ExporterArgs) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            interval: Duration::from_secs(args.interval),
            power_unit: if args.raw_power {
                PowerUnit::Milliwatts
            } else {
                PowerUnit::Watts
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let cli = Cli::parse_from(["gpu-exporter"]);
        assert_eq!(ExporterConfig::from(&cli.exporter), ExporterConfig::default());
        assert_eq!(
            ExporterConfig::default().listen_addr().to_string(),
            "0.0.0.0:8080"
        );
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "gpu-exporter",
            "--port",
            "9400",
            "--interval",
            "15",
            "--bind",
            "127.0.0.1",
            "--raw-power",
        ]);
        let config = ExporterConfig::from(&cli.exporter);
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9400");
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.power_unit, PowerUnit::Milliwatts);
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["gpu-exporter", "--interval", "0"]).is_err());
    }
}
