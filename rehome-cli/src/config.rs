//! Configuration management for the rehome CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use rehome_import::{BatchOptions, PollOptions};

use crate::cli::Args;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rehome/config.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host service backend configuration
    pub host: HostConfig,
    /// Import pipeline configuration
    pub import: ImportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if args.dev {
            self.host.backend = HostBackend::Mock;
        }

        if let Some(parallel) = args.parallel {
            self.import.parallel = parallel.max(1);
        }

        self
    }

    /// Batch options for this run.
    pub fn batch_options(&self, dry_run: bool) -> BatchOptions {
        BatchOptions {
            dry_run,
            parallel: self.import.parallel,
            poll: PollOptions {
                interval: Duration::from_millis(self.import.poll_interval_ms),
                timeout: self.import.job_timeout_secs.map(Duration::from_secs),
            },
        }
    }
}

/// Host service backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Backend type
    pub backend: HostBackend,
    /// Management shell binary used by the powershell backend
    pub shell_path: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            backend: HostBackend::Powershell,
            shell_path: "powershell.exe".to_string(),
        }
    }
}

/// Host service backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostBackend {
    /// Mock backend for testing/development
    Mock,
    /// Management shell backend
    Powershell,
}

/// Import pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Interval between job polls in milliseconds
    pub poll_interval_ms: u64,
    /// Abandon a job after this many seconds (unset tolerates any runtime)
    pub job_timeout_secs: Option<u64>,
    /// Number of bundles processed concurrently
    pub parallel: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            job_timeout_secs: None,
            parallel: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host.backend, HostBackend::Powershell);
        assert_eq!(config.import.poll_interval_ms, 1000);
        assert_eq!(config.import.parallel, 1);
        assert!(config.import.job_timeout_secs.is_none());
    }

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
host:
  backend: mock
  shell_path: pwsh
import:
  poll_interval_ms: 250
  job_timeout_secs: 900
  parallel: 4
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("Failed to parse YAML");
        assert_eq!(config.host.backend, HostBackend::Mock);
        assert_eq!(config.host.shell_path, "pwsh");
        assert_eq!(config.import.poll_interval_ms, 250);
        assert_eq!(config.import.job_timeout_secs, Some(900));
        assert_eq!(config.import.parallel, 4);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "import:\n  parallel: 2\n";
        let config: Config = serde_yaml::from_str(yaml).expect("Failed to parse YAML");
        assert_eq!(config.host.backend, HostBackend::Powershell);
        assert_eq!(config.import.parallel, 2);
        assert_eq!(config.import.poll_interval_ms, 1000);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from(["rehome", "--dev", "--parallel", "8", "/export/VM1"]);
        let config = Config::default().with_cli_overrides(&args);
        assert_eq!(config.host.backend, HostBackend::Mock);
        assert_eq!(config.import.parallel, 8);
    }

    #[test]
    fn test_parallel_override_floors_at_one() {
        let args = Args::parse_from(["rehome", "--parallel", "0", "/export/VM1"]);
        let config = Config::default().with_cli_overrides(&args);
        assert_eq!(config.import.parallel, 1);
    }

    #[test]
    fn test_batch_options_mapping() {
        let mut config = Config::default();
        config.import.poll_interval_ms = 250;
        config.import.job_timeout_secs = Some(900);

        let opts = config.batch_options(true);
        assert!(opts.dry_run);
        assert_eq!(opts.poll.interval, Duration::from_millis(250));
        assert_eq!(opts.poll.timeout, Some(Duration::from_secs(900)));
    }
}
