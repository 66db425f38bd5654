//! # rehome
//!
//! Restores configuration-only VM exports (metadata and disk-reference
//! pointers, no disk images) into a hypervisor host's inventory. Disks are
//! expected to already reside at their recorded paths or to be moved out of
//! band; missing disks downgrade a bundle's outcome to a warning rather
//! than blocking the import.
//!
//! ## Usage
//! ```bash
//! rehome /exports/VM1 /exports/VM2
//! rehome --dry-run --format json /exports/*
//! ```

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod cli;
mod config;
mod logging;
mod render;

use cli::Args;
use config::{Config, HostBackend, DEFAULT_CONFIG_PATH};
use rehome_host::{HostService, HostStorageDefaults, MockHost, PowerShellHost};
use rehome_import::run_batch;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    logging::init_logging(&args.log_level, args.json_logs)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bundles = args.bundles.len(),
        "Starting rehome"
    );

    // Load configuration
    let config = match &args.config {
        Some(config_path) => {
            // Explicit config file provided
            match Config::load(config_path) {
                Ok(cfg) => {
                    info!(config_path = %config_path, "Configuration loaded");
                    cfg.with_cli_overrides(&args)
                }
                Err(e) => {
                    error!(error = %e, path = %config_path, "Failed to load configuration");
                    return Err(e);
                }
            }
        }
        None => {
            // Try default location, fall back to CLI-only config
            match Config::load(DEFAULT_CONFIG_PATH) {
                Ok(cfg) => {
                    info!(config_path = %DEFAULT_CONFIG_PATH, "Configuration loaded from default location");
                    cfg.with_cli_overrides(&args)
                }
                Err(_) => {
                    info!("No config file found, using CLI arguments and defaults");
                    Config::default().with_cli_overrides(&args)
                }
            }
        }
    };

    let host: Arc<dyn HostService> = match config.host.backend {
        HostBackend::Mock => Arc::new(MockHost::new(HostStorageDefaults {
            external_data_root: std::env::temp_dir().join("rehome-dev"),
            default_vhd_path: std::env::temp_dir().join("rehome-dev").join("vhd"),
        })),
        HostBackend::Powershell => {
            Arc::new(PowerShellHost::new().with_shell(config.host.shell_path.clone()))
        }
    };

    info!(
        backend = ?config.host.backend,
        parallel = config.import.parallel,
        dry_run = args.dry_run,
        "rehome configured"
    );

    // An interrupt stops polling and marks in-flight bundles cancelled; the
    // host-side jobs keep running since the service offers no cancel.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling remaining imports");
                cancel.cancel();
            }
        });
    }

    let opts = config.batch_options(args.dry_run);
    let reports = run_batch(host, &args.bundles, &opts, &cancel).await;

    let mut stdout = std::io::stdout();
    render::render(&mut stdout, &reports, args.format)?;

    let unsuccessful = render::unsuccessful_count(&reports);
    if unsuccessful > 0 {
        anyhow::bail!("{} of {} bundle(s) did not import", unsuccessful, reports.len());
    }

    Ok(())
}
