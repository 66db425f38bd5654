//! Command-line argument parsing.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// rehome - Restore configuration-only VM exports into the host inventory
#[derive(Parser, Debug)]
#[command(name = "rehome")]
#[command(about = "rehome - Restore configuration-only VM exports into the host inventory")]
#[command(version)]
pub struct Args {
    /// Export bundle directories to import
    #[arg(required = true)]
    pub bundles: Vec<PathBuf>,

    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON (for log aggregation)
    #[arg(long)]
    pub json_logs: bool,

    /// Report what would happen without staging or importing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of bundles to process concurrently
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Output format for the batch report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Enable development mode (mock host service)
    #[arg(long)]
    pub dev: bool,
}

/// Report output format.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Pretty-printed JSON.
    Json,
}
