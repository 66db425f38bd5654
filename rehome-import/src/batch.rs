//! Import Orchestrator and batch runner.
//!
//! Drives the full pipeline for each bundle (eligibility, staging,
//! reconciliation, submission, job polling) and accumulates one report per
//! bundle. Bundles are isolated: any error is captured into that bundle's
//! report and never aborts the rest of the batch.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use rehome_host::{HostService, HostStorageDefaults};

use crate::bundle::ExportBundle;
use crate::error::{ImportError, Result};
use crate::job::{drive_import, PollOptions};
use crate::reconcile::{check_resources, reconcile, unknown_networks};
use crate::report::{ImportOutcome, ImportReport};
use crate::staging::stage_bundle;

/// Batch processing options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Report what would happen without writing to the filesystem or
    /// submitting to the host.
    pub dry_run: bool,
    /// Number of bundles processed concurrently. `1` keeps the original
    /// strictly sequential behavior.
    pub parallel: usize,
    /// Job polling configuration.
    pub poll: PollOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            parallel: 1,
            poll: PollOptions::default(),
        }
    }
}

/// Process a batch of export bundles, producing one report per bundle.
///
/// Host defaults and the configured switch list are fetched once and shared
/// read-only across the batch. With `parallel > 1` bundles are processed by
/// a bounded pool; reports are returned in completion order, which is not
/// guaranteed to match the input order.
pub async fn run_batch(
    host: Arc<dyn HostService>,
    sources: &[PathBuf],
    opts: &BatchOptions,
    cancel: &CancellationToken,
) -> Vec<ImportReport> {
    let defaults = match host.storage_defaults().await {
        Ok(defaults) => defaults,
        Err(e) => {
            error!(error = %e, "Failed to read host storage defaults");
            return sources
                .iter()
                .map(|source| {
                    let mut report = ImportReport::begin(source, opts.dry_run);
                    report.diagnostic = Some(e.to_string());
                    report.completed_at = Utc::now();
                    report
                })
                .collect();
        }
    };

    // Advisory input only; a host that cannot enumerate switches still
    // imports.
    let switches = match host.list_virtual_switches().await {
        Ok(switches) => switches,
        Err(e) => {
            warn!(error = %e, "Failed to list virtual switches, skipping network cross-check");
            Vec::new()
        }
    };

    info!(
        bundles = sources.len(),
        parallel = opts.parallel,
        dry_run = opts.dry_run,
        "Starting import batch"
    );

    if opts.parallel <= 1 {
        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            reports.push(
                process_bundle(host.as_ref(), &defaults, &switches, source, opts, cancel).await,
            );
        }
        return reports;
    }

    stream::iter(sources.iter().map(|source| {
        let host = Arc::clone(&host);
        let defaults = defaults.clone();
        let switches = switches.clone();
        async move {
            process_bundle(host.as_ref(), &defaults, &switches, source, opts, cancel).await
        }
    }))
    .buffer_unordered(opts.parallel)
    .collect()
    .await
}

/// Process one bundle, capturing any error into its report.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn process_bundle(
    host: &dyn HostService,
    defaults: &HostStorageDefaults,
    switches: &[String],
    source: &Path,
    opts: &BatchOptions,
    cancel: &CancellationToken,
) -> ImportReport {
    let mut report = ImportReport::begin(source, opts.dry_run);

    match import_bundle(host, defaults, switches, source, opts, cancel, &mut report).await {
        Ok(outcome) => report.outcome = outcome,
        Err(e) => {
            error!(error = %e, "Bundle import failed");
            report.outcome = e.outcome();
            report.diagnostic = Some(e.to_string());
        }
    }

    if report.outcome == ImportOutcome::Warning && report.diagnostic.is_none() {
        report.diagnostic = Some(format!(
            "{} resource(s) missing on disk; reattach manually after import",
            report.missing_resources().len()
        ));
    }

    report.completed_at = Utc::now();
    info!(outcome = report.outcome.as_str(), "Bundle processed");
    report
}

/// The orchestration sequence for one bundle: staging strictly precedes
/// reconciliation, which strictly precedes submission, which strictly
/// precedes polling.
async fn import_bundle(
    host: &dyn HostService,
    defaults: &HostStorageDefaults,
    switches: &[String],
    source: &Path,
    opts: &BatchOptions,
    cancel: &CancellationToken,
    report: &mut ImportReport,
) -> Result<ImportOutcome> {
    if cancel.is_cancelled() {
        return Err(ImportError::Cancelled);
    }

    let bundle = ExportBundle::open(source)?;
    let staged = stage_bundle(&bundle, defaults, opts.dry_run)?;
    report.destination = Some(staged.destination.clone());

    // In dry-run nothing was staged, so settings are read from the source.
    let settings_path = if staged.copied {
        staged.destination.as_path()
    } else {
        bundle.source()
    };

    let mut settings = host.load_import_settings(settings_path).await?;
    reconcile(&mut settings, defaults);

    report.resources = check_resources(&settings);
    report.unknown_networks = unknown_networks(&settings, switches);
    let downgraded = report.has_missing_resources();

    if opts.dry_run {
        return Ok(outcome_for(downgraded));
    }

    let response = host.submit_import(&staged.destination, &settings).await?;
    drive_import(host, response, &opts.poll, cancel).await?;

    Ok(outcome_for(downgraded))
}

fn outcome_for(missing_resources: bool) -> ImportOutcome {
    if missing_resources {
        ImportOutcome::Warning
    } else {
        ImportOutcome::Succeeded
    }
}
