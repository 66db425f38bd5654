//! Batch report rendering.

use anyhow::Result;
use std::io::Write;

use rehome_import::{ImportOutcome, ImportReport};

use crate::cli::OutputFormat;

/// Render the batch reports to `out`.
pub fn render<W: Write>(out: &mut W, reports: &[ImportReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(reports)?)?;
        }
        OutputFormat::Table => {
            render_table(out, reports)?;
        }
    }
    Ok(())
}

fn render_table<W: Write>(out: &mut W, reports: &[ImportReport]) -> Result<()> {
    let name_width = reports
        .iter()
        .map(|report| bundle_label(report).len())
        .chain(std::iter::once("BUNDLE".len()))
        .max()
        .unwrap_or(0);

    writeln!(out, "{:<name_width$}  {:<9}  DETAIL", "BUNDLE", "OUTCOME")?;
    for report in reports {
        writeln!(
            out,
            "{:<name_width$}  {:<9}  {}",
            bundle_label(report),
            report.outcome.as_str(),
            detail_line(report)
        )?;
        for missing in report.missing_resources() {
            writeln!(out, "{:<name_width$}  {:<9}    missing: {}", "", "", missing.display())?;
        }
        for network in &report.unknown_networks {
            writeln!(
                out,
                "{:<name_width$}  {:<9}    unknown network: {}",
                "", "", network
            )?;
        }
    }
    Ok(())
}

fn bundle_label(report: &ImportReport) -> String {
    report
        .source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| report.source.display().to_string())
}

fn detail_line(report: &ImportReport) -> String {
    let mut detail = match (&report.diagnostic, &report.destination) {
        (Some(diagnostic), _) => diagnostic.clone(),
        (None, Some(destination)) => format!("-> {}", destination.display()),
        (None, None) => "-".to_string(),
    };
    if report.dry_run {
        detail.push_str(" (dry run)");
    }
    detail
}

/// Count of bundles that did not complete (failed or cancelled).
pub fn unsuccessful_count(reports: &[ImportReport]) -> usize {
    reports
        .iter()
        .filter(|report| {
            matches!(
                report.outcome,
                ImportOutcome::Failed | ImportOutcome::Cancelled
            )
        })
        .count()
}
