//! Per-bundle import reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Final outcome tier for one bundle.
///
/// `Warning` means the import completed but at least one disk resource was
/// missing on disk and needs manual reattachment; it is surfaced distinctly
/// and never conflated with `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportOutcome {
    Succeeded,
    Warning,
    Failed,
    Cancelled,
}

impl ImportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportOutcome::Succeeded => "succeeded",
            ImportOutcome::Warning => "warning",
            ImportOutcome::Failed => "failed",
            ImportOutcome::Cancelled => "cancelled",
        }
    }
}

/// Presence record for one disk resource referenced by the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCheck {
    /// Resource path as recorded in the export.
    pub path: PathBuf,
    /// Whether the path existed on this host at validation time.
    pub present: bool,
}

/// Accumulated record of one bundle's processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Unique report identifier.
    pub id: String,
    /// Host this report was produced on.
    pub host: String,
    /// Source bundle path as supplied by the caller.
    pub source: PathBuf,
    /// Computed staging destination, once known.
    pub destination: Option<PathBuf>,
    /// Disk resources referenced by the export, present or missing.
    pub resources: Vec<ResourceCheck>,
    /// Target network connections naming switches not configured on this
    /// host. Advisory only.
    pub unknown_networks: Vec<String>,
    /// Final outcome tier.
    pub outcome: ImportOutcome,
    /// Diagnostic message attached to failures and warnings.
    pub diagnostic: Option<String>,
    /// Whether this was a dry run (no filesystem or host mutations).
    pub dry_run: bool,
    /// When processing of this bundle finished.
    pub completed_at: DateTime<Utc>,
}

impl ImportReport {
    /// Start a report for a bundle. The outcome stays `Failed` until the
    /// pipeline proves otherwise.
    pub fn begin(source: &Path, dry_run: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            source: source.to_path_buf(),
            destination: None,
            resources: Vec::new(),
            unknown_networks: Vec::new(),
            outcome: ImportOutcome::Failed,
            diagnostic: None,
            dry_run,
            completed_at: Utc::now(),
        }
    }

    /// Paths of resources that were missing at validation time.
    pub fn missing_resources(&self) -> Vec<&Path> {
        self.resources
            .iter()
            .filter(|check| !check.present)
            .map(|check| check.path.as_path())
            .collect()
    }

    /// Whether any referenced resource was missing.
    pub fn has_missing_resources(&self) -> bool {
        self.resources.iter().any(|check| !check.present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resource_accessors() {
        let mut report = ImportReport::begin(Path::new("/export/VM1"), false);
        report.resources = vec![
            ResourceCheck {
                path: PathBuf::from("/disks/a.vhd"),
                present: true,
            },
            ResourceCheck {
                path: PathBuf::from("/disks/b.vhd"),
                present: false,
            },
        ];

        assert!(report.has_missing_resources());
        assert_eq!(report.missing_resources(), vec![Path::new("/disks/b.vhd")]);
    }

    #[test]
    fn test_report_serializes_outcome_lowercase() {
        let mut report = ImportReport::begin(Path::new("/export/VM1"), true);
        report.outcome = ImportOutcome::Warning;

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""outcome":"warning""#));
        assert!(json.contains(r#""dryRun":true"#));
    }
}
