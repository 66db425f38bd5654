//! Error types for the import pipeline.

use rehome_host::{HostError, JobState};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::report::ImportOutcome;

/// Errors that can occur while processing one export bundle.
///
/// Each variant carries its structured context; callers and tests match on
/// the kind rather than on formatted text.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The bundle lacks a required file or directory.
    #[error("Export bundle at {} is missing {missing}", .path.display())]
    IneligibleBundle {
        path: PathBuf,
        missing: &'static str,
    },

    /// The staging destination already exists. Staging never merges into
    /// or overwrites an existing VM's data.
    #[error("Import destination already exists: {}", .0.display())]
    DestinationConflict(PathBuf),

    /// Copying the bundle into the staging destination failed.
    #[error("Failed to stage bundle into {}: {source}", .destination.display())]
    Staging {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The host rejected the import request outright.
    #[error("Host rejected the import request with code {code}{}", detail_suffix(.detail))]
    Submission { code: u32, detail: Option<String> },

    /// The asynchronous import job reached a non-success terminal state.
    #[error("Import job ended in state {state} (code {error_code}): {error_description}")]
    JobFailed {
        state: JobState,
        error_code: u32,
        error_description: String,
    },

    /// The asynchronous import job outlived the configured timeout.
    #[error("Import job still in state {last_state} ({percent_complete}%) after {timeout:?}")]
    JobTimeout {
        timeout: Duration,
        last_state: JobState,
        percent_complete: u32,
    },

    /// The operator cancelled the batch while this bundle was in flight.
    #[error("Import cancelled by operator")]
    Cancelled,

    /// A host service call failed at the boundary.
    #[error(transparent)]
    Host(#[from] HostError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(text) => format!(": {}", text),
        None => String::new(),
    }
}

impl ImportError {
    /// The outcome tier this error maps to in a bundle's report.
    pub fn outcome(&self) -> ImportOutcome {
        match self {
            ImportError::Cancelled => ImportOutcome::Cancelled,
            _ => ImportOutcome::Failed,
        }
    }
}

/// Result type alias for import pipeline operations.
pub type Result<T> = std::result::Result<T, ImportError>;
