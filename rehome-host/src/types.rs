//! Type definitions for host storage defaults, import settings, and jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Return code for a synchronously completed management operation.
pub const RETURN_COMPLETED: u32 = 0;

/// Return code indicating the operation continues as an asynchronous job.
pub const RETURN_JOB_STARTED: u32 = 4096;

// =============================================================================
// HOST CONFIGURATION
// =============================================================================

/// Host-wide storage defaults, read once per batch run.
///
/// Owned by the management service; read-only to this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStorageDefaults {
    /// Default external VM data root. Staged bundles land under
    /// `<external_data_root>/Virtual Machines/<bundle name>`.
    pub external_data_root: PathBuf,
    /// Default virtual hard disk path.
    pub default_vhd_path: PathBuf,
}

// =============================================================================
// IMPORT SETTINGS
// =============================================================================

/// Import settings parsed from a staged bundle's on-disk descriptor.
///
/// The export's recorded values are never trusted over host-current state:
/// before submission the orchestrator forces `reuse_existing_id` on, forces
/// `create_copy_of_data` off, points `snapshot_data_root` at the host's
/// default VHD path, and carries the bundle's own recorded resource paths
/// and network connections into the `source_*`/`target_*` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    /// Keep the exported system identifier instead of generating a new one.
    pub reuse_existing_id: bool,
    /// Duplicate the exported data on import instead of importing in place.
    pub create_copy_of_data: bool,
    /// Root directory for snapshot data after import.
    pub snapshot_data_root: PathBuf,
    /// Resource paths recorded in the export at export time.
    pub current_resource_paths: Vec<PathBuf>,
    /// Resource paths submitted to the host service.
    pub source_resource_paths: Vec<PathBuf>,
    /// Network connections recorded in the export at export time.
    pub source_network_connections: Vec<String>,
    /// Network connections submitted to the host service.
    pub target_network_connections: Vec<String>,
}

// =============================================================================
// ASYNCHRONOUS JOBS
// =============================================================================

/// Opaque reference to a host-side asynchronous job.
///
/// The in-memory value never updates itself; callers re-fetch the status
/// through [`crate::HostService::job_status`] on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job state values reported by the management service.
///
/// The numeric codes follow the CIM concrete-job enumeration. The import
/// pipeline keeps polling while the state is one of `NeverStarted`,
/// `Starting`, or `Running`; `CompletedSuccessfully` is the only success
/// terminal and every other value, enumerated or not, is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Job is queued and has not started.
    NeverStarted,
    /// Job is starting.
    Starting,
    /// Job is running.
    Running,
    /// Job is suspended.
    Suspended,
    /// Job is shutting down.
    ShuttingDown,
    /// Job completed successfully.
    CompletedSuccessfully,
    /// Job was terminated.
    Terminated,
    /// Job was killed.
    Killed,
    /// Job failed with an exception.
    Exception,
    /// Job is in service mode.
    Service,
    /// Unrecognized state code.
    Other(u16),
}

impl From<u16> for JobState {
    fn from(value: u16) -> Self {
        match value {
            2 => JobState::NeverStarted,
            3 => JobState::Starting,
            4 => JobState::Running,
            5 => JobState::Suspended,
            6 => JobState::ShuttingDown,
            7 => JobState::CompletedSuccessfully,
            8 => JobState::Terminated,
            9 => JobState::Killed,
            10 => JobState::Exception,
            11 => JobState::Service,
            other => JobState::Other(other),
        }
    }
}

impl JobState {
    /// Numeric code as reported by the service.
    pub fn code(&self) -> u16 {
        match self {
            JobState::NeverStarted => 2,
            JobState::Starting => 3,
            JobState::Running => 4,
            JobState::Suspended => 5,
            JobState::ShuttingDown => 6,
            JobState::CompletedSuccessfully => 7,
            JobState::Terminated => 8,
            JobState::Killed => 9,
            JobState::Exception => 10,
            JobState::Service => 11,
            JobState::Other(code) => *code,
        }
    }

    /// True while the import pipeline should keep polling.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::NeverStarted | JobState::Starting | JobState::Running
        )
    }

    /// True only for the successful terminal state.
    pub fn is_completed(&self) -> bool {
        *self == JobState::CompletedSuccessfully
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::NeverStarted => write!(f, "NeverStarted"),
            JobState::Starting => write!(f, "Starting"),
            JobState::Running => write!(f, "Running"),
            JobState::Suspended => write!(f, "Suspended"),
            JobState::ShuttingDown => write!(f, "ShuttingDown"),
            JobState::CompletedSuccessfully => write!(f, "CompletedSuccessfully"),
            JobState::Terminated => write!(f, "Terminated"),
            JobState::Killed => write!(f, "Killed"),
            JobState::Exception => write!(f, "Exception"),
            JobState::Service => write!(f, "Service"),
            JobState::Other(code) => write!(f, "State({})", code),
        }
    }
}

/// Point-in-time snapshot of an asynchronous job.
#[derive(Debug, Clone)]
pub struct JobStatus {
    /// Current job state.
    pub state: JobState,
    /// Percent complete (0-100). Not guaranteed monotonic across polls.
    pub percent_complete: u32,
    /// Human-readable description of what the job is doing.
    pub caption: String,
    /// Error code, populated on terminal failure.
    pub error_code: Option<u32>,
    /// Error description, populated on terminal failure.
    pub error_description: Option<String>,
}

impl JobStatus {
    /// Build an in-progress status.
    pub fn active(state: JobState, percent_complete: u32, caption: impl Into<String>) -> Self {
        Self {
            state,
            percent_complete,
            caption: caption.into(),
            error_code: None,
            error_description: None,
        }
    }

    /// Build a successful terminal status.
    pub fn completed(caption: impl Into<String>) -> Self {
        Self {
            state: JobState::CompletedSuccessfully,
            percent_complete: 100,
            caption: caption.into(),
            error_code: None,
            error_description: None,
        }
    }

    /// Build a failed terminal status.
    pub fn failed(state: JobState, error_code: u32, error_description: impl Into<String>) -> Self {
        Self {
            state,
            percent_complete: 0,
            caption: String::new(),
            error_code: Some(error_code),
            error_description: Some(error_description.into()),
        }
    }
}

/// Immediate response from an import submission.
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    /// Raw return code. [`RETURN_COMPLETED`] means synchronous success,
    /// [`RETURN_JOB_STARTED`] means an asynchronous job was created, and
    /// anything else is a rejection.
    pub return_code: u32,
    /// Job reference, populated when `return_code` is [`RETURN_JOB_STARTED`].
    pub job: Option<JobId>,
    /// Error description attached to an outright rejection, when available.
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_from_u16() {
        assert_eq!(JobState::from(2), JobState::NeverStarted);
        assert_eq!(JobState::from(3), JobState::Starting);
        assert_eq!(JobState::from(4), JobState::Running);
        assert_eq!(JobState::from(7), JobState::CompletedSuccessfully);
        assert_eq!(JobState::from(8), JobState::Terminated);
        assert_eq!(JobState::from(10), JobState::Exception);
        assert_eq!(JobState::from(12), JobState::Other(12));
        assert_eq!(JobState::from(0), JobState::Other(0));
    }

    #[test]
    fn test_job_state_round_trips_code() {
        for code in 0..16u16 {
            assert_eq!(JobState::from(code).code(), code);
        }
    }

    #[test]
    fn test_active_states_are_exactly_2_3_4() {
        for code in 0..16u16 {
            let state = JobState::from(code);
            assert_eq!(state.is_active(), (2..=4).contains(&code), "code {code}");
        }
    }

    #[test]
    fn test_only_state_7_is_completed() {
        for code in 0..16u16 {
            let state = JobState::from(code);
            assert_eq!(state.is_completed(), code == 7, "code {code}");
        }
    }

    #[test]
    fn test_suspended_is_not_active() {
        // A suspended or shutting-down job leaves the polling loop and is
        // reported as a failure rather than waited on.
        assert!(!JobState::Suspended.is_active());
        assert!(!JobState::ShuttingDown.is_active());
        assert!(!JobState::Suspended.is_completed());
    }

    #[test]
    fn test_job_state_display() {
        assert_eq!(format!("{}", JobState::Running), "Running");
        assert_eq!(
            format!("{}", JobState::CompletedSuccessfully),
            "CompletedSuccessfully"
        );
        assert_eq!(format!("{}", JobState::Other(42)), "State(42)");
    }
}
