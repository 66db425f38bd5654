//! Core host management service abstraction trait.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::*;

/// Host virtualization management service abstraction.
///
/// This trait covers the five logical operations a configuration-only
/// import needs, independent of how a backend reaches the service. The
/// service owns all job state; implementors must return a fresh status
/// snapshot from [`HostService::job_status`] on every call rather than a
/// cached one.
#[async_trait]
pub trait HostService: Send + Sync {
    // =========================================================================
    // Host configuration (read-only shared state)
    // =========================================================================

    /// Read the host-wide storage defaults.
    async fn storage_defaults(&self) -> Result<HostStorageDefaults>;

    /// List the names of virtual switches configured on this host.
    ///
    /// Consumed as advisory validation input only; an unknown switch name
    /// in an import's network connections does not block the import.
    async fn list_virtual_switches(&self) -> Result<Vec<String>>;

    // =========================================================================
    // Import
    // =========================================================================

    /// Parse the on-disk settings descriptor of a bundle at `path` into an
    /// [`ImportSettings`] scoped to that path.
    async fn load_import_settings(&self, path: &Path) -> Result<ImportSettings>;

    /// Submit an import of the bundle at `path` with the given settings.
    ///
    /// Returns the service's immediate return code and, for asynchronous
    /// operations, the job reference to poll.
    async fn submit_import(&self, path: &Path, settings: &ImportSettings)
        -> Result<SubmitResponse>;

    /// Fetch the current status of an asynchronous job.
    async fn job_status(&self, job: &JobId) -> Result<JobStatus>;
}
