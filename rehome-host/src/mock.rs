//! Mock host service backend for testing and development.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{HostError, Result};
use crate::traits::HostService;
use crate::types::*;

/// Mock host service for testing.
///
/// Simulates the management service in memory without touching a real
/// hypervisor. Storage defaults, configured switches, per-path import
/// settings, the submission return code, and the sequence of job statuses
/// handed out by [`HostService::job_status`] are all scriptable. Every
/// operation is counted so tests can assert that a pipeline stage made no
/// host call at all.
pub struct MockHost {
    defaults: HostStorageDefaults,
    switches: Vec<String>,
    settings: HashMap<PathBuf, ImportSettings>,
    submit_return_code: u32,
    submit_error_description: Option<String>,
    job_script: Mutex<VecDeque<JobStatus>>,
    submitted: Mutex<Vec<(PathBuf, ImportSettings)>>,
    defaults_calls: AtomicUsize,
    switch_calls: AtomicUsize,
    settings_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl MockHost {
    /// Create a mock host with the given storage defaults.
    ///
    /// Submissions complete synchronously ([`RETURN_COMPLETED`]) until a
    /// job script is installed with [`MockHost::with_job_script`].
    pub fn new(defaults: HostStorageDefaults) -> Self {
        info!("Creating mock host service backend");
        Self {
            defaults,
            switches: Vec::new(),
            settings: HashMap::new(),
            submit_return_code: RETURN_COMPLETED,
            submit_error_description: None,
            job_script: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            defaults_calls: AtomicUsize::new(0),
            switch_calls: AtomicUsize::new(0),
            settings_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// Set the configured virtual switch names.
    pub fn with_switches(mut self, switches: Vec<String>) -> Self {
        self.switches = switches;
        self
    }

    /// Register the import settings parsed for a bundle path.
    pub fn with_settings(mut self, path: impl Into<PathBuf>, settings: ImportSettings) -> Self {
        self.settings.insert(path.into(), settings);
        self
    }

    /// Set the return code handed back by [`HostService::submit_import`].
    pub fn with_submit_return_code(mut self, code: u32) -> Self {
        self.submit_return_code = code;
        self
    }

    /// Attach an error description to submission rejections.
    pub fn with_submit_error(mut self, description: impl Into<String>) -> Self {
        self.submit_error_description = Some(description.into());
        self
    }

    /// Script the job statuses returned by successive polls, in order.
    ///
    /// The final entry is sticky: once the script is down to one status,
    /// every further poll sees it again, so a pipeline may poll the
    /// terminal state arbitrarily many times.
    pub fn with_job_script(mut self, statuses: Vec<JobStatus>) -> Self {
        self.job_script = Mutex::new(statuses.into());
        self
    }

    /// Submissions recorded so far, oldest first.
    pub fn submitted(&self) -> Vec<(PathBuf, ImportSettings)> {
        self.submitted
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }

    /// Total calls to any host operation.
    pub fn total_calls(&self) -> usize {
        self.defaults_calls.load(Ordering::SeqCst)
            + self.switch_calls.load(Ordering::SeqCst)
            + self.settings_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
    }

    /// Calls to [`HostService::submit_import`].
    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Calls to [`HostService::job_status`].
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Calls to [`HostService::load_import_settings`].
    pub fn settings_calls(&self) -> usize {
        self.settings_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostService for MockHost {
    async fn storage_defaults(&self) -> Result<HostStorageDefaults> {
        self.defaults_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.defaults.clone())
    }

    async fn list_virtual_switches(&self) -> Result<Vec<String>> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        debug!(count = self.switches.len(), "Listed mock virtual switches");
        Ok(self.switches.clone())
    }

    async fn load_import_settings(&self, path: &Path) -> Result<ImportSettings> {
        self.settings_calls.fetch_add(1, Ordering::SeqCst);
        self.settings
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::SettingsNotFound(path.display().to_string()))
    }

    async fn submit_import(
        &self,
        path: &Path,
        settings: &ImportSettings,
    ) -> Result<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        info!(path = %path.display(), code = self.submit_return_code, "Mock import submitted");

        self.submitted
            .lock()
            .map_err(|_| HostError::Internal("Lock poisoned".to_string()))?
            .push((path.to_path_buf(), settings.clone()));

        let job = if self.submit_return_code == RETURN_JOB_STARTED {
            Some(JobId::from("mock-import-job"))
        } else {
            None
        };

        Ok(SubmitResponse {
            return_code: self.submit_return_code,
            job,
            error_description: self.submit_error_description.clone(),
        })
    }

    async fn job_status(&self, job: &JobId) -> Result<JobStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self
            .job_script
            .lock()
            .map_err(|_| HostError::Internal("Lock poisoned".to_string()))?;

        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        status.ok_or_else(|| HostError::JobNotFound(job.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> HostStorageDefaults {
        HostStorageDefaults {
            external_data_root: PathBuf::from("/data"),
            default_vhd_path: PathBuf::from("/data/vhd"),
        }
    }

    fn settings() -> ImportSettings {
        ImportSettings {
            reuse_existing_id: false,
            create_copy_of_data: true,
            snapshot_data_root: PathBuf::from("/old/snapshots"),
            current_resource_paths: vec![PathBuf::from("/disks/a.vhd")],
            source_resource_paths: Vec::new(),
            source_network_connections: vec!["External".to_string()],
            target_network_connections: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_settings_lookup_by_path() {
        let host = MockHost::new(defaults()).with_settings("/staged/VM1", settings());

        let loaded = host
            .load_import_settings(Path::new("/staged/VM1"))
            .await
            .unwrap();
        assert_eq!(loaded, settings());

        let missing = host.load_import_settings(Path::new("/staged/VM2")).await;
        assert!(matches!(missing, Err(HostError::SettingsNotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_records_settings_and_returns_job() {
        let host = MockHost::new(defaults()).with_submit_return_code(RETURN_JOB_STARTED);

        let response = host
            .submit_import(Path::new("/staged/VM1"), &settings())
            .await
            .unwrap();
        assert_eq!(response.return_code, RETURN_JOB_STARTED);
        assert!(response.job.is_some());

        let recorded = host.submitted();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, PathBuf::from("/staged/VM1"));
        assert_eq!(host.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_job_script_final_status_is_sticky() {
        let host = MockHost::new(defaults()).with_job_script(vec![
            JobStatus::active(JobState::Starting, 0, "Importing"),
            JobStatus::completed("Importing"),
        ]);
        let job = JobId::from("mock-import-job");

        let first = host.job_status(&job).await.unwrap();
        assert_eq!(first.state, JobState::Starting);

        for _ in 0..3 {
            let status = host.job_status(&job).await.unwrap();
            assert_eq!(status.state, JobState::CompletedSuccessfully);
        }
        assert_eq!(host.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_script_reports_unknown_job() {
        let host = MockHost::new(defaults());
        let result = host.job_status(&JobId::from("nope")).await;
        assert!(matches!(result, Err(HostError::JobNotFound(_))));
    }
}
