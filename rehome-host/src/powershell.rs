//! PowerShell-backed host service backend.
//!
//! Reaches the hypervisor's virtualization management service through the
//! host's management shell instead of binding to a COM/RPC API directly.
//! Each logical operation is a single `powershell.exe` invocation whose
//! script emits JSON (`ConvertTo-Json`) for parsing on this side.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{HostError, Result};
use crate::traits::HostService;
use crate::types::*;

/// WMI namespace hosting the virtualization management service.
const VIRT_NAMESPACE: &str = r"root\virtualization";

/// PowerShell-backed host service.
pub struct PowerShellHost {
    shell_path: String,
}

impl PowerShellHost {
    /// Create a backend using the platform `powershell.exe`.
    pub fn new() -> Self {
        Self {
            shell_path: "powershell.exe".to_string(),
        }
    }

    /// Set the shell binary path.
    pub fn with_shell(mut self, path: impl Into<String>) -> Self {
        self.shell_path = path.into();
        self
    }

    /// Check that the management shell is available.
    pub async fn check_shell(&self) -> Result<String> {
        let stdout = self
            .run("$PSVersionTable.PSVersion.ToString()")
            .await?;
        Ok(stdout.trim().to_string())
    }

    /// Run a script fragment and return its stdout.
    async fn run(&self, script: &str) -> Result<String> {
        debug!(shell = %self.shell_path, "Invoking management shell");

        let output = Command::new(&self.shell_path)
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()
            .await
            .map_err(|e| HostError::Invocation(e.to_string()))?;

        if !output.status.success() {
            return Err(HostError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn parse<T: for<'de> Deserialize<'de>>(&self, stdout: &str) -> Result<T> {
        serde_json::from_str(stdout.trim()).map_err(|e| HostError::MalformedOutput(e.to_string()))
    }
}

impl Default for PowerShellHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote a value for single-quoted PowerShell string literals.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a list of values as a PowerShell array literal.
fn ps_array(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| ps_quote(v)).collect();
    format!("@({})", quoted.join(", "))
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

// JSON shapes emitted by the script fragments below.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsDto {
    external_data_root: String,
    default_vhd_path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsDto {
    reuse_existing_id: bool,
    create_copy_of_data: bool,
    snapshot_data_root: String,
    #[serde(default)]
    current_resource_paths: Vec<String>,
    #[serde(default)]
    source_resource_paths: Vec<String>,
    #[serde(default)]
    source_network_connections: Vec<String>,
    #[serde(default)]
    target_network_connections: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitDto {
    return_value: u32,
    job: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobDto {
    job_state: u16,
    percent_complete: u32,
    caption: Option<String>,
    error_code: Option<u32>,
    error_description: Option<String>,
}

/// One name, or an array of names. `ConvertTo-Json` collapses single-item
/// pipelines to a bare value.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(name) => vec![name],
            OneOrMany::Many(names) => names,
        }
    }
}

fn settings_script(path: &Path) -> String {
    format!(
        r#"$svc = Get-WmiObject -Namespace {ns} -Class Msvm_VirtualSystemManagementService
$sd = ([WMI]($svc.GetVirtualSystemImportSettingData({path})).ImportSettingData)
@{{
  reuseExistingId = -not $sd.GenerateNewId
  createCopyOfData = [bool]$sd.CreateCopy
  snapshotDataRoot = [string]$sd.SnapshotDataRoot
  currentResourcePaths = @($sd.CurrentResourcePaths)
  sourceResourcePaths = @($sd.SourceResourcePaths)
  sourceNetworkConnections = @($sd.SourceNetworkConnections)
  targetNetworkConnections = @($sd.TargetNetworkConnections)
}} | ConvertTo-Json"#,
        ns = VIRT_NAMESPACE,
        path = ps_quote(&path_string(path)),
    )
}

fn submit_script(path: &Path, settings: &ImportSettings) -> String {
    let resource_paths: Vec<String> = settings
        .source_resource_paths
        .iter()
        .map(|p| path_string(p))
        .collect();
    format!(
        r#"$svc = Get-WmiObject -Namespace {ns} -Class Msvm_VirtualSystemManagementService
$sd = ([WMI]($svc.GetVirtualSystemImportSettingData({path})).ImportSettingData)
$sd.GenerateNewId = {generate_new_id}
$sd.CreateCopy = {create_copy}
$sd.SnapshotDataRoot = {snapshot_root}
$sd.SourceResourcePaths = {resource_paths}
$sd.TargetNetworkConnections = {networks}
$r = $svc.ImportVirtualSystemEx({path}, $sd.PSBase.GetText(1))
@{{
  returnValue = $r.ReturnValue
  job = [string]$r.Job
  errorDescription = $null
}} | ConvertTo-Json"#,
        ns = VIRT_NAMESPACE,
        path = ps_quote(&path_string(path)),
        generate_new_id = ps_bool(!settings.reuse_existing_id),
        create_copy = ps_bool(settings.create_copy_of_data),
        snapshot_root = ps_quote(&path_string(&settings.snapshot_data_root)),
        resource_paths = ps_array(&resource_paths),
        networks = ps_array(&settings.target_network_connections),
    )
}

fn ps_bool(value: bool) -> &'static str {
    if value {
        "$true"
    } else {
        "$false"
    }
}

#[async_trait]
impl HostService for PowerShellHost {
    #[instrument(skip(self))]
    async fn storage_defaults(&self) -> Result<HostStorageDefaults> {
        let script = format!(
            r#"$s = Get-WmiObject -Namespace {ns} -Class Msvm_VirtualSystemManagementServiceSettingData
@{{
  externalDataRoot = [string]$s.DefaultExternalDataRoot
  defaultVhdPath = [string]$s.DefaultVirtualHardDiskPath
}} | ConvertTo-Json"#,
            ns = VIRT_NAMESPACE,
        );

        let stdout = self.run(&script).await?;
        let dto: DefaultsDto = self.parse(&stdout)?;
        Ok(HostStorageDefaults {
            external_data_root: dto.external_data_root.into(),
            default_vhd_path: dto.default_vhd_path.into(),
        })
    }

    #[instrument(skip(self))]
    async fn list_virtual_switches(&self) -> Result<Vec<String>> {
        let script = format!(
            r#"@(Get-WmiObject -Namespace {ns} -Class Msvm_VirtualSwitch | Select-Object -ExpandProperty ElementName) | ConvertTo-Json"#,
            ns = VIRT_NAMESPACE,
        );

        let stdout = self.run(&script).await?;
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        let names: OneOrMany = self.parse(&stdout)?;
        Ok(names.into())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn load_import_settings(&self, path: &Path) -> Result<ImportSettings> {
        let stdout = self.run(&settings_script(path)).await?;
        let dto: SettingsDto = self.parse(&stdout)?;
        Ok(ImportSettings {
            reuse_existing_id: dto.reuse_existing_id,
            create_copy_of_data: dto.create_copy_of_data,
            snapshot_data_root: dto.snapshot_data_root.into(),
            current_resource_paths: dto.current_resource_paths.into_iter().map(Into::into).collect(),
            source_resource_paths: dto.source_resource_paths.into_iter().map(Into::into).collect(),
            source_network_connections: dto.source_network_connections,
            target_network_connections: dto.target_network_connections,
        })
    }

    #[instrument(skip(self, settings), fields(path = %path.display()))]
    async fn submit_import(
        &self,
        path: &Path,
        settings: &ImportSettings,
    ) -> Result<SubmitResponse> {
        let stdout = self.run(&submit_script(path, settings)).await?;
        let dto: SubmitDto = self.parse(&stdout)?;

        let job = match dto.job.as_deref() {
            Some("") | None => None,
            Some(reference) => Some(JobId::from(reference)),
        };

        Ok(SubmitResponse {
            return_code: dto.return_value,
            job,
            error_description: dto.error_description,
        })
    }

    #[instrument(skip(self), fields(job = %job))]
    async fn job_status(&self, job: &JobId) -> Result<JobStatus> {
        let script = format!(
            r#"$job = [WMI]{reference}
@{{
  jobState = [int]$job.JobState
  percentComplete = [int]$job.PercentComplete
  caption = [string]$job.Caption
  errorCode = $job.ErrorCode
  errorDescription = $job.ErrorDescription
}} | ConvertTo-Json"#,
            reference = ps_quote(job.as_str()),
        );

        let stdout = self.run(&script).await?;
        let dto: JobDto = self.parse(&stdout)?;
        Ok(JobStatus {
            state: JobState::from(dto.job_state),
            percent_complete: dto.percent_complete,
            caption: dto.caption.unwrap_or_default(),
            error_code: dto.error_code,
            error_description: dto.error_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_ps_quote_escapes_single_quotes() {
        assert_eq!(ps_quote("plain"), "'plain'");
        assert_eq!(ps_quote("it's"), "'it''s'");
    }

    #[test]
    fn test_ps_array_formatting() {
        assert_eq!(ps_array(&[]), "@()");
        assert_eq!(
            ps_array(&["a".to_string(), "b'c".to_string()]),
            "@('a', 'b''c')"
        );
    }

    #[test]
    fn test_submit_script_maps_reuse_to_generate_new_id() {
        let settings = ImportSettings {
            reuse_existing_id: true,
            create_copy_of_data: false,
            snapshot_data_root: PathBuf::from(r"D:\vhd"),
            current_resource_paths: Vec::new(),
            source_resource_paths: vec![PathBuf::from(r"D:\disks\vm1.vhd")],
            source_network_connections: Vec::new(),
            target_network_connections: vec!["External".to_string()],
        };

        let script = submit_script(Path::new(r"D:\data\Virtual Machines\VM1"), &settings);
        assert!(script.contains("$sd.GenerateNewId = $false"));
        assert!(script.contains("$sd.CreateCopy = $false"));
        assert!(script.contains(r"$sd.SnapshotDataRoot = 'D:\vhd'"));
        assert!(script.contains(r"@('D:\disks\vm1.vhd')"));
        assert!(script.contains("@('External')"));
        assert!(script.contains("ImportVirtualSystemEx"));
    }

    #[test]
    fn test_parse_submit_response() {
        let host = PowerShellHost::new();
        let dto: SubmitDto = host
            .parse(r#"{"returnValue": 4096, "job": "\\\\HOST\\root\\virtualization:Msvm_ConcreteJob.InstanceID=\"ABC\"", "errorDescription": null}"#)
            .unwrap();
        assert_eq!(dto.return_value, 4096);
        assert!(dto.job.unwrap().contains("Msvm_ConcreteJob"));
    }

    #[test]
    fn test_parse_job_status() {
        let host = PowerShellHost::new();
        let dto: JobDto = host
            .parse(r#"{"jobState": 4, "percentComplete": 40, "caption": "Importing", "errorCode": null, "errorDescription": null}"#)
            .unwrap();
        assert_eq!(JobState::from(dto.job_state), JobState::Running);
        assert_eq!(dto.percent_complete, 40);
    }

    #[test]
    fn test_switch_list_single_value_collapse() {
        let host = PowerShellHost::new();
        let one: OneOrMany = host.parse(r#""External""#).unwrap();
        let many: OneOrMany = host.parse(r#"["External", "Internal"]"#).unwrap();
        assert_eq!(Vec::<String>::from(one), vec!["External".to_string()]);
        assert_eq!(
            Vec::<String>::from(many),
            vec!["External".to_string(), "Internal".to_string()]
        );
    }
}
