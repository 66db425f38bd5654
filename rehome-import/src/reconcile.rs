//! Settings reconciliation against host-current state.

use tracing::{debug, warn};

use rehome_host::{HostStorageDefaults, ImportSettings};

use crate::report::ResourceCheck;

/// Reconcile an export's recorded settings against the current host.
///
/// Applied exactly once per bundle, after the settings are read and before
/// submission. The export's own values are never trusted over host-current
/// state, except for the recorded resource paths and network connections,
/// which identify *what* to reconnect rather than *where* host-default
/// storage lives.
pub fn reconcile(settings: &mut ImportSettings, defaults: &HostStorageDefaults) {
    settings.reuse_existing_id = true;
    settings.create_copy_of_data = false;
    settings.snapshot_data_root = defaults.default_vhd_path.clone();
    settings.source_resource_paths = settings.current_resource_paths.clone();
    settings.target_network_connections = settings.source_network_connections.clone();

    debug!(
        snapshot_data_root = %settings.snapshot_data_root.display(),
        resources = settings.source_resource_paths.len(),
        networks = settings.target_network_connections.len(),
        "Import settings reconciled"
    );
}

/// Check filesystem existence of every reconciled resource path.
///
/// Missing resources are expected for configuration-only exports and never
/// block the import; they downgrade the bundle's outcome to `warning` so
/// the operator knows to reattach them after import.
pub fn check_resources(settings: &ImportSettings) -> Vec<ResourceCheck> {
    settings
        .source_resource_paths
        .iter()
        .map(|path| {
            let present = path.exists();
            if !present {
                warn!(
                    resource = %path.display(),
                    "Resource missing on disk, reattach manually after import"
                );
            }
            ResourceCheck {
                path: path.clone(),
                present,
            }
        })
        .collect()
}

/// Target network connections naming switches not configured on the host.
///
/// Advisory only: the result is recorded and logged, never enforced as a
/// submission precondition.
pub fn unknown_networks(settings: &ImportSettings, switches: &[String]) -> Vec<String> {
    let unknown: Vec<String> = settings
        .target_network_connections
        .iter()
        .filter(|name| !switches.contains(name))
        .cloned()
        .collect();

    for name in &unknown {
        warn!(network = %name, "Target network is not a configured virtual switch");
    }

    unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn exported_settings() -> ImportSettings {
        ImportSettings {
            reuse_existing_id: false,
            create_copy_of_data: true,
            snapshot_data_root: PathBuf::from("/old-host/snapshots"),
            current_resource_paths: vec![
                PathBuf::from("/disks/vm1.vhd"),
                PathBuf::from("/disks/vm1-data.vhd"),
            ],
            source_resource_paths: vec![PathBuf::from("/stale/from-export.vhd")],
            source_network_connections: vec!["External".to_string(), "Legacy".to_string()],
            target_network_connections: vec!["Stale".to_string()],
        }
    }

    fn defaults() -> HostStorageDefaults {
        HostStorageDefaults {
            external_data_root: PathBuf::from("/data"),
            default_vhd_path: PathBuf::from("/data/vhd"),
        }
    }

    #[test]
    fn test_overrides_ignore_exported_values() {
        let mut settings = exported_settings();
        reconcile(&mut settings, &defaults());

        assert!(settings.reuse_existing_id);
        assert!(!settings.create_copy_of_data);
        assert_eq!(settings.snapshot_data_root, PathBuf::from("/data/vhd"));
        assert_eq!(
            settings.source_resource_paths,
            settings.current_resource_paths
        );
        assert_eq!(
            settings.target_network_connections,
            settings.source_network_connections
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut once = exported_settings();
        reconcile(&mut once, &defaults());
        let mut twice = once.clone();
        reconcile(&mut twice, &defaults());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_check_resources_flags_missing_paths() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("vm1.vhd");
        fs::write(&present, "vhd").unwrap();
        let absent = dir.path().join("gone.vhd");

        let mut settings = exported_settings();
        settings.source_resource_paths = vec![present.clone(), absent.clone()];

        let checks = check_resources(&settings);
        assert_eq!(checks.len(), 2);
        assert!(checks[0].present);
        assert_eq!(checks[0].path, present);
        assert!(!checks[1].present);
        assert_eq!(checks[1].path, absent);
    }

    #[test]
    fn test_unknown_networks_is_advisory_set_difference() {
        let mut settings = exported_settings();
        reconcile(&mut settings, &defaults());

        let switches = vec!["External".to_string(), "Internal".to_string()];
        assert_eq!(
            unknown_networks(&settings, &switches),
            vec!["Legacy".to_string()]
        );

        let all_known = vec!["External".to_string(), "Legacy".to_string()];
        assert!(unknown_networks(&settings, &all_known).is_empty());
    }
}
