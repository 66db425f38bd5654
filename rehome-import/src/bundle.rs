//! Export bundle model and eligibility validation.

use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};

/// Settings descriptor file every eligible bundle must carry.
pub const SETTINGS_DESCRIPTOR: &str = "config.xml";

/// Subdirectory holding the exported VM configuration payload.
pub const CONFIG_SUBDIR: &str = "Virtual Machines";

/// A configuration-only export bundle on disk.
///
/// The bundle directory is externally owned and read-only to this system;
/// the only thing rehome ever does with it is copy it elsewhere.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    source: PathBuf,
    name: String,
}

impl ExportBundle {
    /// Open a bundle at `source`, validating its on-disk layout.
    ///
    /// The bundle name is the final path segment. Eligibility requires both
    /// the settings descriptor and the configuration subdirectory to exist.
    pub fn open(source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();

        let name = source
            .file_name()
            .map(|segment| segment.to_string_lossy().to_string())
            .ok_or_else(|| ImportError::IneligibleBundle {
                path: source.clone(),
                missing: "a directory name",
            })?;

        if !source.join(SETTINGS_DESCRIPTOR).is_file() {
            return Err(ImportError::IneligibleBundle {
                path: source,
                missing: "the settings descriptor (config.xml)",
            });
        }

        if !source.join(CONFIG_SUBDIR).is_dir() {
            return Err(ImportError::IneligibleBundle {
                path: source,
                missing: "the configuration subdirectory (Virtual Machines)",
            });
        }

        Ok(Self { source, name })
    }

    /// Source directory of the bundle.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Bundle name, derived from the final path segment.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_bundle(root: &Path, name: &str) -> PathBuf {
        let bundle = root.join(name);
        fs::create_dir_all(bundle.join(CONFIG_SUBDIR)).unwrap();
        fs::write(bundle.join(SETTINGS_DESCRIPTOR), "<configuration/>").unwrap();
        bundle
    }

    #[test]
    fn test_open_valid_bundle() {
        let dir = TempDir::new().unwrap();
        let path = make_bundle(dir.path(), "VM1");

        let bundle = ExportBundle::open(&path).unwrap();
        assert_eq!(bundle.name(), "VM1");
        assert_eq!(bundle.source(), path.as_path());
    }

    #[test]
    fn test_missing_descriptor_is_ineligible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VM1");
        fs::create_dir_all(path.join(CONFIG_SUBDIR)).unwrap();

        let result = ExportBundle::open(&path);
        assert!(matches!(
            result,
            Err(ImportError::IneligibleBundle { missing, .. }) if missing.contains("config.xml")
        ));
    }

    #[test]
    fn test_missing_config_subdir_is_ineligible() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VM1");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(SETTINGS_DESCRIPTOR), "<configuration/>").unwrap();

        let result = ExportBundle::open(&path);
        assert!(matches!(
            result,
            Err(ImportError::IneligibleBundle { missing, .. }) if missing.contains("Virtual Machines")
        ));
    }
}
