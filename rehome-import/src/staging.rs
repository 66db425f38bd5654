//! Staging Component: copies an export bundle into the host's canonical
//! VM data tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use rehome_host::HostStorageDefaults;

use crate::bundle::ExportBundle;
use crate::error::{ImportError, Result};

/// Fixed segment under the external data root where staged VMs live.
const VM_DATA_SUBDIR: &str = "Virtual Machines";

/// Outcome of staging one bundle.
#[derive(Debug, Clone)]
pub struct StagingResult {
    /// Destination computed for the bundle.
    pub destination: PathBuf,
    /// Whether the copy was performed (false in dry-run).
    pub copied: bool,
}

/// Compute the staging destination for a bundle.
pub fn staging_destination(bundle: &ExportBundle, defaults: &HostStorageDefaults) -> PathBuf {
    defaults
        .external_data_root
        .join(VM_DATA_SUBDIR)
        .join(bundle.name())
}

/// Stage a bundle into `<external_data_root>/Virtual Machines/<name>`.
///
/// The destination is claimed with an exclusive directory create so that
/// two concurrent bundles computing the same destination cannot race past
/// the conflict check. A pre-existing destination fails the bundle without
/// touching the filesystem; staging never merges into an existing VM's
/// data. In dry-run mode the conflict check still runs but nothing is
/// written.
#[instrument(skip(bundle, defaults), fields(bundle = %bundle.name()))]
pub fn stage_bundle(
    bundle: &ExportBundle,
    defaults: &HostStorageDefaults,
    dry_run: bool,
) -> Result<StagingResult> {
    let destination = staging_destination(bundle, defaults);

    if dry_run {
        if destination.exists() {
            return Err(ImportError::DestinationConflict(destination));
        }
        info!(destination = %destination.display(), "Dry run, staging skipped");
        return Ok(StagingResult {
            destination,
            copied: false,
        });
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| ImportError::Staging {
            destination: destination.clone(),
            source,
        })?;
    }

    // Exclusive create claims the destination atomically.
    match fs::create_dir(&destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ImportError::DestinationConflict(destination));
        }
        Err(source) => {
            return Err(ImportError::Staging {
                destination,
                source,
            });
        }
    }

    copy_tree(bundle.source(), &destination).map_err(|source| ImportError::Staging {
        destination: destination.clone(),
        source,
    })?;

    info!(
        source = %bundle.source().display(),
        destination = %destination.display(),
        "Bundle staged"
    );

    Ok(StagingResult {
        destination,
        copied: true,
    })
}

/// Recursively copy a directory tree. `dest` must already exist.
fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir(&target)?;
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
