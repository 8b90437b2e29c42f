use std::fs::File;
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

use super::entry::RestoreMap;
use crate::common::errors::{MaintError, Result};
use crate::common::safety;
use crate::progress::{percent, ProgressReporter};

/// Result of a restore that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Completed { entries: u64 },
    /// Stopped on request. Destinations keep whatever was already extracted.
    Cancelled { restored: u64, total: u64 },
}

/// Restore an archive over the directories in `map`.
///
/// Every mapped destination is wiped and recreated before extraction
/// starts; there is no rollback afterwards. The archive is opened first
/// so a missing or unreadable file fails before anything is deleted.
pub fn restore(
    archive_path: &Path,
    map: &RestoreMap,
    reporter: &dyn ProgressReporter,
) -> Result<RestoreOutcome> {
    if !archive_path.is_file() {
        return Err(MaintError::NotFound {
            path: archive_path.to_path_buf(),
        });
    }

    let file = File::open(archive_path).map_err(|e| MaintError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file)?;

    for destination in map.destinations() {
        reset_dir(destination)?;
    }

    let count = archive.len() as u64;
    let total = count.max(1);
    info!(archive = %archive_path.display(), entries = count, "restoring archive");

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        let target = map.resolve(&name)?;

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| MaintError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MaintError::io(parent, e))?;
            }
            let mut out = File::create(&target).map_err(|e| MaintError::io(&target, e))?;
            std::io::copy(&mut entry, &mut out).map_err(|e| MaintError::io(&target, e))?;
        }
        debug!(name, target = %target.display(), "restored entry");

        let restored = index as u64 + 1;
        reporter.report_progress(percent(restored, total), &format!("Restoring: {}", name));
        if reporter.is_cancelled() {
            info!(restored, total = count, "restore cancelled");
            return Ok(RestoreOutcome::Cancelled {
                restored,
                total: count,
            });
        }
    }

    info!(archive = %archive_path.display(), entries = count, "restore complete");
    Ok(RestoreOutcome::Completed { entries: count })
}

/// Delete a destination recursively and recreate it empty
fn reset_dir(path: &Path) -> Result<()> {
    safety::guard(path)?;
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| MaintError::io(path, e))?;
    }
    std::fs::create_dir_all(path).map_err(|e| MaintError::io(path, e))?;
    Ok(())
}
