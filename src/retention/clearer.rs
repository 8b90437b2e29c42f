use std::path::Path;
use tracing::{info, warn};

use super::probe;
use crate::common::errors::{ItemFailure, MaintError, Result};
use crate::common::safety;

/// Report from clearing a directory
#[derive(Debug, Default)]
pub struct ClearReport {
    pub items_removed: usize,
    pub bytes_freed: u64,
    pub failures: Vec<ItemFailure>,
}

/// Remove every direct child of `root`, keeping `root` itself.
///
/// Failures on individual children are collected and the rest are still
/// removed. Only a protected `root` is refused outright.
pub fn clear(root: &Path) -> Result<ClearReport> {
    clear_except(root, &[])
}

/// Same as [`clear`], leaving children whose name is in `keep`
pub fn clear_except(root: &Path, keep: &[&str]) -> Result<ClearReport> {
    let mut report = ClearReport::default();

    if !root.exists() {
        return Ok(report);
    }
    safety::guard(root)?;

    let entries = std::fs::read_dir(root).map_err(|e| MaintError::io(root, e))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "error listing directory");
                report.failures.push(ItemFailure::new(root, e));
                continue;
            }
        };

        if keep.iter().any(|k| entry.file_name() == *k) {
            continue;
        }

        let path = entry.path();
        let size = probe::measure(&path);
        match remove_path(&path) {
            Ok(()) => {
                report.items_removed += 1;
                report.bytes_freed += size;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error clearing");
                report.failures.push(ItemFailure::new(&path, e));
            }
        }
    }

    info!(
        root = %root.display(),
        removed = report.items_removed,
        failed = report.failures.len(),
        "cleared directory"
    );

    Ok(report)
}

/// Delete a single file or directory permanently.
/// Symlinks are unlinked, never followed.
fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(path)?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}
