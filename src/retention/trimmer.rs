use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::probe;
use crate::common::errors::ItemFailure;
use crate::common::paths::LIVE_LOG;

/// A file that may be deleted to bring a directory under budget
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

/// Report from a trim pass
#[derive(Debug, Default)]
pub struct TrimReport {
    pub size_before: u64,
    /// Size after the pass, as tracked by the running counter
    pub size_after: u64,
    pub files_removed: usize,
    pub bytes_freed: u64,
    pub dirs_pruned: usize,
    pub failures: Vec<ItemFailure>,
}

/// Trim `root` to at most `budget_bytes`, deleting oldest files first.
/// The live log is never a candidate.
pub fn trim(root: &Path, budget_bytes: u64) -> TrimReport {
    trim_except(root, budget_bytes, &[LIVE_LOG])
}

/// Trim `root`, never deleting files whose name is in `reserved`.
///
/// Best effort: files that can't be inspected or removed are reported
/// and skipped. If everything deletable is gone and the tree is still
/// over budget, the pass just ends.
pub fn trim_except(root: &Path, budget_bytes: u64, reserved: &[&str]) -> TrimReport {
    let mut report = TrimReport::default();

    if !root.exists() {
        return report;
    }

    let mut current = probe::measure(root);
    report.size_before = current;
    report.size_after = current;

    if current <= budget_bytes {
        debug!(root = %root.display(), size = current, budget = budget_bytes, "already within budget");
        return report;
    }

    let (candidates, failures) = collect_candidates(root, reserved);
    report.failures.extend(failures);

    current = remove_oldest(candidates, current, budget_bytes, &mut report);

    report.size_after = current;
    report.dirs_pruned = prune_empty_dirs(root);

    if current > budget_bytes {
        info!(
            root = %root.display(),
            size = current,
            budget = budget_bytes,
            "trim finished over budget"
        );
    } else {
        info!(
            root = %root.display(),
            removed = report.files_removed,
            freed = report.bytes_freed,
            "trim finished"
        );
    }

    report
}

/// Every deletable file under `root`, oldest first with ties broken by path,
/// plus the entries that could not be inspected.
pub fn collect_candidates(root: &Path, reserved: &[&str]) -> (Vec<FileRecord>, Vec<ItemFailure>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                if let Some(io) = e.into_io_error() {
                    failures.push(ItemFailure::new(path, io));
                }
                continue;
            }
        };

        if !entry.file_type().is_file() || is_reserved(entry.file_name(), reserved) {
            continue;
        }

        let stat = entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|m| Ok((m.modified()?, m.len())));
        match stat {
            Ok((modified, size_bytes)) => records.push(FileRecord {
                path: entry.into_path(),
                modified,
                size_bytes,
            }),
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "error reading file stats");
                failures.push(ItemFailure::new(entry.path(), e));
            }
        }
    }

    records.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    (records, failures)
}

/// Delete `candidates` in order until `current` is within budget.
/// A failed delete is recorded and leaves the counter untouched.
fn remove_oldest(
    candidates: Vec<FileRecord>,
    mut current: u64,
    budget_bytes: u64,
    report: &mut TrimReport,
) -> u64 {
    for record in candidates {
        if current <= budget_bytes {
            break;
        }
        match std::fs::remove_file(&record.path) {
            Ok(()) => {
                current = current.saturating_sub(record.size_bytes);
                report.files_removed += 1;
                report.bytes_freed += record.size_bytes;
            }
            Err(e) => {
                warn!(path = %record.path.display(), error = %e, "failed to delete during trim");
                report.failures.push(ItemFailure::new(&record.path, e));
            }
        }
    }
    current
}

fn is_reserved(name: &OsStr, reserved: &[&str]) -> bool {
    reserved.iter().any(|r| name == OsStr::new(r))
}

/// Remove directories left empty, deepest first. `root` itself stays.
fn prune_empty_dirs(root: &Path) -> usize {
    let mut pruned = 0;
    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        // Fails harmlessly on directories that still have entries
        if std::fs::remove_dir(entry.path()).is_ok() {
            pruned += 1;
        }
    }
    pruned
}
