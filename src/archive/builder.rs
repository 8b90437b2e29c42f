use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::entry::{is_archivable, marker_name, DirectoryRoot, DIR_MODE};
use crate::common::errors::{MaintError, Result};
use crate::progress::{percent, ProgressReporter};

/// Result of a build that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Archive closed cleanly at `path`
    Completed { path: PathBuf, entries: u64 },
    /// Stopped on request; nothing is left at the destination
    Cancelled,
}

/// Writes a set of directory roots into a single zip archive
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    destination: PathBuf,
    overwrite: bool,
    markers: Vec<String>,
}

impl ArchiveBuilder {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            overwrite: false,
            markers: Vec::new(),
        }
    }

    /// Allow replacing an existing file at the destination
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Add an empty directory entry after the last root
    pub fn marker(mut self, name: &str) -> Self {
        self.markers.push(marker_name(name));
        self
    }

    pub fn markers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.markers
            .extend(names.into_iter().map(|n| marker_name(n.as_ref())));
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Build the archive.
    ///
    /// Either the archive is closed cleanly and `Completed` is returned,
    /// or the partial file is removed before returning `Cancelled` or an
    /// error. An existing destination is only touched when overwriting
    /// was allowed.
    pub fn build(
        &self,
        roots: &[DirectoryRoot],
        reporter: &dyn ProgressReporter,
    ) -> Result<BuildOutcome> {
        if self.destination.exists() && !self.overwrite {
            return Err(MaintError::AlreadyExists {
                path: self.destination.clone(),
            });
        }

        let total = roots.iter().map(DirectoryRoot::file_count).sum::<u64>()
            + self.markers.len() as u64;
        info!(
            destination = %self.destination.display(),
            entries = total,
            "building archive"
        );

        let file = File::create(&self.destination)
            .map_err(|e| MaintError::io(&self.destination, e))?;
        // Resolved once so the walk can recognize the archive under any spelling
        let own_path = std::fs::canonicalize(&self.destination).ok();

        let result = self.write_entries(
            ZipWriter::new(file),
            roots,
            total.max(1),
            own_path.as_deref(),
            reporter,
        );

        match result {
            Ok(Some(entries)) => {
                info!(destination = %self.destination.display(), entries, "archive complete");
                Ok(BuildOutcome::Completed {
                    path: self.destination.clone(),
                    entries,
                })
            }
            Ok(None) => {
                info!(destination = %self.destination.display(), "archive cancelled");
                self.discard();
                Ok(BuildOutcome::Cancelled)
            }
            Err(e) => {
                warn!(destination = %self.destination.display(), error = %e, "archive failed");
                self.discard();
                Err(e)
            }
        }
    }

    /// Write every entry, returning `None` if cancellation was observed.
    /// The writer is dropped before this returns on every path.
    fn write_entries(
        &self,
        mut zip: ZipWriter<File>,
        roots: &[DirectoryRoot],
        total: u64,
        own_path: Option<&Path>,
        reporter: &dyn ProgressReporter,
    ) -> Result<Option<u64>> {
        let file_options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let dir_options = SimpleFileOptions::default().unix_permissions(DIR_MODE);

        let mut seen = HashSet::new();
        let mut written = 0u64;

        for root in roots {
            if !root.path.exists() {
                debug!(root = %root.path.display(), "root missing, skipping");
                continue;
            }

            for entry in root.walk() {
                let entry = entry.map_err(|e| walk_error(&root.path, e))?;
                if entry.file_type().is_dir() {
                    continue;
                }
                if !is_archivable(&entry) {
                    debug!(path = %entry.path().display(), "not a regular file, skipping");
                    continue;
                }
                // The archive itself may live inside one of the roots
                if is_same_file(entry.path(), own_path) {
                    debug!(path = %entry.path().display(), "skipping the archive being written");
                    continue;
                }

                let relative = entry.path().strip_prefix(&root.path).unwrap_or(entry.path());
                let name = root.archive_name(relative);
                if !seen.insert(name.clone()) {
                    debug!(name, "duplicate archive name, skipping");
                    continue;
                }

                let mut source =
                    File::open(entry.path()).map_err(|e| MaintError::io(entry.path(), e))?;
                let len = source
                    .metadata()
                    .map_err(|e| MaintError::io(entry.path(), e))?
                    .len();

                zip.start_file(name.as_str(), file_options.large_file(len >= u32::MAX as u64))?;
                std::io::copy(&mut source, &mut zip)
                    .map_err(|e| MaintError::io(entry.path(), e))?;

                written += 1;
                reporter.report_progress(
                    percent(written, total),
                    &format!("Backing up: {}", entry.file_name().to_string_lossy()),
                );
                if reporter.is_cancelled() {
                    return Ok(None);
                }
            }
        }

        for marker in &self.markers {
            if !seen.insert(marker.clone()) {
                continue;
            }
            zip.add_directory(marker.as_str(), dir_options)?;

            written += 1;
            reporter.report_progress(percent(written, total), &format!("Backing up: {}", marker));
            if reporter.is_cancelled() {
                return Ok(None);
            }
        }

        zip.finish()?;
        Ok(Some(written))
    }

    fn discard(&self) {
        if let Err(e) = std::fs::remove_file(&self.destination) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    destination = %self.destination.display(),
                    error = %e,
                    "failed to remove partial archive"
                );
            }
        }
    }
}

/// Compares resolved paths, only canonicalizing entries whose name matches
fn is_same_file(path: &Path, own_path: Option<&Path>) -> bool {
    let Some(own) = own_path else {
        return false;
    };
    path.file_name() == own.file_name()
        && std::fs::canonicalize(path).is_ok_and(|p| p == own)
}

fn walk_error(root: &Path, e: walkdir::Error) -> MaintError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    MaintError::io(path, source)
}
