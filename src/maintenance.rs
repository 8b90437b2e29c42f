//! Maintenance policies composed from the retention and archive engines.
//!
//! Every policy ends in exactly one [`Notice`], delivered through the
//! reporter and returned to the caller.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::archive::{self, ArchiveBuilder, BuildOutcome, RestoreOutcome};
use crate::common::config::Config;
use crate::common::errors::{MaintError, Result};
use crate::common::format::{self, Size};
use crate::common::paths::{HostPaths, LIVE_LOG};
use crate::common::safety;
use crate::progress::{ConfirmationProvider, Notice, ProgressReporter, Silenced};
use crate::retention;

/// How a policy ended when it did not fail
enum Step {
    Done(String),
    Cancelled,
    Declined,
}

/// Totals across the trim/clear steps of a clean
#[derive(Debug, Default)]
pub struct CleanSummary {
    pub files_removed: usize,
    pub bytes_freed: u64,
    pub failures: usize,
}

impl CleanSummary {
    fn add_trim(&mut self, report: &retention::TrimReport) {
        self.files_removed += report.files_removed;
        self.bytes_freed += report.bytes_freed;
        self.failures += report.failures.len();
    }

    fn add_clear(&mut self, report: &retention::ClearReport) {
        self.files_removed += report.items_removed;
        self.bytes_freed += report.bytes_freed;
        self.failures += report.failures.len();
    }

    fn describe(&self) -> String {
        let mut msg = format!(
            "freed {} ({})",
            Size(self.bytes_freed),
            format::plural(self.files_removed, "item")
        );
        if self.failures > 0 {
            msg.push_str(&format!(", {} skipped", self.failures));
        }
        msg
    }
}

/// Size of one Kodi directory, for status output
#[derive(Debug, Clone)]
pub struct DirUsage {
    pub label: &'static str,
    pub path: PathBuf,
    pub size_bytes: u64,
}

pub struct Maintenance<'a> {
    paths: HostPaths,
    config: &'a Config,
    reporter: &'a dyn ProgressReporter,
    confirm: &'a dyn ConfirmationProvider,
}

impl<'a> Maintenance<'a> {
    pub fn new(
        paths: HostPaths,
        config: &'a Config,
        reporter: &'a dyn ProgressReporter,
        confirm: &'a dyn ConfirmationProvider,
    ) -> Self {
        Self {
            paths,
            config,
            reporter,
            confirm,
        }
    }

    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    // ─── Cleaning ─────────────────────────────────────────────────────────

    /// Trim temp and thumbnails to the soft budget, clear packages,
    /// drop the rotated log.
    pub fn soft_clean(&self) -> Notice {
        let budget = self.config.soft_clean_budget_bytes();
        let result = self
            .clean_pass(budget, self.reporter)
            .map(|s| Step::Done(format!("Soft Clean completed: {}", s.describe())));
        self.finish("Soft Clean", result)
    }

    /// Startup variant of soft clean with the auto budget and no progress
    pub fn auto_clean(&self) -> Notice {
        let budget = self.config.auto_clean_budget_bytes();
        let quiet = Silenced(self.reporter);
        let result = self
            .clean_pass(budget, &quiet)
            .map(|s| Step::Done(format!("Auto clean done: {}", s.describe())));
        self.finish("Auto Clean", result)
    }

    /// Wipe temp, packages and thumbnails completely and drop the texture database
    pub fn hard_clean(&self) -> Notice {
        let result = self.run_hard_clean();
        self.finish("Hard Clean", result)
    }

    fn clean_pass(&self, budget: u64, reporter: &dyn ProgressReporter) -> Result<CleanSummary> {
        let mut summary = CleanSummary::default();
        let target = Size(budget);

        reporter.report_progress(10, &format!("Trimming Cache/Temp... Target: {}", target));
        summary.add_trim(&retention::trim(&self.paths.temp, budget));

        reporter.report_progress(40, "Clearing Packages folder...");
        summary.add_clear(&retention::clear(&self.paths.packages)?);

        reporter.report_progress(60, &format!("Trimming Thumbnails... Target: {}", target));
        summary.add_trim(&retention::trim(&self.paths.thumbnails, budget));

        reporter.report_progress(90, "Removing old logs...");
        let old_log = self.paths.old_log();
        match remove_if_present(&old_log) {
            Ok(true) => summary.files_removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(path = %old_log.display(), error = %e, "failed to remove old log");
                summary.failures += 1;
            }
        }

        reporter.report_progress(100, "Done!");
        Ok(summary)
    }

    fn run_hard_clean(&self) -> Result<Step> {
        if !self.confirm.confirm(
            "Hard Clean",
            "This will completely clear Temp, Thumbnails, Packages and delete Textures13.db.\n\n\
             Are you sure you want to proceed?",
        ) {
            return Ok(Step::Declined);
        }

        let mut summary = CleanSummary::default();

        self.reporter.report_progress(20, "Clearing Temp...");
        summary.add_clear(&retention::clear_except(&self.paths.temp, &[LIVE_LOG])?);

        self.reporter.report_progress(40, "Clearing Packages...");
        summary.add_clear(&retention::clear(&self.paths.packages)?);

        self.reporter.report_progress(60, "Clearing Thumbnails...");
        summary.add_clear(&retention::clear(&self.paths.thumbnails)?);

        self.reporter.report_progress(80, "Deleting Textures13.db...");
        if remove_if_present(&self.paths.texture_db())? {
            summary.files_removed += 1;
        }

        self.reporter.report_progress(100, "Complete!");
        Ok(Step::Done(format!(
            "Hard clean completed: {}. Restart Kodi to rebuild the cache.",
            summary.describe()
        )))
    }

    // ─── Backup / Restore ─────────────────────────────────────────────────

    /// Archive addons, userdata and media into `dest_dir`.
    ///
    /// `name` defaults to a timestamped `kodi_backup_*.zip`. An existing
    /// file is only replaced after confirmation.
    pub fn backup(&self, name: Option<&str>, dest_dir: &Path) -> Notice {
        let result = self.run_backup(name, dest_dir);
        self.finish("Backup", result)
    }

    fn run_backup(&self, name: Option<&str>, dest_dir: &Path) -> Result<Step> {
        let file_name = backup_file_name(name);
        let destination = dest_dir.join(&file_name);

        let mut overwrite = false;
        if destination.exists() {
            if !self
                .confirm
                .confirm("Overwrite?", &format!("{} exists. Overwrite?", file_name))
            {
                return Ok(Step::Declined);
            }
            overwrite = true;
        }

        let outcome = ArchiveBuilder::new(&destination)
            .overwrite(overwrite)
            .markers(self.paths.backup_markers())
            .build(&self.paths.backup_roots(), self.reporter)?;

        Ok(match outcome {
            BuildOutcome::Completed { path, entries } => Step::Done(format!(
                "Backup done ({} entries). Saved at: {}",
                entries,
                path.display()
            )),
            BuildOutcome::Cancelled => Step::Cancelled,
        })
    }

    /// Replace addons, userdata and media with the contents of `archive_path`
    pub fn restore(&self, archive_path: &Path) -> Notice {
        let result = self.run_restore(archive_path);
        self.finish("Restore", result)
    }

    fn run_restore(&self, archive_path: &Path) -> Result<Step> {
        if !archive_path.is_file() {
            return Err(MaintError::NotFound {
                path: archive_path.to_path_buf(),
            });
        }
        if !self.confirm.confirm(
            "Confirm Restore",
            "Existing addons, userdata and media will be DELETED and replaced. Continue?",
        ) {
            return Ok(Step::Declined);
        }

        let outcome = archive::restore(archive_path, &self.paths.restore_map(), self.reporter)?;
        Ok(match outcome {
            RestoreOutcome::Completed { entries } => Step::Done(format!(
                "Restore completed successfully ({} entries). Restart Kodi to apply changes.",
                entries
            )),
            RestoreOutcome::Cancelled { restored, total } => {
                info!(restored, total, "restore left partially applied");
                Step::Cancelled
            }
        })
    }

    // ─── Fresh start ──────────────────────────────────────────────────────

    /// Wipe userdata and every addon except this one
    pub fn fresh_start(&self) -> Notice {
        let result = self.run_fresh_start();
        self.finish("Fresh Start", result)
    }

    fn run_fresh_start(&self) -> Result<Step> {
        if !self
            .confirm
            .confirm("Fresh Start", "Are you SURE? This wipes everything.")
        {
            return Ok(Step::Declined);
        }

        let userdata = &self.paths.userdata;
        safety::guard(userdata)?;
        if userdata.exists() {
            std::fs::remove_dir_all(userdata).map_err(|e| MaintError::io(userdata, e))?;
            std::fs::create_dir_all(userdata).map_err(|e| MaintError::io(userdata, e))?;
        }

        let report = retention::clear_except(&self.paths.addons, &[self.config.addon_id.as_str()])?;
        Ok(Step::Done(format!(
            "All data has been wiped ({} addons removed). Restart Kodi.",
            report.items_removed
        )))
    }

    // ─── Logs ─────────────────────────────────────────────────────────────

    /// Contents of the live log, invalid UTF-8 replaced
    pub fn read_log(&self) -> Result<String> {
        let path = self.paths.live_log();
        let bytes = std::fs::read(&path).map_err(|e| MaintError::io(&path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Copy the live log into `dest_dir`
    pub fn export_log(&self, dest_dir: &Path) -> Notice {
        let result = self.run_export_log(dest_dir);
        self.finish("Export Log", result)
    }

    fn run_export_log(&self, dest_dir: &Path) -> Result<Step> {
        let source = self.paths.live_log();
        let target = dest_dir.join(LIVE_LOG);
        std::fs::copy(&source, &target).map_err(|e| MaintError::io(&source, e))?;
        Ok(Step::Done(format!("Log exported to {}", target.display())))
    }

    /// Truncate the live log to zero bytes
    pub fn clear_log(&self) -> Notice {
        let result = self.run_clear_log();
        self.finish("Clear Log", result)
    }

    fn run_clear_log(&self) -> Result<Step> {
        let path = self.paths.live_log();
        if !path.exists() {
            return Err(MaintError::NotFound { path });
        }
        std::fs::File::create(&path).map_err(|e| MaintError::io(&path, e))?;
        Ok(Step::Done("Log cleared.".to_string()))
    }

    // ─── Status ───────────────────────────────────────────────────────────

    pub fn status(&self) -> Vec<DirUsage> {
        [
            ("Temp", &self.paths.temp),
            ("Thumbnails", &self.paths.thumbnails),
            ("Packages", &self.paths.packages),
            ("Addons", &self.paths.addons),
            ("Userdata", &self.paths.userdata),
            ("Media", &self.paths.media),
        ]
        .into_iter()
        .map(|(label, path)| DirUsage {
            label,
            path: path.clone(),
            size_bytes: retention::measure(path),
        })
        .collect()
    }

    /// Turn a policy result into its one terminal notice
    fn finish(&self, title: &str, result: Result<Step>) -> Notice {
        let notice = match result {
            Ok(Step::Done(message)) => Notice::Success {
                title: title.to_string(),
                message,
            },
            Ok(Step::Cancelled) => Notice::Cancelled {
                title: title.to_string(),
            },
            Ok(Step::Declined) => Notice::Declined {
                title: title.to_string(),
            },
            Err(e) => {
                error!(context = title, error = %e, "maintenance error");
                Notice::Failed {
                    title: title.to_string(),
                    reason: e.to_string(),
                }
            }
        };
        self.reporter.notify(&notice);
        notice
    }
}

/// `kodi_backup_<timestamp>.zip` unless a name is given; `.zip` is appended when missing
pub fn backup_file_name(name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let mut file_name = match name {
        Some(n) => n.to_string(),
        None => format!(
            "kodi_backup_{}",
            chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
        ),
    };
    if !file_name.ends_with(".zip") {
        file_name.push_str(".zip");
    }
    file_name
}

/// Delete a single file, treating absence as success
fn remove_if_present(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MaintError::io(path, e)),
    }
}
