use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

use super::args::OutputFormat;
use crate::common::format::{self, against_budget, display_path, Size};
use crate::maintenance::DirUsage;
use crate::progress::{ConfirmationProvider, Notice, ProgressReporter, Verbosity};
use crate::retention::TrimReport;

/// Progress bar on stderr plus one printed line per terminal notice
pub struct TerminalReporter {
    bar: ProgressBar,
    format: OutputFormat,
}

impl TerminalReporter {
    pub fn new(format: OutputFormat, verbosity: Verbosity) -> Self {
        let bar = if verbosity == Verbosity::Normal && matches!(format, OutputFormat::Human) {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("━━░"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };
        Self { bar, format }
    }
}

impl ProgressReporter for TerminalReporter {
    fn report_progress(&self, percent: u8, label: &str) {
        self.bar.set_position(percent as u64);
        self.bar.set_message(format::fit_label(label, 40));
    }

    fn notify(&self, notice: &Notice) {
        self.bar.finish_and_clear();
        match self.format {
            OutputFormat::Human => print_notice(notice),
            OutputFormat::Json => print_notice_json(notice),
            OutputFormat::Quiet => print_notice_quiet(notice),
        }
    }
}

/// Asks on stdin unless `--yes` was given
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl ConfirmationProvider for TerminalConfirm {
    fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        println!();
        println!("  {} {}", "❓", title.bold());
        for line in message.lines() {
            println!("  {}", line);
        }
        print!("  [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() {
            return false;
        }
        input.trim().eq_ignore_ascii_case("y")
    }
}

/// Print a terminal notice in human-readable format
pub fn print_notice(notice: &Notice) {
    println!();
    match notice {
        Notice::Success { title, message } => {
            println!("  {} {} — {}", "✓".green(), title.bold(), message);
        }
        Notice::Cancelled { title } => {
            println!("  {} {} — cancelled by user", "✗".red(), title.bold());
        }
        Notice::Declined { title } => {
            println!("  {} {} — nothing changed", "ℹ️", title.bold());
        }
        Notice::Failed { title, reason } => {
            println!("  {} {} failed: {}", "⚠".yellow(), title.bold(), reason.red());
        }
    }
    println!();
}

fn print_notice_json(notice: &Notice) {
    match serde_json::to_string_pretty(notice) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize notice: {}", e),
    }
}

fn print_notice_quiet(notice: &Notice) {
    let status = match notice {
        Notice::Success { .. } => "success",
        Notice::Cancelled { .. } => "cancelled",
        Notice::Declined { .. } => "declined",
        Notice::Failed { .. } => "failed",
    };
    println!("{}  {}", status, notice.title());
}

/// Print directory sizes, highlighting caches over their budget
pub fn print_status(usage: &[DirUsage], cache_budget: u64) {
    println!();
    println!("{}  LazyMaint Status", "🧹");
    println!("{}", "─".repeat(60).dimmed());

    for dir in usage {
        let budget = matches!(dir.label, "Temp" | "Thumbnails").then_some(cache_budget);
        println!(
            "  {:<12} {:>12}  {}",
            dir.label.bold(),
            against_budget(dir.size_bytes, budget),
            display_path(&dir.path).dimmed()
        );
    }

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Cache budget: {}",
        Size(cache_budget).to_string().cyan()
    );
    println!();
}

pub fn print_status_json(usage: &[DirUsage]) {
    let json = serde_json::json!(usage
        .iter()
        .map(|d| {
            serde_json::json!({
                "label": d.label,
                "path": d.path.display().to_string(),
                "size_bytes": d.size_bytes,
            })
        })
        .collect::<Vec<_>>());
    println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
}

/// Print the result of trimming a single directory
pub fn print_trim_report(report: &TrimReport, budget: u64) {
    println!();
    println!(
        "  {} Trimmed {} → {} (budget {}) — {}",
        "✓".green(),
        Size(report.size_before),
        against_budget(report.size_after, Some(budget)),
        Size(budget),
        format::plural(report.files_removed, "file").cyan(),
    );
    if report.dirs_pruned > 0 {
        println!("  {} Removed {} empty folders", "📁", report.dirs_pruned);
    }

    if !report.failures.is_empty() {
        println!();
        println!("  {} {} files skipped:", "⚠".yellow(), report.failures.len());
        for (i, failure) in report.failures.iter().enumerate().take(10) {
            println!(
                "    {} {}",
                format!("{}.", i + 1).dimmed(),
                failure.to_string().dimmed()
            );
        }
        if report.failures.len() > 10 {
            println!(
                "    ... and {} more",
                (report.failures.len() - 10).to_string().dimmed()
            );
        }
    }
    println!();
}

pub fn print_trim_json(report: &TrimReport, budget: u64) {
    let json = serde_json::json!({
        "budget_bytes": budget,
        "size_before": report.size_before,
        "size_after": report.size_after,
        "files_removed": report.files_removed,
        "bytes_freed": report.bytes_freed,
        "dirs_pruned": report.dirs_pruned,
        "errors": report.failures.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
}
