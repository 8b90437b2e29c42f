//! Progress reporting and cooperative cancellation.
//!
//! Core operations never talk to a terminal or a dialog directly. They call
//! into a [`ProgressReporter`] after every unit of work and poll it for a
//! cancel request between units. [`ProgressState`] is the shared value a
//! background worker writes and a foreground context reads.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

/// How much a reporter should surface while an operation runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Progress is suppressed; terminal notices are still delivered
    Silent,
    #[default]
    Normal,
}

/// Terminal state of a policy, delivered exactly once per invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Notice {
    Success { title: String, message: String },
    Cancelled { title: String },
    Declined { title: String },
    Failed { title: String, reason: String },
}

impl Notice {
    pub fn title(&self) -> &str {
        match self {
            Notice::Success { title, .. }
            | Notice::Cancelled { title }
            | Notice::Declined { title }
            | Notice::Failed { title, .. } => title,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failed { .. })
    }
}

/// Sink for progress updates and the source of cancel requests.
pub trait ProgressReporter {
    /// Report completion percentage (0..=100) and the item being worked on
    fn report_progress(&self, percent: u8, label: &str);

    /// Polled between entries; `true` asks the operation to stop
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Terminal notification for a whole policy
    fn notify(&self, _notice: &Notice) {}
}

/// Asks the user before destructive policies run.
pub trait ConfirmationProvider {
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Confirmation provider that always agrees (`--yes`)
pub struct AssumeYes;

impl ConfirmationProvider for AssumeYes {
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }
}

/// Reporter that discards everything and never cancels
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report_progress(&self, _percent: u8, _label: &str) {}
}

/// Forwards cancellation and notices but drops progress updates.
/// Used by policies that must run quietly whatever the reporter's verbosity.
pub struct Silenced<'a>(pub &'a dyn ProgressReporter);

impl ProgressReporter for Silenced<'_> {
    fn report_progress(&self, _percent: u8, _label: &str) {}

    fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    fn notify(&self, notice: &Notice) {
        self.0.notify(notice)
    }
}

/// Integer percentage of `current` out of `total`, treating a zero
/// total as one so an empty operation never divides by zero.
pub fn percent(current: u64, total: u64) -> u8 {
    let total = total.max(1);
    (current.min(total) * 100 / total) as u8
}

/// Shared progress of one running operation.
///
/// Single writer (the worker) and single reader (whoever renders it).
/// The cancel flag may be raised from any thread.
#[derive(Debug, Default)]
pub struct ProgressState {
    current: AtomicU64,
    total: AtomicU64,
    percent: AtomicU8,
    label: Mutex<String>,
    cancelled: AtomicBool,
}

impl ProgressState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Known denominator, when the caller counted the work up front
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.current.store(0, Ordering::Relaxed);
        self.percent.store(0, Ordering::Relaxed);
    }

    /// Advance by one unit and record the label of that unit
    pub fn advance(&self, label: &str) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total();
        if total > 0 {
            self.percent.store(percent(current, total), Ordering::Relaxed);
        }
        if let Ok(mut l) = self.label.lock() {
            l.clear();
            l.push_str(label);
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn label(&self) -> String {
        self.label.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Lets a worker thread report into a shared [`ProgressState`] while
/// another thread polls it and raises the cancel flag.
impl ProgressReporter for ProgressState {
    fn report_progress(&self, percent: u8, label: &str) {
        self.advance(label);
        self.percent.store(percent.min(100), Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled()
    }
}
