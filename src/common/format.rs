//! Rendering of sizes, counts and labels for notices and terminal output.

use colored::{ColoredString, Colorize};
use std::fmt;
use std::path::Path;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Byte count shown with binary units: `512 B`, `4.0 MB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Size(pub u64);

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1024 {
            return write!(f, "{} B", self.0);
        }
        let mut value = self.0 as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        write!(f, "{:.1} {}", value, UNITS[unit])
    }
}

/// A cache size coloured by whether it fits its budget.
/// Directories without a budget are shown plain.
pub fn against_budget(bytes: u64, budget: Option<u64>) -> ColoredString {
    let text = Size(bytes).to_string();
    match budget {
        Some(limit) if bytes > limit => text.red().bold(),
        Some(_) => text.green(),
        None => text.normal(),
    }
}

/// `1 file`, `3 files`
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Path with the user's home shown as `~`
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}

/// Fit a progress label into `max` chars, cutting from the middle so the
/// action prefix and the file name at the end both stay visible.
pub fn fit_label(label: &str, max: usize) -> String {
    let len = label.chars().count();
    if len <= max {
        return label.to_string();
    }
    if max <= 1 {
        return "…".repeat(max);
    }
    let keep = max - 1;
    let head = keep / 2;
    let tail = keep - head;
    let mut out: String = label.chars().take(head).collect();
    out.push('…');
    out.extend(label.chars().skip(len - tail));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_display() {
        assert_eq!(Size(0).to_string(), "0 B");
        assert_eq!(Size(1023).to_string(), "1023 B");
        assert_eq!(Size(1536).to_string(), "1.5 KB");
        assert_eq!(Size(5 * 1024 * 1024).to_string(), "5.0 MB");
        assert_eq!(Size(u64::MAX).to_string(), "16777216.0 TB");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "item"), "0 items");
        assert_eq!(plural(7, "addon"), "7 addons");
    }

    #[test]
    fn test_fit_label_keeps_both_ends() {
        assert_eq!(fit_label("Restoring: a.xml", 40), "Restoring: a.xml");
        let fitted = fit_label("Backing up: plugin.video.something.long/resources/icon.png", 21);
        assert_eq!(fitted.chars().count(), 21);
        assert!(fitted.starts_with("Backing up"));
        assert!(fitted.ends_with("icon.png"));
        assert_eq!(fit_label("ünïcødé", 3), "ü…é");
    }
}
