use std::path::{Component, Path};

use super::errors::{MaintError, Result};

/// Paths that must NEVER be emptied under any circumstances.
/// This is a critical safety net against a misconfigured Kodi home.
const PROTECTED_PATHS: &[&str] = &[
    "/", "/bin", "/boot", "/dev", "/etc", "/home", "/lib", "/opt", "/proc", "/root", "/sbin",
    "/sys", "/tmp", "/usr", "/var", "/Applications", "/Library", "/System", "/Users",
];

/// Check if a path is protected and should NEVER be wiped
pub fn is_protected(path: &Path) -> bool {
    // A relative or parent-escaping path is never a valid Kodi directory
    if !path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
        return true;
    }

    let trimmed = path.to_string_lossy();
    let trimmed = trimmed.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed };

    if PROTECTED_PATHS.contains(&trimmed) {
        return true;
    }

    // Never wipe the home directory itself
    if let Some(home) = dirs::home_dir() {
        if Path::new(trimmed) == home {
            return true;
        }
    }

    false
}

/// Return an error instead of touching a protected path
pub fn guard(path: &Path) -> Result<()> {
    if is_protected(path) {
        return Err(MaintError::Protected {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
