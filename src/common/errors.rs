use std::path::{Path, PathBuf};

use thiserror::Error;

/// Typed errors for maintenance operations.
/// We use `anyhow` at the top level for CLI error handling,
/// but library code reports failures through this enum.
#[derive(Debug, Error)]
pub enum MaintError {
    /// A required source path is missing
    #[error("Not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// Archive destination already exists and overwriting was not allowed
    #[error("Already exists (won't overwrite): '{}'", path.display())]
    AlreadyExists { path: PathBuf },

    /// Permission denied accessing a path
    #[error("Permission denied: '{}': {source}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive container could not be read or written
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Archive entry would land outside its destination root
    #[error("Unsafe archive entry: '{name}'")]
    UnsafeEntry { name: String },

    /// Refusal to wipe a path that must never be emptied
    #[error("SAFETY: Refusing to modify protected path: '{}'", path.display())]
    Protected { path: PathBuf },
}

impl MaintError {
    /// Wrap an I/O error with the path it happened on, keeping the
    /// not-found and permission cases distinguishable.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            std::io::ErrorKind::NotFound => MaintError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => MaintError::PermissionDenied { path, source },
            _ => MaintError::Io { path, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, MaintError>;

/// A single file or directory that could not be processed.
/// Collected by best-effort operations instead of aborting them.
#[derive(Debug)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub error: MaintError,
}

impl ItemFailure {
    pub fn new(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            error: MaintError::io(&path, source),
            path,
        }
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}
