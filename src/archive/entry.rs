use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::common::errors::{MaintError, Result};

/// Mode stamped on directory marker entries
pub const DIR_MODE: u32 = 0o775;

/// Predicate over a path relative to its root; `true` leaves it out
pub type ExcludeFn = dyn Fn(&Path) -> bool + Send + Sync;

/// One directory tree written into an archive under `name/`
#[derive(Clone)]
pub struct DirectoryRoot {
    pub name: String,
    pub path: PathBuf,
    exclude: Option<Arc<ExcludeFn>>,
}

impl DirectoryRoot {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            exclude: None,
        }
    }

    /// Skip every file or directory the predicate matches.
    /// Matching directories are not descended into.
    pub fn exclude<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.exclude = Some(Arc::new(predicate));
        self
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.exclude.as_ref().is_some_and(|f| f(relative))
    }

    /// Walk the root in a stable order, pruning excluded paths.
    /// Yields directories as well as files.
    pub fn walk(&self) -> impl Iterator<Item = walkdir::Result<walkdir::DirEntry>> + '_ {
        WalkDir::new(&self.path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0
                    || e
                        .path()
                        .strip_prefix(&self.path)
                        .map(|rel| !self.is_excluded(rel))
                        .unwrap_or(true)
            })
    }

    /// Number of files [`walk`](Self::walk) will produce, ignoring unreadable entries
    pub fn file_count(&self) -> u64 {
        if !self.path.exists() {
            return 0;
        }
        self.walk()
            .filter_map(|e| e.ok())
            .filter(is_archivable)
            .count() as u64
    }

    /// Archive name for a path relative to this root
    pub fn archive_name(&self, relative: &Path) -> String {
        archive_name(&self.name, relative)
    }
}

impl std::fmt::Debug for DirectoryRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryRoot")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("has_exclusions", &self.exclude.is_some())
            .finish()
    }
}

/// Regular files, and symlinks that resolve to one. Archived content
/// is the link target's; directory links are never descended.
pub fn is_archivable(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// Join a logical root name and a relative path with forward slashes,
/// whatever the host separator is.
pub fn archive_name(root_name: &str, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    let root_name = root_name.trim_matches('/');
    if !root_name.is_empty() {
        parts.push(root_name.to_string());
    }
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().into_owned());
        }
    }
    parts.join("/")
}

/// Directory marker names always end with a single `/`
pub fn marker_name(name: &str) -> String {
    format!("{}/", name.trim_matches('/'))
}

/// Maps archive prefixes back onto filesystem directories.
///
/// An entry goes to the directory of the longest matching prefix;
/// entries matching nothing land under the default root.
#[derive(Debug, Clone)]
pub struct RestoreMap {
    default_root: PathBuf,
    prefixes: Vec<(String, PathBuf)>,
}

impl RestoreMap {
    pub fn new(default_root: impl Into<PathBuf>) -> Self {
        Self {
            default_root: default_root.into(),
            prefixes: Vec::new(),
        }
    }

    pub fn map(mut self, prefix: &str, destination: impl Into<PathBuf>) -> Self {
        self.prefixes.push((marker_name(prefix), destination.into()));
        self
    }

    /// Directories wiped before a restore
    pub fn destinations(&self) -> impl Iterator<Item = &Path> {
        self.prefixes.iter().map(|(_, d)| d.as_path())
    }

    pub fn default_root(&self) -> &Path {
        &self.default_root
    }

    /// Filesystem path for an archive entry name
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.starts_with('/') {
            return Err(MaintError::UnsafeEntry {
                name: name.to_string(),
            });
        }

        let matched = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| {
                name.starts_with(prefix.as_str()) || name == prefix.trim_end_matches('/')
            })
            .max_by_key(|(prefix, _)| prefix.len());

        let (mut target, rest) = match matched {
            Some((prefix, dest)) => (dest.clone(), name.get(prefix.len()..).unwrap_or("")),
            None => (self.default_root.clone(), name),
        };

        for segment in rest.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => target.push(part),
                _ => {
                    return Err(MaintError::UnsafeEntry {
                        name: name.to_string(),
                    })
                }
            }
        }

        Ok(target)
    }
}
