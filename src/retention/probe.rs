use std::path::Path;
use walkdir::WalkDir;

/// Calculate total size of a directory tree in bytes.
///
/// Entries that can't be read count as zero instead of aborting the
/// walk; a missing root is simply empty.
pub fn measure(root: &Path) -> u64 {
    if !root.exists() {
        return 0;
    }

    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}
