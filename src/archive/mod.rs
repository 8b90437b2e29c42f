//! Backup archives: snapshot directory roots into one zip, restore them back.

pub mod builder;
pub mod entry;
pub mod restorer;

pub use builder::{ArchiveBuilder, BuildOutcome};
pub use entry::{archive_name, DirectoryRoot, RestoreMap, DIR_MODE};
pub use restorer::{restore, RestoreOutcome};
