//! # LazyMaint
//!
//! Maintenance for a Kodi installation's working area.
//!
//! - **Retention**: trim cache directories to a byte budget, oldest files first,
//!   never touching the live log
//! - **Bulk clearing**: empty package and thumbnail folders on a best-effort basis
//! - **Backup**: snapshot addons, userdata and media into one zip archive, with
//!   progress and cancellation that never leaves a truncated archive behind
//! - **Restore**: wipe and re-materialize those directories from an archive
//! - **Policies**: soft, auto and hard clean, fresh start and log handling on top

pub mod archive;
pub mod cli;
pub mod common;
pub mod maintenance;
pub mod progress;
pub mod retention;
