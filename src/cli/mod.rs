//! CLI command handlers
//!
//! Thin glue between clap arguments and the core: connectors, pipeline,
//! rclone wrapper and retention. User-facing output happens here; the core
//! modules only log.

pub mod db;
pub mod list;
pub mod media;

pub use db::{handle_backup, handle_prune, handle_restore, BackupArgs, PruneArgs, RestoreArgs};
pub use list::{handle_list, ListArgs};
pub use media::{handle_media_backup, handle_media_restore};

/// Format a byte count for humans
pub(crate) fn format_size(size: i64) -> String {
    if size < 0 {
        return "unknown".to_string();
    }
    let mut size = size as f64;
    if size < 1024.0 {
        return format!("{} B", size as i64);
    }
    for unit in ["KB", "MB", "GB", "TB"] {
        size /= 1024.0;
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
    }
    format!("{:.1} PB", size / 1024.0)
}
