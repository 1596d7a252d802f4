//! Media backup and restore commands
//!
//! Media is mirrored with `rclone sync`: only changed files transfer, and
//! files absent from the source are removed from the destination.

use crate::config::Settings;
use crate::error::{BackupError, BackupResult};
use crate::events::{Event, Hooks};
use crate::rclone::Rclone;

fn media_root(settings: &Settings) -> BackupResult<String> {
    settings
        .media_root
        .as_ref()
        .map(|p| p.display().to_string())
        .ok_or_else(|| BackupError::Config("'media_root' is not configured".into()))
}

/// Handle `rback media-backup`
pub fn handle_media_backup(settings: &Settings, hooks: &Hooks) -> BackupResult<()> {
    let media_root = media_root(settings)?;
    let rclone = Rclone::from_settings(settings);
    let remote_dest = rclone.remote_path(&settings.media_backup_dir);

    hooks.publish(&Event::MediaBackupStarted);
    println!("Syncing media from {} to {}", media_root, remote_dest);

    rclone.sync(&media_root, &remote_dest)?;

    hooks.publish(&Event::MediaBackupCompleted);
    println!("Media backup completed.");
    Ok(())
}

/// Handle `rback media-restore`
pub fn handle_media_restore(settings: &Settings, hooks: &Hooks) -> BackupResult<()> {
    let media_root = media_root(settings)?;
    let rclone = Rclone::from_settings(settings);
    let remote_src = rclone.remote_path(&settings.media_backup_dir);

    hooks.publish(&Event::MediaRestoreStarted);
    println!("Syncing media from {} to {}", remote_src, media_root);

    rclone.sync(&remote_src, &media_root)?;

    hooks.publish(&Event::MediaRestoreCompleted);
    println!("Media restore completed.");
    Ok(())
}
