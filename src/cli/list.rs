//! Listing command
//!
//! Shows database backups (newest first) or the media mirror contents.

use clap::Args;

use super::format_size;
use crate::config::Settings;
use crate::error::BackupResult;
use crate::filenames;
use crate::rclone::Rclone;

/// Arguments for `rback list`
#[derive(Args)]
pub struct ListArgs {
    /// Filter by database alias
    #[arg(short, long)]
    pub database: Option<String>,

    /// List media backup contents instead of database backups
    #[arg(long)]
    pub media: bool,
}

/// Handle `rback list`
pub fn handle_list(settings: &Settings, args: &ListArgs) -> BackupResult<()> {
    let rclone = Rclone::from_settings(settings);

    if args.media {
        list_media(settings, &rclone)
    } else {
        list_db(settings, &rclone, args.database.as_deref())
    }
}

fn list_db(settings: &Settings, rclone: &Rclone, database: Option<&str>) -> BackupResult<()> {
    let mut entries = rclone.lsjson(&settings.db_backup_dir, false)?;
    entries.retain(|e| !e.is_dir);

    if let Some(database) = database {
        entries.retain(|e| filenames::belongs_to(&e.name, database, &settings.date_format));
    }

    entries.sort_by(|a, b| {
        b.parsed_mod_time()
            .cmp(&a.parsed_mod_time())
            .then(b.name.cmp(&a.name))
    });

    if entries.is_empty() {
        println!("No database backups found.");
        return Ok(());
    }

    println!("{:<50} {:>12} {:<25}", "Name", "Size", "Modified");
    println!("{}", "-".repeat(89));
    for entry in &entries {
        println!(
            "{:<50} {:>12} {:<25}",
            entry.name,
            format_size(entry.size),
            entry.mod_time
        );
    }
    println!();
    println!("Total: {} backup(s)", entries.len());
    Ok(())
}

fn list_media(settings: &Settings, rclone: &Rclone) -> BackupResult<()> {
    let mut entries = rclone.lsjson(&settings.media_backup_dir, true)?;
    entries.retain(|e| !e.is_dir);
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    if entries.is_empty() {
        println!("No media backups found.");
        return Ok(());
    }

    let total_size: i64 = entries.iter().map(|e| e.size.max(0)).sum();
    println!(
        "Media files: {}, Total size: {}",
        entries.len(),
        format_size(total_size)
    );
    println!();
    println!("{:<60} {:>12}", "Path", "Size");
    println!("{}", "-".repeat(73));
    for entry in &entries {
        println!("{:<60} {:>12}", entry.path, format_size(entry.size));
    }
    Ok(())
}
