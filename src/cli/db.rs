//! Database backup, restore and prune commands
//!
//! Backup streams a connector dump into `rclone rcat`; restore streams
//! `rclone cat` into a connector restore process. Uploads land on a
//! temporary `.partial-<uuid>` object first and only move into place once
//! the pipeline reports success, so a half-written backup never shadows a
//! good one.

use std::io::{self, BufRead, Write};

use chrono::Utc;
use clap::Args;
use uuid::Uuid;

use crate::config::Settings;
use crate::connector::registry;
use crate::error::{BackupError, BackupResult};
use crate::events::{Event, Hooks};
use crate::filenames;
use crate::pipeline::{self, Pipeline};
use crate::rclone::Rclone;
use crate::retention::RetentionManager;

/// Arguments for `rback backup`
#[derive(Args)]
pub struct BackupArgs {
    /// Database alias to back up
    #[arg(short, long, default_value = "default")]
    pub database: String,

    /// Remove old backups beyond the retention count after backup
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for `rback restore`
#[derive(Args)]
pub struct RestoreArgs {
    /// Database alias to restore
    #[arg(short, long, default_value = "default")]
    pub database: String,

    /// Specific backup file (relative to the backup dir); latest if omitted
    #[arg(short, long)]
    pub input: Option<String>,

    /// Do not prompt for confirmation before restoring
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for `rback prune`
#[derive(Args)]
pub struct PruneArgs {
    /// Database alias to prune
    #[arg(short, long, default_value = "default")]
    pub database: String,

    /// Number of backups to keep (defaults to the configured value)
    #[arg(short, long)]
    pub keep: Option<u32>,
}

/// Handle `rback backup`
pub fn handle_backup(settings: &Settings, hooks: &Hooks, args: &BackupArgs) -> BackupResult<()> {
    let database = &args.database;
    let connector = registry::resolve(database, settings)?;
    let rclone = Rclone::from_settings(settings);

    let filename = filenames::generate(
        database,
        Utc::now(),
        &settings.date_format,
        connector.extension(),
    )?;
    let remote_path = format!("{}/{}", settings.db_backup_dir, filename);
    let temp_path = format!("{}.partial-{}", remote_path, Uuid::new_v4().simple());

    hooks.publish(&Event::DbBackupStarted {
        database: database.clone(),
    });

    println!("Backing up database '{}' to {}", database, remote_path);

    let mut dump = connector.dump()?;
    let dump_stdout = match pipeline::take_stdout_stdio(&mut dump) {
        Ok(stdout) => stdout,
        Err(err) => {
            pipeline::abort(&mut dump);
            return Err(err);
        }
    };
    let upload = match rclone.rcat(&temp_path, dump_stdout) {
        Ok(child) => child,
        Err(err) => {
            // The dump half is already running; take it down before bailing
            pipeline::abort(&mut dump);
            return Err(err);
        }
    };

    let result = Pipeline::with_timeout(settings.pipeline_timeout()).run(dump, upload)?;
    if !result.success() {
        let _ = rclone.deletefile(&temp_path);
        return Err(BackupError::Pipeline {
            stage: "backup",
            detail: result.combined_stderr(),
        });
    }

    if let Err(err) = rclone.moveto(&temp_path, &remote_path) {
        let _ = rclone.deletefile(&temp_path);
        return Err(err);
    }

    hooks.publish(&Event::DbBackupCompleted {
        database: database.clone(),
        path: remote_path.clone(),
    });

    println!("Backup completed: {}", remote_path);

    if args.clean {
        prune(settings, database, settings.keep)?;
    }

    Ok(())
}

/// Handle `rback restore`
pub fn handle_restore(settings: &Settings, hooks: &Hooks, args: &RestoreArgs) -> BackupResult<()> {
    let database = &args.database;
    let connector = registry::resolve(database, settings)?;
    let rclone = Rclone::from_settings(settings);

    let input = match &args.input {
        Some(input) => validate_input_path(input)?,
        None => find_latest(settings, &rclone, database)?,
    };

    // Refuse a backup that parses to a different alias
    if let Some(owner) = filenames::alias_from_backup_name(&input, &settings.date_format) {
        if owner != *database {
            return Err(BackupError::Config(format!(
                "Backup '{}' appears to belong to database '{}', not '{}'",
                input, owner, database
            )));
        }
    }

    let remote_path = format!("{}/{}", settings.db_backup_dir, input);

    if !args.no_input
        && !confirm(&format!(
            "Restore database '{}' from '{}'? [y/N] ",
            database, remote_path
        ))?
    {
        println!("Restore cancelled.");
        return Ok(());
    }

    hooks.publish(&Event::DbRestoreStarted {
        database: database.clone(),
        path: remote_path.clone(),
    });

    println!("Restoring database '{}' from {}", database, remote_path);

    let mut download = rclone.cat(&remote_path)?;
    let download_stdout = match pipeline::take_stdout_stdio(&mut download) {
        Ok(stdout) => stdout,
        Err(err) => {
            pipeline::abort(&mut download);
            return Err(err);
        }
    };
    let restore = match connector.restore(download_stdout) {
        Ok(child) => child,
        Err(err) => {
            pipeline::abort(&mut download);
            return Err(err);
        }
    };

    let result = Pipeline::with_timeout(settings.pipeline_timeout()).run(download, restore)?;
    if !result.success() {
        return Err(BackupError::Pipeline {
            stage: "restore",
            detail: result.combined_stderr(),
        });
    }

    hooks.publish(&Event::DbRestoreCompleted {
        database: database.clone(),
    });

    println!("Restore completed from: {}", remote_path);
    Ok(())
}

/// Handle `rback prune`
pub fn handle_prune(settings: &Settings, args: &PruneArgs) -> BackupResult<()> {
    let keep = args.keep.unwrap_or(settings.keep);
    prune(settings, &args.database, keep)
}

fn prune(settings: &Settings, database: &str, keep: u32) -> BackupResult<()> {
    let rclone = Rclone::from_settings(settings);
    let manager = RetentionManager::new(&rclone, &settings.db_backup_dir, &settings.date_format);

    let outcome = manager.prune(database, keep)?;
    for path in &outcome.deleted {
        println!("Removed old backup: {}", path);
    }
    for failure in &outcome.failures {
        eprintln!("{}", failure);
    }
    println!(
        "Retention for '{}': kept {}, deleted {}",
        database,
        outcome.kept,
        outcome.deleted.len()
    );
    Ok(())
}

/// Pick the newest backup for an alias from the remote listing
fn find_latest(settings: &Settings, rclone: &Rclone, database: &str) -> BackupResult<String> {
    let manager = RetentionManager::new(rclone, &settings.db_backup_dir, &settings.date_format);
    let backups = manager.list_backups(database)?;
    backups
        .into_iter()
        .next()
        .map(|b| b.name)
        .ok_or_else(|| {
            BackupError::Config(format!("No backups found for database '{}'", database))
        })
}

/// Validate a user-supplied backup path: relative, POSIX-style, no dot
/// segments
fn validate_input_path(input: &str) -> BackupResult<String> {
    if input.is_empty() {
        return Err(BackupError::Config("--input cannot be empty".into()));
    }
    if input.contains('\\') || input.starts_with('/') {
        return Err(BackupError::Config(
            "--input must be a relative POSIX-style path".into(),
        ));
    }
    let parts: Vec<&str> = input.split('/').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() || parts.iter().any(|p| *p == "." || *p == "..") {
        return Err(BackupError::Config(
            "--input cannot contain '.' or '..' path segments".into(),
        ));
    }
    Ok(parts.join("/"))
}

fn confirm(prompt: &str) -> BackupResult<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
