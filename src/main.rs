use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rback::cli::{
    handle_backup, handle_list, handle_media_backup, handle_media_restore, handle_prune,
    handle_restore, BackupArgs, ListArgs, PruneArgs, RestoreArgs,
};
use rback::config::{RbackPaths, Settings};
use rback::events::Hooks;

#[derive(Parser)]
#[command(
    name = "rback",
    version,
    about = "Streaming database and media backups to any rclone remote",
    long_about = "rback backs up databases and media by streaming a \
                  database-native dump straight into rclone over a pipe — \
                  no intermediate files, no local disk usage. Restore runs \
                  the same pipeline in reverse."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backup a database to the rclone remote
    Backup(BackupArgs),

    /// Restore a database from the rclone remote
    Restore(RestoreArgs),

    /// Sync local media to the rclone remote
    MediaBackup,

    /// Sync media from the rclone remote back to the local directory
    MediaRestore,

    /// List database or media backups on the remote
    #[command(alias = "ls")]
    List(ListArgs),

    /// Delete old backups beyond the retention count
    Prune(PruneArgs),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = RbackPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    let hooks = Hooks::new();

    match cli.command {
        Some(Commands::Backup(args)) => {
            settings.validate()?;
            handle_backup(&settings, &hooks, &args)?;
        }
        Some(Commands::Restore(args)) => {
            settings.validate()?;
            handle_restore(&settings, &hooks, &args)?;
        }
        Some(Commands::MediaBackup) => {
            settings.validate()?;
            handle_media_backup(&settings, &hooks)?;
        }
        Some(Commands::MediaRestore) => {
            settings.validate()?;
            handle_media_restore(&settings, &hooks)?;
        }
        Some(Commands::List(args)) => {
            settings.validate()?;
            handle_list(&settings, &args)?;
        }
        Some(Commands::Prune(args)) => {
            settings.validate()?;
            handle_prune(&settings, &args)?;
        }
        Some(Commands::Config) => {
            println!("rback Configuration");
            println!("===================");
            println!("Config file: {}", paths.settings_file().display());
            println!();
            println!("Remote:           {}", display_or(&settings.remote, "(not set)"));
            println!("rclone binary:    {}", settings.rclone_binary);
            println!("DB backup dir:    {}", settings.db_backup_dir);
            println!("Media backup dir: {}", settings.media_backup_dir);
            println!(
                "Media root:       {}",
                settings
                    .media_root
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".into())
            );
            println!("Keep count:       {}", settings.keep);
            println!();
            println!("Databases:");
            if settings.databases.is_empty() {
                println!("  (none configured)");
            }
            let mut aliases: Vec<_> = settings.databases.keys().collect();
            aliases.sort();
            for alias in aliases {
                let db = &settings.databases[alias];
                // Never echo the password
                println!(
                    "  {}: engine={} name={} host={} user={}",
                    alias, db.engine, db.name, db.host, db.user
                );
            }
        }
        None => {
            println!("rback - Streaming database and media backups over rclone");
            println!();
            println!("Run 'rback --help' for usage information.");
        }
    }

    Ok(())
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
