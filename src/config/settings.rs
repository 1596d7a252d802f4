//! User settings for rback
//!
//! Manages the JSON configuration file: the rclone remote, remote layout,
//! database definitions, connector overrides, and retention policy.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::RbackPaths;
use crate::error::{BackupError, BackupResult};

/// Configuration for a single database alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database engine identifier (e.g. "postgresql", "mysql", "sqlite")
    pub engine: String,
    /// Database name (or file path for SQLite)
    pub name: String,
    /// Server host (empty for local/socket connections)
    #[serde(default)]
    pub host: String,
    /// Server port
    #[serde(default)]
    pub port: Option<u16>,
    /// Connection user
    #[serde(default)]
    pub user: String,
    /// Connection password (passed via environment, never argv)
    #[serde(default)]
    pub password: String,
    /// Privileged user for extension bootstrap (PostGIS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,
    /// Authentication database (MongoDB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_source: Option<String>,
    /// Alias-level connector override (a registered connector identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
}

/// User settings for rback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// rclone remote root (e.g. "s3:my-bucket/backups"). Required.
    #[serde(default)]
    pub remote: String,

    /// Path to the rclone binary
    #[serde(default = "default_rclone_binary")]
    pub rclone_binary: String,

    /// Explicit rclone config file (--config), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rclone_config: Option<String>,

    /// Extra flags passed to every rclone invocation
    #[serde(default)]
    pub rclone_flags: Vec<String>,

    /// Remote sub-path for database backups
    #[serde(default = "default_db_backup_dir")]
    pub db_backup_dir: String,

    /// Remote sub-path for media backups
    #[serde(default = "default_media_backup_dir")]
    pub media_backup_dir: String,

    /// Local media directory synced by media-backup/media-restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_root: Option<PathBuf>,

    /// chrono format string for backup filename timestamps
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Number of backups to keep per alias when pruning
    #[serde(default = "default_keep")]
    pub keep: u32,

    /// Wall-clock ceiling for a backup/restore pipeline, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_timeout_secs: Option<u64>,

    /// Databases by alias
    #[serde(default)]
    pub databases: HashMap<String, DatabaseConfig>,

    /// Engine-to-connector-identifier overrides, merged over the built-ins
    #[serde(default)]
    pub connector_mapping: HashMap<String, String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_rclone_binary() -> String {
    "rclone".to_string()
}

fn default_db_backup_dir() -> String {
    "db".to_string()
}

fn default_media_backup_dir() -> String {
    "media".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d-%H%M%S".to_string()
}

fn default_keep() -> u32 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            remote: String::new(),
            rclone_binary: default_rclone_binary(),
            rclone_config: None,
            rclone_flags: Vec::new(),
            db_backup_dir: default_db_backup_dir(),
            media_backup_dir: default_media_backup_dir(),
            media_root: None,
            date_format: default_date_format(),
            keep: default_keep(),
            pipeline_timeout_secs: None,
            databases: HashMap::new(),
            connector_mapping: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if no file exists yet
    pub fn load_or_create(paths: &RbackPaths) -> BackupResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| BackupError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &RbackPaths) -> BackupResult<()> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BackupError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| BackupError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Validate settings for use by backup/restore operations
    ///
    /// Fails fast on a missing remote and on connector override identifiers
    /// that don't resolve to a registered connector, so misconfiguration
    /// surfaces at startup rather than at first use.
    pub fn validate(&self) -> BackupResult<()> {
        if self.remote.is_empty() {
            return Err(BackupError::Config(
                "'remote' must be configured (e.g. \"s3:my-bucket/backups\")".into(),
            ));
        }

        for (alias, db) in &self.databases {
            if let Some(identifier) = &db.connector {
                if !crate::connector::registry::is_registered(identifier) {
                    return Err(BackupError::Config(format!(
                        "Database '{}' references unknown connector '{}'",
                        alias, identifier
                    )));
                }
            }
        }

        for (engine, identifier) in &self.connector_mapping {
            if !crate::connector::registry::is_registered(identifier) {
                return Err(BackupError::Config(format!(
                    "connector_mapping for engine '{}' references unknown connector '{}'",
                    engine, identifier
                )));
            }
        }

        Ok(())
    }

    /// Look up a database configuration by alias
    pub fn database(&self, alias: &str) -> BackupResult<&DatabaseConfig> {
        self.databases
            .get(alias)
            .ok_or_else(|| BackupError::alias_not_found(alias))
    }

    /// Pipeline timeout as a Duration, if configured
    pub fn pipeline_timeout(&self) -> Option<std::time::Duration> {
        self.pipeline_timeout_secs
            .map(std::time::Duration::from_secs)
    }
}
