//! Path management for rback
//!
//! Provides XDG-compliant path resolution for the configuration file.
//!
//! ## Path Resolution Order
//!
//! 1. `RBACK_CONFIG_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/rback` or `~/.config/rback`
//! 3. Windows: `%APPDATA%\rback`

use std::path::PathBuf;

use crate::error::BackupError;

/// Manages all paths used by rback
#[derive(Debug, Clone)]
pub struct RbackPaths {
    /// Base directory for rback configuration
    base_dir: PathBuf,
}

impl RbackPaths {
    /// Create a new RbackPaths instance
    ///
    /// Path resolution:
    /// 1. `RBACK_CONFIG_DIR` env var (explicit override)
    /// 2. Unix: `$XDG_CONFIG_HOME/rback` or `~/.config/rback`
    /// 3. Windows: `%APPDATA%\rback`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, BackupError> {
        let base_dir = if let Ok(custom) = std::env::var("RBACK_CONFIG_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create RbackPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/rback/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the configuration directory exists
    pub fn ensure_directories(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BackupError::Io(format!("Failed to create config directory: {}", e)))?;
        Ok(())
    }

    /// Check if rback has been configured (config file exists)
    pub fn is_configured(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default configuration directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    // Unix (Linux/macOS): Use XDG_CONFIG_HOME if set, otherwise ~/.config
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            std::env::var("HOME").map(|home| PathBuf::from(home).join(".config"))
        })
        .map_err(|_| BackupError::Config("Could not determine home directory".into()))?;
    Ok(config_base.join("rback"))
}

/// Resolve the default configuration directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, BackupError> {
    // Windows: Use APPDATA
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BackupError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("rback"))
}
