//! Custom error types for rback
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for rback operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// No connector resolves for a database alias or engine
    #[error("No database connector found for {kind}: {identifier}")]
    ConnectorNotFound {
        kind: &'static str,
        identifier: String,
    },

    /// A subprocess could not be started
    #[error("Failed to spawn '{program}': {message}")]
    Spawn { program: String, message: String },

    /// A streaming pipeline completed unsuccessfully
    #[error("{stage} pipeline failed: {detail}")]
    Pipeline { stage: &'static str, detail: String },

    /// A standalone rclone invocation failed
    #[error("rclone {operation} failed (exit {code}): {stderr}")]
    Transfer {
        operation: String,
        code: i32,
        stderr: String,
    },

    /// A single retention delete failed (reported, batch continues)
    #[error("Failed to delete old backup '{path}': {message}")]
    RetentionDelete { path: String, message: String },

    /// Backup filename could not be generated or parsed
    #[error("Invalid backup filename: {0}")]
    Filename(String),
}

impl BackupError {
    /// Create a `ConnectorNotFound` for a database alias
    pub fn alias_not_found(alias: impl Into<String>) -> Self {
        Self::ConnectorNotFound {
            kind: "database alias",
            identifier: alias.into(),
        }
    }

    /// Create a `ConnectorNotFound` for a database engine
    pub fn engine_not_found(engine: impl Into<String>) -> Self {
        Self::ConnectorNotFound {
            kind: "engine",
            identifier: engine.into(),
        }
    }

    /// Map a spawn error, turning "not found" into an actionable message
    pub fn spawn(program: &str, err: &std::io::Error) -> Self {
        let message = if err.kind() == std::io::ErrorKind::NotFound {
            format!(
                "command not found. Ensure '{}' is installed and on PATH.",
                program
            )
        } else {
            err.to_string()
        };
        Self::Spawn {
            program: program.to_string(),
            message,
        }
    }

    /// Check if this is a connector resolution failure
    pub fn is_connector_not_found(&self) -> bool {
        matches!(self, Self::ConnectorNotFound { .. })
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for rback operations
pub type BackupResult<T> = Result<T, BackupError>;
