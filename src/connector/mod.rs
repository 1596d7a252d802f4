//! Database connectors
//!
//! A connector adapts one database engine to a uniform streaming contract:
//! `dump()` starts a subprocess writing the backup payload to its stdout,
//! `restore()` starts a subprocess reading that payload from the given stdin.
//! Connectors never run the transfer themselves; the pipeline module wires
//! them to rclone.
//!
//! Credentials for server databases are passed through process environment
//! variables (`PGPASSWORD`, `MYSQL_PWD`), never as command-line arguments,
//! so they don't show up in process listings.

pub mod mongodb;
pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod sqlite;

use std::process::{Child, Command, Stdio};

use crate::error::{BackupError, BackupResult};

pub use mongodb::MongoDumpConnector;
pub use mysql::MysqlDumpConnector;
pub use postgres::{PgDumpConnector, PgDumpGisConnector};
pub use sqlite::SqliteConnector;

/// Uniform dump/restore contract for one database engine
pub trait Connector: std::fmt::Debug {
    /// File extension for backups produced by this connector
    /// (non-empty, no path separators)
    fn extension(&self) -> &'static str;

    /// Start a dump subprocess with stdout piped
    fn dump(&self) -> BackupResult<Child>;

    /// Start a restore subprocess reading the backup payload from `stdin`
    fn restore(&self, stdin: Stdio) -> BackupResult<Child>;
}

/// Spawn a connector subprocess, mapping launch errors to `Spawn`
pub(crate) fn spawn_tool(command: &mut Command, program: &str) -> BackupResult<Child> {
    command
        .spawn()
        .map_err(|e| BackupError::spawn(program, &e))
}
