//! SQLite connector
//!
//! Dumps SQL text via the sqlite3 CLI's `.dump` command and restores by
//! feeding SQL text to sqlite3 over stdin. No credentials involved.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::{spawn_tool, Connector};
use crate::config::DatabaseConfig;
use crate::error::BackupResult;

/// SQLite connector using the sqlite3 command-line tool
#[derive(Debug)]
pub struct SqliteConnector {
    config: DatabaseConfig,
}

impl SqliteConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl Connector for SqliteConnector {
    fn extension(&self) -> &'static str {
        "sql"
    }

    fn dump(&self) -> BackupResult<Child> {
        let mut command = Command::new("sqlite3");
        command
            .arg(&self.config.name)
            .arg(".dump")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(database = %self.config.name, "starting sqlite3 dump");
        spawn_tool(&mut command, "sqlite3")
    }

    fn restore(&self, stdin: Stdio) -> BackupResult<Child> {
        let mut command = Command::new("sqlite3");
        command
            .arg(&self.config.name)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(database = %self.config.name, "starting sqlite3 restore");
        spawn_tool(&mut command, "sqlite3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        let connector = SqliteConnector::new(DatabaseConfig {
            engine: "sqlite".into(),
            name: "/var/lib/app/db.sqlite3".into(),
            host: String::new(),
            port: None,
            user: String::new(),
            password: String::new(),
            admin_user: None,
            auth_source: None,
            connector: None,
        });
        assert_eq!(connector.extension(), "sql");
    }
}
