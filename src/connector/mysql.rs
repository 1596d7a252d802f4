//! MySQL/MariaDB connector
//!
//! Streams with mysqldump/mysql. The password is passed via the MYSQL_PWD
//! environment variable, never as a command-line argument.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::{spawn_tool, Connector};
use crate::config::DatabaseConfig;
use crate::error::BackupResult;

/// MySQL/MariaDB connector using mysqldump and the mysql client
#[derive(Debug)]
pub struct MysqlDumpConnector {
    config: DatabaseConfig,
}

impl MysqlDumpConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.config.host.is_empty() {
            args.push("--host".into());
            args.push(self.config.host.clone());
        }
        if let Some(port) = self.config.port {
            args.push("--port".into());
            args.push(port.to_string());
        }
        if !self.config.user.is_empty() {
            args.push("--user".into());
            args.push(self.config.user.clone());
        }
        args
    }

    fn apply_env(&self, command: &mut Command) {
        if !self.config.password.is_empty() {
            command.env("MYSQL_PWD", &self.config.password);
        }
    }
}

impl Connector for MysqlDumpConnector {
    fn extension(&self) -> &'static str {
        "sql"
    }

    fn dump(&self) -> BackupResult<Child> {
        let mut command = Command::new("mysqldump");
        command
            .arg("--quick")
            .args(self.connection_args())
            .arg(&self.config.name)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_env(&mut command);
        debug!(database = %self.config.name, "starting mysqldump");
        spawn_tool(&mut command, "mysqldump")
    }

    fn restore(&self, stdin: Stdio) -> BackupResult<Child> {
        let mut command = Command::new("mysql");
        command
            .args(self.connection_args())
            .arg(&self.config.name)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_env(&mut command);
        debug!(database = %self.config.name, "starting mysql restore");
        spawn_tool(&mut command, "mysql")
    }
}
