//! MongoDB connector
//!
//! Streams with mongodump/mongorestore using the `--archive` container
//! format over stdout/stdin, so no intermediate BSON files touch disk.

use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::{spawn_tool, Connector};
use crate::config::DatabaseConfig;
use crate::error::BackupResult;

/// MongoDB connector using mongodump/mongorestore archive streaming
#[derive(Debug)]
pub struct MongoDumpConnector {
    config: DatabaseConfig,
}

impl MongoDumpConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn host_port(&self) -> String {
        let host = if self.config.host.is_empty() {
            "localhost"
        } else {
            &self.config.host
        };
        let port = self.config.port.unwrap_or(27017);
        format!("{}:{}", host, port)
    }

    fn auth_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.config.user.is_empty() {
            args.push("--username".into());
            args.push(self.config.user.clone());
        }
        if !self.config.password.is_empty() {
            args.push("--password".into());
            args.push(self.config.password.clone());
        }
        if let Some(auth_source) = &self.config.auth_source {
            if !auth_source.is_empty() {
                args.push("--authenticationDatabase".into());
                args.push(auth_source.clone());
            }
        }
        args
    }
}

impl Connector for MongoDumpConnector {
    fn extension(&self) -> &'static str {
        "archive"
    }

    fn dump(&self) -> BackupResult<Child> {
        let mut command = Command::new("mongodump");
        command
            .arg("--db")
            .arg(&self.config.name)
            .arg("--host")
            .arg(self.host_port())
            .args(self.auth_args())
            .arg("--archive")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(database = %self.config.name, "starting mongodump");
        spawn_tool(&mut command, "mongodump")
    }

    fn restore(&self, stdin: Stdio) -> BackupResult<Child> {
        let mut command = Command::new("mongorestore");
        command
            .arg("--host")
            .arg(self.host_port())
            .args(self.auth_args())
            .arg("--drop")
            .arg("--archive")
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(database = %self.config.name, "starting mongorestore");
        spawn_tool(&mut command, "mongorestore")
    }
}
