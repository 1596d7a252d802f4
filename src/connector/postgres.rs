//! PostgreSQL connectors
//!
//! `PgDumpConnector` streams with pg_dump/pg_restore in custom format.
//! `PgDumpGisConnector` additionally ensures the PostGIS extension exists
//! before restore when an admin user is configured.

use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use super::{spawn_tool, Connector};
use crate::config::DatabaseConfig;
use crate::error::{BackupError, BackupResult};

/// PostgreSQL connector using pg_dump/pg_restore with custom format
#[derive(Debug)]
pub struct PgDumpConnector {
    config: DatabaseConfig,
}

impl PgDumpConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.config.host.is_empty() {
            args.push("-h".into());
            args.push(self.config.host.clone());
        }
        if let Some(port) = self.config.port {
            args.push("-p".into());
            args.push(port.to_string());
        }
        if !self.config.user.is_empty() {
            args.push("-U".into());
            args.push(self.config.user.clone());
        }
        args
    }

    /// Apply PGPASSWORD to a command's environment (never passed via argv)
    fn apply_env(&self, command: &mut Command) {
        if !self.config.password.is_empty() {
            command.env("PGPASSWORD", &self.config.password);
        }
    }

    fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl Connector for PgDumpConnector {
    fn extension(&self) -> &'static str {
        "dump"
    }

    fn dump(&self) -> BackupResult<Child> {
        let mut command = Command::new("pg_dump");
        command
            .arg("--format=custom")
            .arg("--no-password")
            .args(self.connection_args())
            .arg(&self.config.name)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_env(&mut command);
        debug!(database = %self.config.name, "starting pg_dump");
        spawn_tool(&mut command, "pg_dump")
    }

    fn restore(&self, stdin: Stdio) -> BackupResult<Child> {
        let mut command = Command::new("pg_restore");
        command
            .arg("--no-owner")
            .arg("--no-acl")
            .arg("--clean")
            .arg("--if-exists")
            .arg("--no-password")
            .arg("-d")
            .arg(&self.config.name)
            .args(self.connection_args())
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.apply_env(&mut command);
        debug!(database = %self.config.name, "starting pg_restore");
        spawn_tool(&mut command, "pg_restore")
    }
}

/// PostGIS-aware PostgreSQL connector
///
/// Same as `PgDumpConnector`, but ensures the PostGIS extension is enabled
/// before restore. Requires `admin_user` in the database configuration to
/// run `CREATE EXTENSION` with sufficient privileges; without it the
/// bootstrap is skipped with a warning and restore proceeds as the plain
/// connector would.
#[derive(Debug)]
pub struct PgDumpGisConnector {
    inner: PgDumpConnector,
}

impl PgDumpGisConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            inner: PgDumpConnector::new(config),
        }
    }

    /// Create the PostGIS extension if it doesn't exist
    fn enable_postgis(&self, admin_user: &str) -> BackupResult<()> {
        let config = self.inner.config();
        let mut command = Command::new("psql");
        command
            .arg("-c")
            .arg("CREATE EXTENSION IF NOT EXISTS postgis;")
            .arg("--no-password")
            .arg("-U")
            .arg(admin_user);
        if !config.host.is_empty() {
            command.arg("-h").arg(&config.host);
        }
        if let Some(port) = config.port {
            command.arg("-p").arg(port.to_string());
        }
        command.arg(&config.name);
        self.inner.apply_env(&mut command);

        let output = command
            .output()
            .map_err(|e| BackupError::spawn("psql", &e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackupError::Pipeline {
                stage: "restore",
                detail: format!("Failed to enable PostGIS extension: {}", stderr),
            });
        }
        Ok(())
    }
}

impl Connector for PgDumpGisConnector {
    fn extension(&self) -> &'static str {
        self.inner.extension()
    }

    fn dump(&self) -> BackupResult<Child> {
        self.inner.dump()
    }

    fn restore(&self, stdin: Stdio) -> BackupResult<Child> {
        match self.inner.config().admin_user.as_deref() {
            Some(admin_user) if !admin_user.is_empty() => {
                self.enable_postgis(admin_user)?;
            }
            _ => {
                warn!(
                    database = %self.inner.config().name,
                    "no admin_user configured; skipping PostGIS extension bootstrap"
                );
            }
        }
        self.inner.restore(stdin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            engine: "postgresql".into(),
            name: "appdb".into(),
            host: "db.internal".into(),
            port: Some(5433),
            user: "app".into(),
            password: "secret".into(),
            admin_user: None,
            auth_source: None,
            connector: None,
        }
    }

    #[test]
    fn test_extension() {
        let connector = PgDumpConnector::new(config());
        assert_eq!(connector.extension(), "dump");

        let gis = PgDumpGisConnector::new(config());
        assert_eq!(gis.extension(), "dump");
    }

    #[test]
    fn test_connection_args_include_host_port_user() {
        let connector = PgDumpConnector::new(config());
        let args = connector.connection_args();
        assert_eq!(
            args,
            vec!["-h", "db.internal", "-p", "5433", "-U", "app"]
        );
    }

    #[test]
    fn test_connection_args_omit_empty_fields() {
        let mut cfg = config();
        cfg.host = String::new();
        cfg.port = None;
        cfg.user = String::new();
        let connector = PgDumpConnector::new(cfg);
        assert!(connector.connection_args().is_empty());
    }

    #[test]
    fn test_password_never_in_args() {
        let connector = PgDumpConnector::new(config());
        let args = connector.connection_args();
        assert!(!args.iter().any(|a| a.contains("secret")));
    }
}
