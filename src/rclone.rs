//! Thin subprocess wrapper around the rclone binary
//!
//! Four operations back the whole system: streaming upload (`rcat`),
//! streaming download (`cat`), directory mirroring (`sync`), and structured
//! listing (`lsjson`), plus `deletefile`/`moveto` for retention and the
//! partial-upload protocol. Compression, encryption, retries and storage
//! backends are all rclone's problem, not ours.

use std::process::{Child, Command, Stdio};

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::Settings;
use crate::error::{BackupError, BackupResult};

/// One entry from an rclone `lsjson` listing
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Path", default)]
    pub path: String,
    /// Size in bytes; rclone reports -1 when unknown
    #[serde(rename = "Size", default)]
    pub size: i64,
    /// Modification timestamp as an ISO-8601 string
    #[serde(rename = "ModTime", default)]
    pub mod_time: String,
    #[serde(rename = "IsDir", default)]
    pub is_dir: bool,
}

impl RemoteEntry {
    /// Parse the modification timestamp, falling back to the epoch so
    /// unparseable entries sort last rather than erroring a whole listing
    pub fn parsed_mod_time(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.mod_time)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }
}

/// Wraps rclone invocations as subprocesses with piped I/O
pub struct Rclone {
    remote: String,
    binary: String,
    config: Option<String>,
    flags: Vec<String>,
}

impl Rclone {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            remote: settings.remote.clone(),
            binary: settings.rclone_binary.clone(),
            config: settings.rclone_config.clone(),
            flags: settings.rclone_flags.clone(),
        }
    }

    /// Arguments common to every invocation (--config and extra flags)
    fn base_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(config) = &self.config {
            if !config.is_empty() {
                args.push("--config".into());
                args.push(config.clone());
            }
        }
        args.extend(self.flags.iter().cloned());
        args
    }

    /// Join the configured remote with a subpath
    pub fn remote_path(&self, path: &str) -> String {
        let remote = self.remote.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            remote.to_string()
        } else {
            format!("{}/{}", remote, path)
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(self.base_args());
        command
    }

    /// Run a non-pipelined rclone invocation, capturing output
    fn run(&self, operation: &str, args: &[String]) -> BackupResult<Vec<u8>> {
        debug!(operation, ?args, "running rclone");
        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BackupError::spawn(&self.binary, &e))?;

        if !output.status.success() {
            return Err(BackupError::Transfer {
                operation: operation.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Spawn a streaming upload: data flows from `stdin` to the remote file
    ///
    /// Returns the running child for the pipeline to finalize; stderr is
    /// piped so the pipeline can drain it.
    pub fn rcat(&self, path: &str, stdin: Stdio) -> BackupResult<Child> {
        let target = self.remote_path(path);
        debug!(%target, "starting rclone rcat");
        self.command()
            .arg("rcat")
            .arg(&target)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackupError::spawn(&self.binary, &e))
    }

    /// Spawn a streaming download: the returned child's stdout carries the
    /// remote file's content, suitable for feeding a restore connector
    pub fn cat(&self, path: &str) -> BackupResult<Child> {
        let source = self.remote_path(path);
        debug!(%source, "starting rclone cat");
        self.command()
            .arg("cat")
            .arg(&source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackupError::spawn(&self.binary, &e))
    }

    /// Mirror `src` into `dst`: only changed entries transfer, and entries
    /// absent from the source are removed from the destination
    pub fn sync(&self, src: &str, dst: &str) -> BackupResult<()> {
        self.run("sync", &["sync".into(), src.into(), dst.into()])?;
        Ok(())
    }

    /// Structured listing of a remote sub-path
    pub fn lsjson(&self, path: &str, recursive: bool) -> BackupResult<Vec<RemoteEntry>> {
        let mut args = vec!["lsjson".to_string(), self.remote_path(path)];
        if recursive {
            args.push("--recursive".into());
        }
        let stdout = self.run("lsjson", &args)?;
        parse_lsjson(&stdout)
    }

    /// Delete a single remote file
    pub fn deletefile(&self, path: &str) -> BackupResult<()> {
        self.run(
            "deletefile",
            &["deletefile".into(), self.remote_path(path)],
        )?;
        Ok(())
    }

    /// Move one remote object to another path
    pub fn moveto(&self, src: &str, dst: &str) -> BackupResult<()> {
        self.run(
            "moveto",
            &[
                "moveto".into(),
                self.remote_path(src),
                self.remote_path(dst),
            ],
        )?;
        Ok(())
    }
}

/// Parse rclone lsjson output
fn parse_lsjson(bytes: &[u8]) -> BackupResult<Vec<RemoteEntry>> {
    serde_json::from_slice(bytes)
        .map_err(|e| BackupError::Json(format!("Failed to parse rclone lsjson output: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rclone() -> Rclone {
        Rclone {
            remote: "s3:bucket/backups".into(),
            binary: "rclone".into(),
            config: None,
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_remote_path_join() {
        let rc = rclone();
        assert_eq!(rc.remote_path("db/x.dump"), "s3:bucket/backups/db/x.dump");
        assert_eq!(rc.remote_path("/db/x.dump"), "s3:bucket/backups/db/x.dump");
        assert_eq!(rc.remote_path(""), "s3:bucket/backups");
    }

    #[test]
    fn test_remote_path_trailing_slash() {
        let mut rc = rclone();
        rc.remote = "s3:bucket/backups/".into();
        assert_eq!(rc.remote_path("db"), "s3:bucket/backups/db");
    }

    #[test]
    fn test_base_args_include_config_and_flags() {
        let mut rc = rclone();
        rc.config = Some("/etc/rclone.conf".into());
        rc.flags = vec!["--transfers".into(), "8".into()];
        assert_eq!(
            rc.base_args(),
            vec!["--config", "/etc/rclone.conf", "--transfers", "8"]
        );
    }

    #[test]
    fn test_parse_lsjson() {
        let json = br#"[
            {"Path":"default-2024-01-02-030405.dump","Name":"default-2024-01-02-030405.dump","Size":1048576,"ModTime":"2024-01-02T03:04:05.000000000Z","IsDir":false},
            {"Path":"media","Name":"media","Size":-1,"ModTime":"2024-01-01T00:00:00Z","IsDir":true}
        ]"#;
        let entries = parse_lsjson(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "default-2024-01-02-030405.dump");
        assert_eq!(entries[0].size, 1048576);
        assert!(!entries[0].is_dir);
        assert!(entries[1].is_dir);
    }

    #[test]
    fn test_parsed_mod_time() {
        let entry = RemoteEntry {
            name: "x".into(),
            path: "x".into(),
            size: 0,
            mod_time: "2024-06-01T12:00:00Z".into(),
            is_dir: false,
        };
        let parsed = entry.parsed_mod_time();
        assert_eq!(parsed.timestamp(), 1717243200);
    }

    #[test]
    fn test_parsed_mod_time_invalid_falls_back() {
        let entry = RemoteEntry {
            name: "x".into(),
            path: "x".into(),
            size: 0,
            mod_time: "not-a-date".into(),
            is_dir: false,
        };
        assert_eq!(entry.parsed_mod_time().timestamp(), 0);
    }

    #[test]
    fn test_parse_lsjson_rejects_garbage() {
        assert!(parse_lsjson(b"not json").is_err());
    }
}
