//! End-to-end CLI tests
//!
//! Drive the compiled binary against a temporary config directory. Where a
//! remote is needed, a shell script standing in for rclone maps the remote
//! onto a local directory, so no network or real rclone is required.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rback(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rback").unwrap();
    cmd.env("RBACK_CONFIG_DIR", config_dir.path());
    cmd
}

fn write_config(config_dir: &TempDir, contents: &str) {
    std::fs::write(config_dir.path().join("config.json"), contents).unwrap();
}

#[test]
fn no_args_prints_usage_hint() {
    let dir = TempDir::new().unwrap();
    rback(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("rback --help"));
}

#[test]
fn config_shows_unset_remote() {
    let dir = TempDir::new().unwrap();
    rback(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn config_never_echoes_passwords() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"{
            "remote": "s3:bucket",
            "databases": {
                "default": {
                    "engine": "postgresql",
                    "name": "appdb",
                    "user": "app",
                    "password": "super-secret-pw"
                }
            }
        }"#,
    );
    rback(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret-pw").not());
}

#[test]
fn backup_requires_configured_remote() {
    let dir = TempDir::new().unwrap();
    rback(&dir)
        .arg("backup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote"));
}

#[test]
fn backup_unknown_alias_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, r#"{"remote": "s3:bucket"}"#);
    rback(&dir)
        .args(["backup", "--database", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database connector found"));
}

#[test]
fn unknown_connector_override_fails_fast() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"{
            "remote": "s3:bucket",
            "databases": {
                "default": {
                    "engine": "postgresql",
                    "name": "appdb",
                    "connector": "oracle"
                }
            }
        }"#,
    );
    // Fails at validation even for commands that never touch that database
    rback(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("oracle"));
}

#[test]
fn restore_rejects_traversal_input() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"{
            "remote": "s3:bucket",
            "databases": {
                "default": {"engine": "sqlite", "name": "/tmp/db.sqlite3"}
            }
        }"#,
    );
    rback(&dir)
        .args(["restore", "--no-input", "--input", "../other.dump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'.' or '..'"));
}

#[cfg(unix)]
mod with_fake_rclone {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Install a shell script that maps rclone operations onto a local
    /// directory acting as the remote.
    fn install_fake_rclone(dir: &Path) -> String {
        let script = dir.join("rclone");
        std::fs::write(
            &script,
            r#"#!/bin/sh
op="$1"; shift
case "$op" in
    sync)
        rm -rf "$2"
        mkdir -p "$2"
        cp -R "$1/." "$2"
        ;;
    lsjson)
        echo "[]"
        ;;
    rcat)
        mkdir -p "$(dirname "$1")"
        cat > "$1"
        ;;
    cat)
        cat "$1"
        ;;
    moveto)
        mkdir -p "$(dirname "$2")"
        mv "$1" "$2"
        ;;
    deletefile)
        rm -f "$1"
        ;;
    *)
        echo "unsupported op: $op" >&2
        exit 1
        ;;
esac
"#,
        )
        .unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script.display().to_string()
    }

    #[test]
    fn media_backup_mirrors_local_directory() {
        let dir = TempDir::new().unwrap();
        let remote = dir.path().join("remote");
        let media = dir.path().join("media");
        std::fs::create_dir_all(&media).unwrap();
        std::fs::write(media.join("photo.jpg"), b"jpeg-bytes").unwrap();

        let binary = install_fake_rclone(dir.path());
        write_config(
            &dir,
            &format!(
                r#"{{
                    "remote": "{}",
                    "rclone_binary": "{}",
                    "media_root": "{}"
                }}"#,
                remote.display(),
                binary,
                media.display()
            ),
        );

        rback(&dir)
            .arg("media-backup")
            .assert()
            .success()
            .stdout(predicate::str::contains("Media backup completed."));

        let mirrored = remote.join("media").join("photo.jpg");
        assert_eq!(std::fs::read(mirrored).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn list_reports_empty_remote() {
        let dir = TempDir::new().unwrap();
        let binary = install_fake_rclone(dir.path());
        write_config(
            &dir,
            &format!(
                r#"{{"remote": "{}", "rclone_binary": "{}"}}"#,
                dir.path().join("remote").display(),
                binary
            ),
        );

        rback(&dir)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No database backups found."));

        rback(&dir)
            .args(["list", "--media"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No media backups found."));
    }

    #[test]
    fn rclone_binary_missing_is_actionable() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"{"remote": "s3:bucket", "rclone_binary": "/nonexistent/rclone"}"#,
        );

        rback(&dir)
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("command not found"));
    }
}
