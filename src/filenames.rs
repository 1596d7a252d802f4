//! Backup filename convention
//!
//! Backup names are `{alias}-{timestamp}.{extension}`: the database alias,
//! a fixed `-` separator, a formatted timestamp, and the connector-supplied
//! extension. Names never contain path separators, so ownership of a backup
//! is deterministic for listing, retention and restore.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{BackupError, BackupResult};

/// Generate a backup filename for an alias at a point in time
pub fn generate(
    alias: &str,
    timestamp: DateTime<Utc>,
    date_format: &str,
    extension: &str,
) -> BackupResult<String> {
    if alias.is_empty() {
        return Err(BackupError::Filename("database alias is empty".into()));
    }
    if extension.is_empty() {
        return Err(BackupError::Filename("connector extension is empty".into()));
    }
    let filename = format!(
        "{}-{}.{}",
        alias,
        timestamp.format(date_format),
        extension
    );
    if filename.contains('/') || filename.contains('\\') {
        return Err(BackupError::Filename(format!(
            "'{}' contains a path separator",
            filename
        )));
    }
    Ok(filename)
}

/// Recover the database alias from a backup filename
///
/// The alias is the shortest prefix whose remainder (up to the extension)
/// parses as a timestamp in `date_format`, so aliases containing the
/// separator still resolve correctly. Returns `None` for names that don't
/// follow the convention.
pub fn alias_from_backup_name(filename: &str, date_format: &str) -> Option<String> {
    if filename.contains('/') || filename.contains('\\') {
        return None;
    }
    let stem = filename.rsplit_once('.').map(|(stem, _)| stem)?;

    for (idx, _) in stem.match_indices('-') {
        if idx == 0 {
            continue;
        }
        let candidate = &stem[idx + 1..];
        if parses_as_timestamp(candidate, date_format) {
            return Some(stem[..idx].to_string());
        }
    }
    None
}

/// Whether a backup name belongs to the given alias
pub fn belongs_to(filename: &str, alias: &str, date_format: &str) -> bool {
    alias_from_backup_name(filename, date_format).as_deref() == Some(alias)
}

fn parses_as_timestamp(value: &str, date_format: &str) -> bool {
    NaiveDateTime::parse_from_str(value, date_format).is_ok()
        || NaiveDate::parse_from_str(value, date_format).is_ok()
}
