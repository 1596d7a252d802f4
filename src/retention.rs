//! Backup retention
//!
//! Keeps only the newest K backups per database alias, deleting the rest
//! from the remote. Built on the remote listing: descriptors are only ever
//! read back from the remote, never constructed speculatively.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{BackupError, BackupResult};
use crate::filenames;
use crate::rclone::{Rclone, RemoteEntry};

/// Listing and deletion surface retention needs from the remote
///
/// Implemented by [`Rclone`]; faked in tests.
pub trait RemoteStore {
    fn list(&self, dir: &str) -> BackupResult<Vec<RemoteEntry>>;
    fn delete(&self, path: &str) -> BackupResult<()>;
}

impl RemoteStore for Rclone {
    fn list(&self, dir: &str) -> BackupResult<Vec<RemoteEntry>> {
        self.lsjson(dir, false)
    }

    fn delete(&self, path: &str) -> BackupResult<()> {
        self.deletefile(path)
    }
}

/// One backup as observed on the remote
#[derive(Debug, Clone)]
pub struct BackupDescriptor {
    /// Backup filename
    pub name: String,
    /// Path relative to the remote root (backup dir + name)
    pub remote_path: String,
    /// Modification timestamp from the listing
    pub mod_time: DateTime<Utc>,
    /// Size in bytes (-1 when the backend doesn't report it)
    pub size: i64,
}

/// Outcome of a prune run
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Remote paths that were deleted
    pub deleted: Vec<String>,
    /// Per-entry delete failures; the batch continued past each one
    pub failures: Vec<BackupError>,
    /// Number of backups retained
    pub kept: usize,
}

/// Computes and executes the deletion set for one alias
///
/// Concurrent prune runs for the same alias are not coordinated; callers
/// that need that must serialize them.
pub struct RetentionManager<'a, S: RemoteStore> {
    store: &'a S,
    backup_dir: String,
    date_format: String,
}

impl<'a, S: RemoteStore> RetentionManager<'a, S> {
    pub fn new(store: &'a S, backup_dir: impl Into<String>, date_format: impl Into<String>) -> Self {
        Self {
            store,
            backup_dir: backup_dir.into(),
            date_format: date_format.into(),
        }
    }

    /// List this alias's backups, newest first (ties broken by name,
    /// descending, for determinism)
    pub fn list_backups(&self, alias: &str) -> BackupResult<Vec<BackupDescriptor>> {
        let entries = self.store.list(&self.backup_dir)?;
        let mut backups: Vec<BackupDescriptor> = entries
            .into_iter()
            .filter(|e| !e.is_dir && filenames::belongs_to(&e.name, alias, &self.date_format))
            .map(|e| BackupDescriptor {
                remote_path: format!("{}/{}", self.backup_dir, e.name),
                mod_time: e.parsed_mod_time(),
                size: e.size,
                name: e.name,
            })
            .collect();

        backups.sort_by(|a, b| b.mod_time.cmp(&a.mod_time).then(b.name.cmp(&a.name)));
        Ok(backups)
    }

    /// Keep the newest `keep` backups for `alias` and delete the rest
    ///
    /// Idempotent: a second run after pruning deletes nothing. A single
    /// delete failure is recorded and the remaining deletions proceed.
    pub fn prune(&self, alias: &str, keep: u32) -> BackupResult<PruneOutcome> {
        let backups = self.list_backups(alias)?;
        let keep = keep as usize;

        let mut outcome = PruneOutcome {
            kept: backups.len().min(keep),
            ..PruneOutcome::default()
        };

        for backup in backups.into_iter().skip(keep) {
            match self.store.delete(&backup.remote_path) {
                Ok(()) => {
                    info!(path = %backup.remote_path, "removed old backup");
                    outcome.deleted.push(backup.remote_path);
                }
                Err(err) => {
                    warn!(path = %backup.remote_path, %err, "failed to delete old backup");
                    outcome.failures.push(BackupError::RetentionDelete {
                        path: backup.remote_path,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// In-memory remote with optional per-path delete failures
    struct FakeStore {
        entries: RefCell<Vec<RemoteEntry>>,
        fail_deletes: HashSet<String>,
    }

    impl FakeStore {
        fn new(entries: Vec<RemoteEntry>) -> Self {
            Self {
                entries: RefCell::new(entries),
                fail_deletes: HashSet::new(),
            }
        }
    }

    impl RemoteStore for FakeStore {
        fn list(&self, _dir: &str) -> BackupResult<Vec<RemoteEntry>> {
            Ok(self.entries.borrow().clone())
        }

        fn delete(&self, path: &str) -> BackupResult<()> {
            if self.fail_deletes.contains(path) {
                return Err(BackupError::Transfer {
                    operation: "deletefile".into(),
                    code: 1,
                    stderr: "permission denied".into(),
                });
            }
            let name = path.rsplit('/').next().unwrap().to_string();
            self.entries.borrow_mut().retain(|e| e.name != name);
            Ok(())
        }
    }

    const FORMAT: &str = "%Y-%m-%d-%H%M%S";

    fn entry(alias: &str, hour: u32) -> RemoteEntry {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
        RemoteEntry {
            name: format!("{}-{}.dump", alias, ts.format(FORMAT)),
            path: String::new(),
            size: 1024,
            mod_time: ts.to_rfc3339(),
            is_dir: false,
        }
    }

    fn hourly_backups(alias: &str, count: u32) -> Vec<RemoteEntry> {
        (0..count).map(|h| entry(alias, h)).collect()
    }

    fn manager(store: &FakeStore) -> RetentionManager<'_, FakeStore> {
        RetentionManager::new(store, "db", FORMAT)
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let store = FakeStore::new(hourly_backups("default", 5));
        let backups = manager(&store).list_backups("default").unwrap();

        assert_eq!(backups.len(), 5);
        for pair in backups.windows(2) {
            assert!(pair[0].mod_time >= pair[1].mod_time);
        }
    }

    #[test]
    fn test_list_ties_broken_by_name_descending() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut a = entry("default", 0);
        a.name = format!("default-{}.a", ts.format(FORMAT));
        let mut b = entry("default", 0);
        b.name = format!("default-{}.b", ts.format(FORMAT));

        let store = FakeStore::new(vec![a, b]);
        let backups = manager(&store).list_backups("default").unwrap();
        assert!(backups[0].name > backups[1].name);
    }

    #[test]
    fn test_list_filters_other_aliases_and_dirs() {
        let mut entries = hourly_backups("default", 3);
        entries.extend(hourly_backups("reporting", 2));
        entries.push(RemoteEntry {
            name: "subdir".into(),
            path: String::new(),
            size: -1,
            mod_time: String::new(),
            is_dir: true,
        });

        let store = FakeStore::new(entries);
        let backups = manager(&store).list_backups("default").unwrap();
        assert_eq!(backups.len(), 3);
        assert!(backups.iter().all(|b| b.name.starts_with("default-")));
    }

    #[test]
    fn test_prune_deletes_oldest_beyond_keep() {
        // 12 hourly backups, keep 10: exactly the 2 oldest go
        let store = FakeStore::new(hourly_backups("default", 12));
        let mgr = manager(&store);

        let outcome = mgr.prune("default", 10).unwrap();
        assert_eq!(outcome.deleted.len(), 2);
        assert_eq!(outcome.kept, 10);
        assert!(outcome.failures.is_empty());

        // The two oldest (hours 0 and 1) are the ones deleted
        assert!(outcome
            .deleted
            .iter()
            .any(|p| p.contains("default-2024-06-01-000000")));
        assert!(outcome
            .deleted
            .iter()
            .any(|p| p.contains("default-2024-06-01-010000")));

        // The 10 newest remain, still newest-first
        let remaining = mgr.list_backups("default").unwrap();
        assert_eq!(remaining.len(), 10);
        assert!(remaining[0].name.contains("110000"));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let store = FakeStore::new(hourly_backups("default", 12));
        let mgr = manager(&store);

        mgr.prune("default", 10).unwrap();
        let second = mgr.prune("default", 10).unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(second.kept, 10);
    }

    #[test]
    fn test_prune_keep_zero_deletes_everything() {
        let store = FakeStore::new(hourly_backups("default", 3));
        let outcome = manager(&store).prune("default", 0).unwrap();
        assert_eq!(outcome.deleted.len(), 3);
        assert_eq!(outcome.kept, 0);
    }

    #[test]
    fn test_prune_keep_larger_than_count_is_noop() {
        let store = FakeStore::new(hourly_backups("default", 3));
        let outcome = manager(&store).prune("default", 10).unwrap();
        assert!(outcome.deleted.is_empty());
        assert_eq!(outcome.kept, 3);
    }

    #[test]
    fn test_prune_continues_past_single_delete_failure() {
        let mut store = FakeStore::new(hourly_backups("default", 5));
        store
            .fail_deletes
            .insert("db/default-2024-06-01-000000.dump".into());

        let outcome = manager(&store).prune("default", 2).unwrap();
        // Three candidates; one delete fails, the other two proceed
        assert_eq!(outcome.deleted.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            outcome.failures[0],
            BackupError::RetentionDelete { .. }
        ));
    }

    #[test]
    fn test_prune_does_not_touch_other_aliases() {
        let mut entries = hourly_backups("default", 4);
        entries.extend(hourly_backups("reporting", 4));
        let store = FakeStore::new(entries);
        let mgr = manager(&store);

        mgr.prune("default", 1).unwrap();
        let reporting = mgr.list_backups("reporting").unwrap();
        assert_eq!(reporting.len(), 4);
    }
}
