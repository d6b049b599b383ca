// Copyright 2026 sawmill developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Retention sweeps over archived backups.
//!
//! A sweep partitions the backup directory into files expired by age and
//! files beyond the count limit, deduplicates the two sets by filename, and
//! deletes the union. Deletion is partial-progress: the first failure aborts
//! the rest of the sweep (already-deleted files stay deleted) and the next
//! tick retries.
//!
//! Filenames that match the base-name prefix and archive-extension suffix
//! but carry no parseable backup stamp are skipped, never errors; foreign
//! files in the directory are none of our business.

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{DateTime, Utc};
use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
};
use sawmill_diag::ErrorSink;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    error::{CleanupDeleteSnafu, Result, SpawnWorkerSnafu},
    path::extract_backup_stamp,
};

/// One backup file, as projected from its name during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub dir:   PathBuf,
    pub name:  String,
    pub stamp: DateTime<Utc>,
}

impl BackupFile {
    fn path(&self) -> PathBuf { self.dir.join(&self.name) }
}

struct CleanerShared {
    backup_dir:  PathBuf,
    base_name:   String,
    archive_ext: String,
    max_age:     Duration,
    max_count:   usize,
    /// One sweep at a time; ticker and on-demand calls may race.
    sweep_mu:    Mutex<()>,
    diag:        ErrorSink,
}

/// Deletes backups that outlived the retention policy.
pub struct Cleaner {
    shared:         Arc<CleanerShared>,
    check_interval: Duration,
    worker:         Mutex<Option<JoinHandle<()>>>,
    stop_tx:        Mutex<Option<Sender<()>>>,
}

impl Cleaner {
    /// Create a cleaner sweeping `backup_dir` for `{base_name}*{archive_ext}`
    /// backups older than `max_age` or beyond `max_count`.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(
        backup_dir: P,
        base_name: String,
        archive_ext: String,
        max_age: Duration,
        max_count: usize,
        check_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(CleanerShared {
                backup_dir: backup_dir.into(),
                base_name,
                archive_ext,
                max_age,
                max_count,
                sweep_mu: Mutex::new(()),
                diag: ErrorSink::default(),
            }),
            check_interval,
            worker: Mutex::new(None),
            stop_tx: Mutex::new(None),
        }
    }

    /// Start the periodic sweep.
    ///
    /// # Errors
    ///
    /// Fails when the ticker thread cannot be spawned.
    pub fn init(&self) -> Result<()> {
        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return Ok(());
        }

        let (stop_tx, stop_rx) = channel::bounded(0);
        let shared = Arc::clone(&self.shared);
        let interval = self.check_interval;
        let handle = thread::Builder::new()
            .name("rollover-cleaner".into())
            .spawn(move || tick_loop(&shared, interval, &stop_rx))
            .context(SpawnWorkerSnafu { name: "cleaner" })?;

        *worker = Some(handle);
        *self.stop_tx.lock().unwrap() = Some(stop_tx);
        Ok(())
    }

    /// Sweep now.
    ///
    /// # Errors
    ///
    /// Fails with `CleanupDelete` when a deletion fails; files deleted
    /// earlier in the same sweep stay deleted.
    pub fn clean(&self) -> Result<()> { self.shared.clean() }

    /// Stop the periodic sweep and join the ticker thread.
    pub fn shutdown(&self) {
        // Dropping the sender disconnects the stop channel and wakes the
        // ticker loop.
        self.stop_tx.lock().unwrap().take();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

fn tick_loop(shared: &CleanerShared, interval: Duration, stop_rx: &Receiver<()>) {
    let ticker = channel::tick(interval);
    loop {
        select! {
            recv(ticker) -> _ => {
                if let Err(e) = shared.clean() {
                    shared.diag.report("retention sweep failed", &e);
                }
            }
            recv(stop_rx) -> _ => return,
        }
    }
}

impl CleanerShared {
    fn clean(&self) -> Result<()> {
        let _sweep = self.sweep_mu.lock().unwrap();

        let removable = self.collect_removable(Utc::now());
        if removable.is_empty() {
            return Ok(());
        }

        debug!(count = removable.len(), "removing backups");
        for file in removable {
            fs::remove_file(file.path()).context(CleanupDeleteSnafu { path: file.path() })?;
        }
        Ok(())
    }

    /// Everything the current sweep should delete: the expired set plus the
    /// oldest files beyond the count limit, deduplicated by filename.
    fn collect_removable(&self, now: DateTime<Utc>) -> Vec<BackupFile> {
        let matched = self.list_backup_files();
        if matched.is_empty() {
            return Vec::new();
        }

        let expired = self.expired_files(&matched, now);
        let remaining = dedup_by_name(matched, &expired);
        let over_limit = self.over_limit_files(remaining);

        let mut removable = expired;
        removable.extend(over_limit);
        removable
    }

    /// Backups in the directory: prefix, suffix and stamp all match.
    fn list_backup_files(&self) -> Vec<BackupFile> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.diag.report("listing backup directory failed", &e);
                return Vec::new();
            }
        };

        let mut matched = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&self.base_name) || !name.ends_with(&self.archive_ext) {
                continue;
            }
            let Some(stamp) = extract_backup_stamp(&name) else {
                continue;
            };
            matched.push(BackupFile {
                dir: self.backup_dir.clone(),
                name,
                stamp,
            });
        }
        matched
    }

    /// Files whose stamp lies more than `max_age` in the past.
    fn expired_files(&self, files: &[BackupFile], now: DateTime<Utc>) -> Vec<BackupFile> {
        files
            .iter()
            .filter(|f| {
                (now - f.stamp).to_std().unwrap_or_default() > self.max_age
            })
            .cloned()
            .collect()
    }

    /// The oldest files past the count limit; empty when within the limit.
    fn over_limit_files(&self, mut files: Vec<BackupFile>) -> Vec<BackupFile> {
        if files.len() <= self.max_count {
            return Vec::new();
        }
        files.sort_by_key(|f| f.stamp);
        files.truncate(files.len() - self.max_count);
        files
    }
}

fn dedup_by_name(full: Vec<BackupFile>, taken: &[BackupFile]) -> Vec<BackupFile> {
    if taken.is_empty() {
        return full;
    }
    full.into_iter()
        .filter(|f| !taken.iter().any(|t| t.name == f.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use tempfile::TempDir;

    use super::*;
    use crate::path::backup_file_name;

    fn cleaner(dir: &TempDir, max_age: Duration, max_count: usize) -> Cleaner {
        Cleaner::new(
            dir.path(),
            "app".to_string(),
            ".gz".to_string(),
            max_age,
            max_count,
            Duration::from_secs(600),
        )
    }

    fn backup_at(dir: &TempDir, age: Duration) -> String {
        let stamp = Utc::now() - chrono::Duration::from_std(age).unwrap();
        let name = format!("{}.gz", backup_file_name("app", ".log", stamp));
        fs::write(dir.path().join(&name), b"backup").unwrap();
        name
    }

    fn names(files: &[BackupFile]) -> HashSet<String> {
        files.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_expired_partition() {
        let dir = TempDir::new().unwrap();
        for age in [0, 2, 10, 11] {
            backup_at(&dir, Duration::from_secs(age));
        }

        let cleaner = cleaner(&dir, Duration::from_secs(5), usize::MAX);
        let matched = cleaner.shared.list_backup_files();
        assert_eq!(matched.len(), 4);

        let expired = cleaner.shared.expired_files(&matched, Utc::now());
        let expired_ages: HashSet<String> = names(&expired);
        assert_eq!(expired.len(), 2);
        for file in &matched {
            let old = (Utc::now() - file.stamp).num_seconds() >= 10;
            assert_eq!(expired_ages.contains(&file.name), old);
        }
    }

    #[test]
    fn test_over_limit_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let mut created = Vec::new();
        for age in [10, 20, 30, 40, 50] {
            created.push(backup_at(&dir, Duration::from_secs(age)));
        }

        let cleaner = cleaner(&dir, Duration::from_secs(3600), 3);
        let matched = cleaner.shared.list_backup_files();
        let over = cleaner.shared.over_limit_files(matched);

        // Exactly the two oldest.
        assert_eq!(
            names(&over),
            HashSet::from([created[3].clone(), created[4].clone()])
        );
    }

    #[test]
    fn test_union_has_no_duplicates() {
        let dir = TempDir::new().unwrap();
        // Old enough to be both expired and beyond the count limit.
        for age in [100, 200, 300, 400] {
            backup_at(&dir, Duration::from_secs(age));
        }

        let cleaner = cleaner(&dir, Duration::from_secs(50), 1);
        let removable = cleaner.shared.collect_removable(Utc::now());

        let unique = names(&removable);
        assert_eq!(unique.len(), removable.len(), "duplicate filenames");
        assert_eq!(unique.len(), 4, "all four are past age or count limits");
    }

    #[test]
    fn test_clean_deletes_only_matching_files() {
        let dir = TempDir::new().unwrap();
        backup_at(&dir, Duration::from_secs(100));

        // Prefix mismatch, suffix mismatch, and no stamp: all untouchable.
        fs::write(dir.path().join("other.2026-01-01.000000.log.gz"), b"x").unwrap();
        fs::write(dir.path().join("app.2026-01-01.000000.log"), b"x").unwrap();
        fs::write(dir.path().join("app.notastamp.log.gz"), b"x").unwrap();

        let cleaner = cleaner(&dir, Duration::from_secs(5), usize::MAX);
        cleaner.clean().unwrap();

        let left: HashSet<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            left,
            HashSet::from([
                "other.2026-01-01.000000.log.gz".to_string(),
                "app.2026-01-01.000000.log".to_string(),
                "app.notastamp.log.gz".to_string(),
            ])
        );
    }

    #[test]
    fn test_within_policy_removes_nothing() {
        let dir = TempDir::new().unwrap();
        for age in [1, 2, 3] {
            backup_at(&dir, Duration::from_secs(age));
        }

        let cleaner = cleaner(&dir, Duration::from_secs(3600), 10);
        cleaner.clean().unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_periodic_sweep() {
        let dir = TempDir::new().unwrap();
        backup_at(&dir, Duration::from_secs(100));

        let cleaner = Cleaner::new(
            dir.path(),
            "app".to_string(),
            ".gz".to_string(),
            Duration::from_secs(5),
            usize::MAX,
            Duration::from_millis(30),
        );
        cleaner.init().unwrap();

        for _ in 0..100 {
            if fs::read_dir(dir.path()).unwrap().count() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        cleaner.shutdown();
    }
}
