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

//! Size/time based rotation of one append-only log file.
//!
//! ## Locking
//!
//! Two lock levels guard the active file:
//!
//! - the rotation `RwLock`: opening and rotating (close, rename, reopen)
//!   take the write side; ordinary appends take the read side, so writers
//!   never wait on each other for the handle,
//! - a narrow write mutex around the write call itself, so the file has a
//!   single writer at any instant and interleaved partial writes cannot
//!   happen regardless of platform write atomicity.
//!
//! The rotation predicate reads only atomics (`written`, `rotate_at`), so
//! checking it takes no lock at all. Predicate checks are double-checked
//! after acquiring the write lock, since another writer may have rotated
//! first.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Mutex, RwLock, RwLockWriteGuard,
        atomic::{AtomicI64, AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info};

use crate::{
    RolloverConfig,
    error::{
        CreateDirSnafu, NoActiveFileSnafu, OpenFileSnafu, RenameSnafu, Result, StatFileSnafu,
        WriteFileSnafu,
    },
    path::{backup_file_name, split_base_ext},
};

struct ActiveFile {
    file: Option<File>,
}

/// An append-only file that renames itself away once it grows too large or
/// too old.
pub struct RotatingFile {
    path:            PathBuf,
    dir:             PathBuf,
    base_name:       String,
    ext:             String,
    rotate_size:     u64,
    rotate_interval: Duration,
    state:           RwLock<ActiveFile>,
    /// Serializes the write syscall; see the module docs.
    write_mu:        Mutex<()>,
    /// Bytes appended to the active file, updated lock-free.
    written:         AtomicU64,
    /// Deadline for time-based rotation, ns timestamp. `i64::MAX` while no
    /// file is open.
    rotate_at:       AtomicI64,
}

impl RotatingFile {
    /// Describe the rotating file; the file itself is opened lazily on the
    /// first append.
    #[must_use]
    pub fn new(config: &RolloverConfig) -> Self {
        let dir = config
            .file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let file_name = config
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base_name, ext) = split_base_ext(&file_name);

        Self {
            path: config.file_path.clone(),
            dir,
            base_name: base_name.to_string(),
            ext: ext.to_string(),
            rotate_size: config.rotate_size,
            rotate_interval: config.rotate_interval,
            state: RwLock::new(ActiveFile { file: None }),
            write_mu: Mutex::new(()),
            written: AtomicU64::new(0),
            rotate_at: AtomicI64::new(i64::MAX),
        }
    }

    /// Append `bytes`, rotating first if the predicate holds.
    ///
    /// Returns the backup path when this call performed a rotation.
    ///
    /// # Errors
    ///
    /// Open, rename and write failures are returned with path context. After
    /// a failed rotation the file reopens on the next append and rotation is
    /// retried.
    pub fn append(&self, bytes: &[u8]) -> Result<Option<PathBuf>> {
        if bytes.is_empty() {
            return Ok(None);
        }

        if self.state.read().unwrap().file.is_none() {
            self.open()?;
        }

        let backup = if self.should_rotate() {
            self.rotate()?
        } else {
            None
        };

        {
            let state = self.state.read().unwrap();
            let mut file = state.file.as_ref().context(NoActiveFileSnafu)?;

            let _serialized = self.write_mu.lock().unwrap();
            file.write_all(bytes).context(WriteFileSnafu {
                path: self.path.clone(),
            })?;
        }
        self.written.fetch_add(bytes.len() as u64, Ordering::Relaxed);

        Ok(backup)
    }

    /// Whether the next append must rotate first.
    pub fn should_rotate(&self) -> bool {
        now_nanos() > self.rotate_at.load(Ordering::Relaxed)
            || self.written.load(Ordering::Relaxed) > self.rotate_size
    }

    /// Close, rename to a stamped backup, and reopen a fresh file.
    ///
    /// Returns `None` when a concurrent writer already rotated (the
    /// predicate no longer holds under the write lock) or when no file was
    /// open.
    pub fn rotate(&self) -> Result<Option<PathBuf>> {
        let mut state = self.state.write().unwrap();

        // Double-check: another writer may have rotated while we waited.
        if !self.should_rotate() || state.file.is_none() {
            return Ok(None);
        }

        // Close before the rename; a handle to a renamed file would keep
        // appending to the backup.
        state.file = None;

        let backup = self
            .dir
            .join(backup_file_name(&self.base_name, &self.ext, Utc::now()));
        fs::rename(&self.path, &backup).context(RenameSnafu {
            from: self.path.clone(),
            to:   backup.clone(),
        })?;

        self.open_locked(&mut state)?;

        info!(backup = %backup.display(), "rotated log file");
        Ok(Some(backup))
    }

    /// Open the active file if no writer has yet.
    fn open(&self) -> Result<()> {
        let mut state = self.state.write().unwrap();
        // Double-check under the write lock.
        if state.file.is_some() {
            return Ok(());
        }
        self.open_locked(&mut state)
    }

    fn open_locked(&self, state: &mut RwLockWriteGuard<'_, ActiveFile>) -> Result<()> {
        fs::create_dir_all(&self.dir).context(CreateDirSnafu {
            path: self.dir.clone(),
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context(OpenFileSnafu {
                path: self.path.clone(),
            })?;

        // Picking up an existing file: count what is already there.
        let size = file
            .metadata()
            .context(StatFileSnafu {
                path: self.path.clone(),
            })?
            .len();

        self.written.store(size, Ordering::Relaxed);
        self.rotate_at.store(
            now_nanos().saturating_add(nanos_of(self.rotate_interval)),
            Ordering::Relaxed,
        );
        state.file = Some(file);

        debug!(path = %self.path.display(), size, "opened log file");
        Ok(())
    }

    /// Close the active file; subsequent appends reopen it.
    pub fn close(&self) {
        self.state.write().unwrap().file = None;
        self.rotate_at.store(i64::MAX, Ordering::Relaxed);
    }

    /// Bytes appended to the active file so far.
    pub fn bytes_written(&self) -> u64 { self.written.load(Ordering::Relaxed) }

    /// Path of the active file.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Directory holding the active file and its backups.
    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }

    /// Base name of the active file, without extension.
    #[must_use]
    pub fn base_name(&self) -> &str { &self.base_name }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn nanos_of(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::RolloverBuilder;

    fn rotating(dir: &TempDir, rotate_size: u64) -> RotatingFile {
        let config = RolloverBuilder::new(dir.path().join("app.log"))
            .rotate_size(rotate_size)
            .build();
        RotatingFile::new(&config)
    }

    fn backups(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n != "app.log")
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_append_creates_file_lazily() {
        let dir = TempDir::new().unwrap();
        let file = rotating(&dir, 1024);

        assert!(!file.path().exists());
        file.append(b"hello\n").unwrap();
        assert!(file.path().exists());
        assert_eq!(file.bytes_written(), 6);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"hello\n");
    }

    #[test]
    fn test_append_picks_up_existing_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.log"), b"old-contents\n").unwrap();

        let file = rotating(&dir, 1024);
        file.append(b"new\n").unwrap();

        assert_eq!(file.bytes_written(), 13 + 4);
        assert_eq!(
            std::fs::read(file.path()).unwrap(),
            b"old-contents\nnew\n"
        );
    }

    #[test]
    fn test_exactly_one_rotation_past_size_threshold() {
        let dir = TempDir::new().unwrap();
        let file = rotating(&dir, 100);

        // 101 bytes across several calls: no rotation yet.
        for _ in 0..10 {
            file.append(&[b'x'; 10]).unwrap();
        }
        file.append(b"x").unwrap();
        assert!(backups(&dir).is_empty());
        assert_eq!(file.bytes_written(), 101);

        // The next append rotates exactly once, before writing.
        let backup = file.append(b"after\n").unwrap().expect("should rotate");
        let names = backups(&dir);
        assert_eq!(names.len(), 1);
        assert_eq!(names[0], backup.file_name().unwrap().to_string_lossy());
        assert!(crate::path::extract_backup_stamp(&names[0]).is_some());

        // Backup holds the old bytes; fresh file holds only the new ones.
        assert_eq!(std::fs::read(&backup).unwrap().len(), 101);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"after\n");
        assert_eq!(file.bytes_written(), 6);
    }

    #[test]
    fn test_no_rotation_below_threshold() {
        let dir = TempDir::new().unwrap();
        let file = rotating(&dir, 100);

        // Exactly the threshold does not rotate; the predicate is strict.
        file.append(&[b'x'; 100]).unwrap();
        assert!(file.append(b"").unwrap().is_none());
        assert!(!file.should_rotate());
        assert!(backups(&dir).is_empty());
    }

    #[test]
    fn test_rotation_after_interval() {
        let dir = TempDir::new().unwrap();
        let config = RolloverBuilder::new(dir.path().join("app.log"))
            .rotate_interval(Duration::from_millis(30))
            .build();
        let file = RotatingFile::new(&config);

        file.append(b"first\n").unwrap();
        std::thread::sleep(Duration::from_millis(60));
        assert!(file.should_rotate());

        let backup = file.append(b"second\n").unwrap();
        assert!(backup.is_some());
        assert_eq!(std::fs::read(file.path()).unwrap(), b"second\n");
    }

    #[test]
    fn test_concurrent_appends_all_land() {
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let file = Arc::new(rotating(&dir, u64::MAX));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let file = Arc::clone(&file);
                scope.spawn(move || {
                    for _ in 0..100 {
                        file.append(b"0123456789\n").unwrap();
                    }
                });
            }
        });

        let contents = std::fs::read(file.path()).unwrap();
        assert_eq!(contents.len(), 4 * 100 * 11);
        // Single-writer serialization: every line is intact.
        assert!(
            contents
                .split(|&b| b == b'\n')
                .filter(|l| !l.is_empty())
                .all(|l| l == b"0123456789")
        );
    }

    #[test]
    fn test_close_then_reopen() {
        let dir = TempDir::new().unwrap();
        let file = rotating(&dir, 1024);

        file.append(b"one\n").unwrap();
        file.close();
        file.append(b"two\n").unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), b"one\ntwo\n");
    }
}
