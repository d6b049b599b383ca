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

//! Deferred compression of rotated backups.
//!
//! Rotation hands the backup path to [`Archiver::archive`], which parks it
//! in a delay queue for a short grace period (trailing readers of the
//! just-renamed file get to finish), then a worker thread gzip-compresses it
//! next to the original and deletes the source. Shutdown is cooperative: the
//! worker drains the queue to empty before exiting, so every accepted path
//! is archived.

use std::{
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use flate2::{Compression, write::GzEncoder};
use sawmill_delayq::DelayQueue;
use sawmill_diag::ErrorSink;
use snafu::{ResultExt, ensure};
use tracing::{debug, info};

use crate::error::{
    AlreadyShutdownSnafu, ArchiveSnafu, CreateDirSnafu, Result, ScheduleSnafu, SpawnWorkerSnafu,
};

/// How many rotated paths may wait for their grace period at once.
const PENDING_CAPACITY: usize = 1000;

/// Worker poll interval; bounds how long shutdown waits on an idle queue.
const DRAIN_POLL: Duration = Duration::from_millis(200);

struct ArchiverShared {
    backup_dir:  PathBuf,
    archive_ext: String,
    delay:       Duration,
    pending:     DelayQueue<PathBuf>,
    down:        AtomicBool,
    diag:        ErrorSink,
}

/// Compresses rotated backups after a grace period.
pub struct Archiver {
    shared: Arc<ArchiverShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Archiver {
    /// Create an archiver writing compressed backups into `backup_dir`.
    ///
    /// # Errors
    ///
    /// Fails if the internal delay queue cannot start its timer thread.
    pub fn new<P: Into<PathBuf>>(
        backup_dir: P,
        archive_ext: String,
        delay: Duration,
    ) -> Result<Self> {
        let pending = DelayQueue::new(PENDING_CAPACITY).context(ScheduleSnafu)?;
        Ok(Self {
            shared: Arc::new(ArchiverShared {
                backup_dir: backup_dir.into(),
                archive_ext,
                delay,
                pending,
                down: AtomicBool::new(false),
                diag: ErrorSink::default(),
            }),
            worker: Mutex::new(None),
        })
    }

    /// Create the backup directory and start the compression worker.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be created or the worker thread
    /// cannot be spawned.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.shared.backup_dir).context(CreateDirSnafu {
            path: self.shared.backup_dir.clone(),
        })?;

        let mut worker = self.worker.lock().unwrap();
        if worker.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("rollover-archiver".into())
            .spawn(move || drain_loop(&shared))
            .context(SpawnWorkerSnafu { name: "archiver" })?;
        *worker = Some(handle);
        Ok(())
    }

    /// Schedule `source` for compression after the grace period.
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyShutdown` after [`shutdown`](Self::shutdown), or
    /// with a scheduling error when the pending queue is full.
    pub fn archive(&self, source: &Path) -> Result<()> {
        ensure!(!self.shared.down.load(Ordering::SeqCst), AlreadyShutdownSnafu);

        self.shared
            .pending
            .offer_after(source.to_path_buf(), self.shared.delay)
            .context(ScheduleSnafu)?;
        debug!(source = %source.display(), "scheduled for archival");
        Ok(())
    }

    /// Stop accepting work, archive everything already accepted, and join
    /// the worker.
    pub fn shutdown(&self) {
        self.shared.down.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Number of paths still waiting out their grace period.
    pub fn pending(&self) -> usize { self.shared.pending.len() }
}

/// Worker loop: archive expired paths until shut down and drained.
fn drain_loop(shared: &ArchiverShared) {
    loop {
        if let Some(source) = shared.pending.take(DRAIN_POLL) {
            if let Err(e) = shared.compress_and_remove(&source) {
                shared.diag.report("archive failed", &e);
            }
        }
        if shared.down.load(Ordering::SeqCst) && shared.pending.is_empty() {
            break;
        }
    }

    // The heap may drain into the result channel right as the loop ends;
    // sweep once more so nothing accepted is left behind.
    while let Some(source) = shared.pending.take(Duration::from_millis(20)) {
        if let Err(e) = shared.compress_and_remove(&source) {
            shared.diag.report("archive failed", &e);
        }
    }

    info!("archiver drained");
}

impl ArchiverShared {
    /// Compress `source` into the backup directory, then delete it.
    fn compress_and_remove(&self, source: &Path) -> Result<()> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = self
            .backup_dir
            .join(format!("{file_name}{}", self.archive_ext));

        self.compress(source, &target)?;

        fs::remove_file(source).context(ArchiveSnafu {
            path: source.to_path_buf(),
        })?;

        debug!(
            source = %source.display(),
            target = %target.display(),
            "archived backup"
        );
        Ok(())
    }

    fn compress(&self, source: &Path, target: &Path) -> Result<()> {
        let input = File::open(source).context(ArchiveSnafu {
            path: source.to_path_buf(),
        })?;
        let output = File::create(target).context(ArchiveSnafu {
            path: target.to_path_buf(),
        })?;

        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut BufReader::new(input), &mut encoder).context(ArchiveSnafu {
            path: source.to_path_buf(),
        })?;
        encoder.finish().context(ArchiveSnafu {
            path: target.to_path_buf(),
        })?;
        Ok(())
    }
}
