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

//! The file sink: records in, rotated-archived-retained files out.
//!
//! ```text
//! ┌──────────┐  bounded channel  ┌───────────┐  blocks   ┌──────────────┐
//! │ producer │ ────────────────► │  batcher  │ ────────► │ RotatingFile │
//! │ (caller) │   full? inline ─┐ │ (thread)  │           └──────┬───────┘
//! └──────────┘                 │ └───────────┘    on rotation   │
//!                              └──────────────►┐               ▼
//!                                              │   ┌──────────────────────┐
//!                                              └─► │ Archiver → Cleaner   │
//!                                                  │ (detached, off-path) │
//!                                                  └──────────────────────┘
//! ```
//!
//! In sync mode every record is encoded and appended inline and errors go to
//! the caller. In async mode records take a non-blocking hop onto a bounded
//! channel; the batcher thread drains it into a pending slice and flushes on
//! a ticker, on an overflow signal, or on shutdown. A record that finds the
//! channel full is written inline (nothing is dropped) and nudges the
//! batcher to flush (at-least-one-flush-soon, not one per overflow).
//!
//! Ordering: within the batcher, flush order is append order. Between an
//! inline-fallback record and records already queued there is no ordering
//! guarantee; both reach the file.

use std::{
    mem,
    path::PathBuf,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use crossbeam::{
    channel::{self, Receiver, Sender, TrySendError},
    select,
};
use sawmill_bufpool::Buffer;
use sawmill_diag::ErrorSink;
use snafu::{ResultExt, ensure};
use tracing::info;

use crate::{
    Archiver, Cleaner, RolloverConfig, RotatingFile,
    error::{AlreadyShutdownSnafu, Result, SpawnWorkerSnafu},
};

/// Encodes one record into a write buffer. The seam between the engine and
/// whatever formatting layer sits above it.
pub trait RecordEncoder<R>: Send + Sync + 'static {
    fn encode(&self, record: &R, buf: &mut Buffer);
}

impl<R, F> RecordEncoder<R> for F
where
    F: Fn(&R, &mut Buffer) + Send + Sync + 'static,
{
    fn encode(&self, record: &R, buf: &mut Buffer) { self(record, buf); }
}

struct SinkShared<R> {
    config:   RolloverConfig,
    encoder:  Box<dyn RecordEncoder<R>>,
    file:     RotatingFile,
    /// Records accumulated by the batcher between flushes. Its own lock
    /// domain: appending here never waits on file I/O.
    pending:  Mutex<Vec<R>>,
    flush_tx: Sender<()>,
    flush_rx: Receiver<()>,
    archiver: Archiver,
    cleaner:  Cleaner,
    down:     AtomicBool,
    diag:     ErrorSink,
}

/// A log sink writing to a size/time rotated file with deferred archival
/// and retention.
pub struct FileSink<R> {
    shared:    Arc<SinkShared<R>>,
    record_tx: RwLock<Option<Sender<R>>>,
    record_rx: Mutex<Option<Receiver<R>>>,
    batcher:   Mutex<Option<JoinHandle<()>>>,
}

impl<R: Send + 'static> FileSink<R> {
    /// Assemble a sink from resolved configuration and an encoder.
    ///
    /// Nothing runs until [`init`](Self::init).
    ///
    /// # Errors
    ///
    /// Fails when the archiver's delay queue cannot start.
    pub fn new<E: RecordEncoder<R>>(config: RolloverConfig, encoder: E) -> Result<Self> {
        let file = RotatingFile::new(&config);
        let archiver = Archiver::new(
            file.dir(),
            config.archive_ext.clone(),
            config.archive_delay,
        )?;
        let cleaner = Cleaner::new(
            file.dir(),
            file.base_name().to_string(),
            config.archive_ext.clone(),
            config.max_age,
            config.max_count,
            config.check_interval,
        );

        let (record_tx, record_rx) = channel::bounded(config.queue_size);
        let (flush_tx, flush_rx) = channel::bounded(1);

        Ok(Self {
            shared: Arc::new(SinkShared {
                config,
                encoder: Box::new(encoder),
                file,
                pending: Mutex::new(Vec::new()),
                flush_tx,
                flush_rx,
                archiver,
                cleaner,
                down: AtomicBool::new(false),
                diag: ErrorSink::default(),
            }),
            record_tx: RwLock::new(Some(record_tx)),
            record_rx: Mutex::new(Some(record_rx)),
            batcher: Mutex::new(None),
        })
    }

    /// Start the archiver, the cleaner, and (in async mode) the batcher.
    ///
    /// # Errors
    ///
    /// Fails when a worker thread cannot be spawned or the backup directory
    /// cannot be created.
    pub fn init(&self) -> Result<()> {
        ensure!(
            !self.shared.down.load(Ordering::SeqCst),
            AlreadyShutdownSnafu
        );

        self.shared.archiver.init()?;
        self.shared.cleaner.init()?;

        if !self.shared.config.async_write {
            return Ok(());
        }

        let mut batcher = self.batcher.lock().unwrap();
        if batcher.is_some() {
            return Ok(());
        }
        let Some(record_rx) = self.record_rx.lock().unwrap().take() else {
            return Ok(());
        };

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("rollover-batcher".into())
            .spawn(move || batch_loop(&shared, &record_rx))
            .context(SpawnWorkerSnafu { name: "batcher" })?;
        *batcher = Some(handle);
        Ok(())
    }

    /// Accept one record.
    ///
    /// Sync mode writes it inline. Async mode enqueues it without blocking;
    /// when the queue is full the record is written inline instead and the
    /// batcher is signalled to flush.
    ///
    /// # Errors
    ///
    /// Inline writes surface open/rotate/write failures to the caller;
    /// `AlreadyShutdown` after [`shutdown`](Self::shutdown).
    pub fn handle(&self, record: R) -> Result<()> {
        ensure!(
            !self.shared.down.load(Ordering::SeqCst),
            AlreadyShutdownSnafu
        );

        if !self.shared.config.async_write {
            return self.shared.write_record(&record);
        }

        let guard = self.record_tx.read().unwrap();
        let Some(tx) = guard.as_ref() else {
            return AlreadyShutdownSnafu.fail();
        };
        match tx.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(record)) => {
                // Nothing is dropped: write this one inline and nudge the
                // batcher. A signal already pending is good enough.
                let result = self.shared.write_record(&record);
                let _ = self.shared.flush_tx.try_send(());
                result
            }
            Err(TrySendError::Disconnected(_)) => AlreadyShutdownSnafu.fail(),
        }
    }

    /// Flush everything accepted, stop all workers, release the file.
    ///
    /// Idempotent; `handle` fails afterwards.
    pub fn shutdown(&self) {
        if self.shared.down.swap(true, Ordering::SeqCst) {
            return;
        }

        // Disconnect the channel: the batcher drains what is buffered,
        // flushes, and exits.
        self.record_tx.write().unwrap().take();
        if let Some(handle) = self.batcher.lock().unwrap().take() {
            let _ = handle.join();
        }

        self.shared.archiver.shutdown();
        self.shared.cleaner.shutdown();
        self.shared.file.close();
        info!(path = %self.shared.file.path().display(), "file sink shut down");
    }

    /// The rotating file behind this sink.
    #[must_use]
    pub fn file(&self) -> &RotatingFile { &self.shared.file }

    /// Sweep retention now, off the ticker.
    ///
    /// # Errors
    ///
    /// See [`Cleaner::clean`].
    pub fn clean(&self) -> Result<()> { self.shared.cleaner.clean() }
}

impl<R> Drop for FileSink<R> {
    fn drop(&mut self) {
        // Best effort: threads exit on their own once the channels
        // disconnect, but a clean shutdown flushes pending records.
        self.shared.down.store(true, Ordering::SeqCst);
        self.record_tx.write().unwrap().take();
    }
}

/// Batcher loop: accumulate records, flush on tick, overflow signal, or
/// disconnect.
fn batch_loop<R: Send + 'static>(shared: &Arc<SinkShared<R>>, record_rx: &Receiver<R>) {
    let ticker = channel::tick(shared.config.flush_interval);
    loop {
        select! {
            recv(record_rx) -> msg => match msg {
                Ok(record) => shared.append_pending(record),
                Err(_) => {
                    // Producer side gone: flush what we have and exit.
                    shared.flush_pending();
                    return;
                }
            },
            recv(ticker) -> _ => shared.flush_pending(),
            recv(shared.flush_rx) -> _ => shared.flush_pending(),
        }
    }
}

impl<R: Send + 'static> SinkShared<R> {
    fn append_pending(&self, record: R) {
        self.pending.lock().unwrap().push(record);
    }

    /// Take ownership of the pending slice, then encode and write it in
    /// bounded blocks. Errors are reported, never returned: the batcher
    /// loop must keep running.
    fn flush_pending(self: &Arc<Self>) {
        let records = mem::take(&mut *self.pending.lock().unwrap());
        if records.is_empty() {
            return;
        }

        for block in records.chunks(self.config.flush_block_size.max(1)) {
            let mut buf = sawmill_bufpool::borrow();
            for record in block {
                self.encoder.encode(record, &mut buf);
            }
            if let Err(e) = self.write_bytes(buf.as_bytes()) {
                self.diag.report("batch flush failed", &e);
            }
        }
    }

    fn write_record(self: &Arc<Self>, record: &R) -> Result<()> {
        let mut buf = sawmill_bufpool::borrow();
        self.encoder.encode(record, &mut buf);
        self.write_bytes(buf.as_bytes())
    }

    fn write_bytes(self: &Arc<Self>, bytes: &[u8]) -> Result<()> {
        if let Some(backup) = self.file.append(bytes)? {
            self.post_rotate(backup);
        }
        Ok(())
    }

    /// Hand the backup to the archiver and trigger a retention sweep,
    /// off the write path.
    fn post_rotate(self: &Arc<Self>, backup: PathBuf) {
        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("rollover-post-rotate".into())
            .spawn(move || shared.archive_and_sweep(&backup));

        if let Err(e) = spawned {
            // Archival skips this cycle; the next rotation retries and the
            // cleaner ticker keeps sweeping regardless.
            self.diag.report("post-rotation thread failed", &e);
        }
    }

    fn archive_and_sweep(&self, backup: &std::path::Path) {
        if let Err(e) = self.archiver.archive(backup) {
            self.diag.report("post-rotation archive failed", &e);
        }
        if let Err(e) = self.cleaner.clean() {
            self.diag.report("post-rotation sweep failed", &e);
        }
    }
}
