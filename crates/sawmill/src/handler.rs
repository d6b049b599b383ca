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

//! Log record handlers.
//!
//! A [`Handler`] owns one transport. Shared behavior (level and marker
//! filtering, formatting) lives in [`FilterSpec`] and [`Formatter`] and is
//! composed explicitly by each handler rather than inherited.

use std::{
    io::{self, Write},
    sync::Arc,
};

use snafu::ResultExt;

use crate::{
    Format, Formatter, Level, Record,
    config::FileOptions,
    error::{ConsoleWriteSnafu, Result},
};
use sawmill_rollover::FileSink;

/// One destination for records.
pub trait Handler: Send + Sync {
    /// Start background work, open resources.
    fn init(&self) -> Result<()>;
    /// Accept one record. Filtering happens inside.
    fn handle(&self, record: &Record) -> Result<()>;
    /// Flush and release; the handler rejects records afterwards.
    fn shutdown(&self);
}

/// Which records a handler accepts.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Lowest accepted severity.
    pub min_level: Level,
    /// Explicit allowlist; overrides `min_level` when set.
    pub levels:    Option<Vec<Level>>,
    /// Only records carrying this marker; `None` accepts every marker.
    pub marker:    Option<String>,
}

impl FilterSpec {
    /// Accept everything at or above `min_level`.
    #[must_use]
    pub fn at_least(min_level: Level) -> Self {
        Self {
            min_level,
            ..Default::default()
        }
    }

    /// Whether `record` passes the level and marker checks.
    #[must_use]
    pub fn accepts(&self, record: &Record) -> bool {
        let level_ok = match &self.levels {
            Some(levels) => levels.contains(&record.level),
            None => record.level >= self.min_level,
        };
        let marker_ok = match &self.marker {
            Some(marker) => record.marker.as_deref() == Some(marker.as_str()),
            None => true,
        };
        level_ok && marker_ok
    }
}

/// Writes accepted records to stdout.
pub struct ConsoleHandler {
    filter:    FilterSpec,
    formatter: Box<dyn Formatter>,
}

impl ConsoleHandler {
    #[must_use]
    pub fn new(filter: FilterSpec, format: Format) -> Self {
        Self {
            filter,
            formatter: format.formatter(),
        }
    }
}

impl Handler for ConsoleHandler {
    fn init(&self) -> Result<()> { Ok(()) }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.filter.accepts(record) {
            return Ok(());
        }

        let mut buf = sawmill_bufpool::borrow();
        self.formatter.format(record, &mut buf);

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(buf.as_bytes()).context(ConsoleWriteSnafu)?;
        Ok(())
    }

    fn shutdown(&self) {
        let _ = io::stdout().flush();
    }
}

/// Writes accepted records to a rotating file with archival and retention.
pub struct FileHandler {
    filter: FilterSpec,
    sink:   FileSink<Record>,
}

impl FileHandler {
    /// Build a file handler from human-readable options.
    ///
    /// # Errors
    ///
    /// Fails when an option does not parse or the sink cannot be assembled.
    pub fn new(filter: FilterSpec, format: Format, options: &FileOptions) -> Result<Self> {
        let config = options.resolve()?;
        let formatter: Arc<dyn Formatter> = Arc::from(format.formatter());
        let sink = FileSink::new(
            config,
            move |record: &Record, buf: &mut sawmill_bufpool::Buffer| {
                formatter.format(record, buf);
            },
        )?;
        Ok(Self { filter, sink })
    }
}

impl Handler for FileHandler {
    fn init(&self) -> Result<()> {
        self.sink.init()?;
        Ok(())
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if !self.filter.accepts(record) {
            return Ok(());
        }
        self.sink.handle(record.clone())?;
        Ok(())
    }

    fn shutdown(&self) { self.sink.shutdown(); }
}
