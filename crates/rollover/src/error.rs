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

use std::{io, path::PathBuf};

use snafu::Snafu;

/// Lifecycle engine errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to create directory {}", path.display()))]
    CreateDir { path: PathBuf, source: io::Error },

    #[snafu(display("failed to open log file {}", path.display()))]
    OpenFile { path: PathBuf, source: io::Error },

    #[snafu(display("failed to stat log file {}", path.display()))]
    StatFile { path: PathBuf, source: io::Error },

    #[snafu(display("failed to write log file {}", path.display()))]
    WriteFile { path: PathBuf, source: io::Error },

    #[snafu(display("failed to rename {} to {}", from.display(), to.display()))]
    Rename {
        from:   PathBuf,
        to:     PathBuf,
        source: io::Error,
    },

    #[snafu(display("failed to archive {}", path.display()))]
    Archive { path: PathBuf, source: io::Error },

    #[snafu(display("failed to delete backup {}", path.display()))]
    CleanupDelete { path: PathBuf, source: io::Error },

    /// Operation attempted after `shutdown`.
    #[snafu(display("already shut down"))]
    AlreadyShutdown,

    /// A write raced the active file away; retried by the caller.
    #[snafu(display("no active log file"))]
    NoActiveFile,

    #[snafu(display("failed to schedule archive job"))]
    Schedule { source: sawmill_delayq::Error },

    #[snafu(display("failed to spawn the {name} thread"))]
    SpawnWorker {
        name:   &'static str,
        source: io::Error,
    },
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
