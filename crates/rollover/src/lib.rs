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

//! Log file lifecycle engine.
//!
//! Turns a stream of records into durable, bounded, rotated files with
//! deferred compression and retention enforcement, under concurrent
//! producers:
//!
//! ```text
//! producer ─► FileSink (batcher) ─► RotatingFile ─► rotation
//!                                                     │
//!                                      Archiver ◄─────┘ (delay queue)
//!                                        │
//!                                     Cleaner (periodic sweep)
//! ```
//!
//! Each sink owns its background threads: the batcher (async mode), the
//! archiver's drain loop and the cleaner's ticker. Errors inside those loops
//! are reported through a rate-limited diagnostic sink and never stop the
//! loop; errors on the inline write path go to the caller.

pub mod archiver;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod path;
pub mod rotate;
pub mod sink;

pub use archiver::Archiver;
pub use cleaner::{BackupFile, Cleaner};
pub use config::{RolloverBuilder, RolloverConfig};
pub use error::{Error, Result};
pub use rotate::RotatingFile;
pub use sink::{FileSink, RecordEncoder};
