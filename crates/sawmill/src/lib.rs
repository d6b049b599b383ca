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

//! Structured logging with a rotating-file lifecycle engine.
//!
//! Records flow through handlers into rotating files that are compressed
//! after a grace period and trimmed by age and count:
//!
//! ```ignore
//! use sawmill::{FileHandler, FileOptions, FilterSpec, Format, Level, Logger};
//!
//! let file = FileHandler::new(
//!     FilterSpec::at_least(Level::Info),
//!     Format::Json,
//!     &FileOptions {
//!         file: "logs/app.log".into(),
//!         rotate_size: "100M".into(),
//!         max_age: "30d".into(),
//!         max_count: 10,
//!         async_write: true,
//!         ..Default::default()
//!     },
//! )?;
//!
//! let logger = Logger::builder()
//!     .level(Level::Info)
//!     .handler(std::sync::Arc::new(file))
//!     .build()?;
//! sawmill::set_global(logger);
//!
//! sawmill::global()
//!     .with_field("user", "ada")
//!     .info("logged in");
//! ```
//!
//! The lifecycle engine itself lives in `sawmill-rollover`; this crate adds
//! levels, records, formatters, handlers and the fluent front end.

pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod level;
pub mod logger;
pub mod record;

pub use config::{FileOptions, parse_duration, parse_size};
pub use error::{Error, Result};
pub use format::{Format, Formatter, FullFormatter, JsonFormatter, SimpleFormatter};
pub use handler::{ConsoleHandler, FileHandler, FilterSpec, Handler};
pub use level::Level;
pub use logger::{Hook, Logger, LoggerBuilder, Scope, global, set_global};
pub use record::Record;
