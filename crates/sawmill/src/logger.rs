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

//! The fluent logging front end.
//!
//! A [`Logger`] fans records out to its handlers. Construction is explicit
//! through [`LoggerBuilder`]; a process-wide slot holds the active instance
//! for call sites that want a default ([`global`]/[`set_global`]), replaced
//! at startup and read thereafter.
//!
//! User hooks run before and after dispatch. A hook that panics is reported
//! and isolated; it never unwinds into the logging call site.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, RwLock},
};

use once_cell::sync::Lazy;
use sawmill_diag::ErrorSink;

use crate::{
    ConsoleHandler, FilterSpec, Format, Level, Record,
    error::Result,
    handler::Handler,
};

/// Callback observing every record around dispatch.
pub type Hook = Arc<dyn Fn(&Record) + Send + Sync>;

static GLOBAL: Lazy<RwLock<Arc<Logger>>> =
    Lazy::new(|| RwLock::new(Arc::new(Logger::default_console())));

/// Install `logger` as the process-wide default.
pub fn set_global(logger: Logger) {
    *GLOBAL.write().unwrap() = Arc::new(logger);
}

/// The process-wide default logger.
#[must_use]
pub fn global() -> Arc<Logger> { GLOBAL.read().unwrap().clone() }

/// Fans structured records out to a set of handlers.
pub struct Logger {
    level:      Level,
    handlers:   Vec<Arc<dyn Handler>>,
    pre_hooks:  Vec<Hook>,
    post_hooks: Vec<Hook>,
    diag:       ErrorSink,
}

impl Logger {
    /// Start building a logger.
    #[must_use]
    pub fn builder() -> LoggerBuilder { LoggerBuilder::new() }

    /// A logger writing everything to stdout; the out-of-the-box default.
    #[must_use]
    pub fn default_console() -> Self {
        Self {
            level:      Level::Debug,
            handlers:   vec![Arc::new(ConsoleHandler::new(
                FilterSpec::default(),
                Format::Full,
            ))],
            pre_hooks:  Vec::new(),
            post_hooks: Vec::new(),
            diag:       ErrorSink::default(),
        }
    }

    /// Whether records at `level` would be dispatched at all.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool { level >= self.level }

    pub fn debug(&self, msg: &str) { self.log(Level::Debug, msg); }

    pub fn info(&self, msg: &str) { self.log(Level::Info, msg); }

    pub fn data(&self, msg: &str) { self.log(Level::Data, msg); }

    pub fn warn(&self, msg: &str) { self.log(Level::Warn, msg); }

    pub fn error(&self, msg: &str) { self.log(Level::Error, msg); }

    pub fn fatal(&self, msg: &str) { self.log(Level::Fatal, msg); }

    /// Attach one field, returning a scope for chaining.
    pub fn with_field<K, V>(&self, key: K, value: V) -> Scope<'_>
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.scope().with_field(key, value)
    }

    /// Attach many fields at once.
    pub fn with_fields<I, K, V>(&self, fields: I) -> Scope<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.scope().with_fields(fields)
    }

    /// Attach an error, rendered through `Display`.
    pub fn with_error<E: std::fmt::Display>(&self, err: E) -> Scope<'_> {
        self.scope().with_error(err)
    }

    /// Attach a routing marker.
    pub fn with_marker<S: Into<String>>(&self, marker: S) -> Scope<'_> {
        self.scope().with_marker(marker)
    }

    /// Shut down every handler.
    pub fn shutdown(&self) {
        for handler in &self.handlers {
            handler.shutdown();
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            logger: self,
            fields: Vec::new(),
            err:    None,
            marker: None,
        }
    }

    fn log(&self, level: Level, msg: &str) {
        if !self.enabled(level) {
            return;
        }
        self.dispatch(Record::new(level, msg));
    }

    fn dispatch(&self, record: Record) {
        self.run_hooks(&self.pre_hooks, &record, "pre-log hook panicked");

        for handler in &self.handlers {
            if let Err(e) = handler.handle(&record) {
                self.diag.report("handler failed", &e);
            }
        }

        self.run_hooks(&self.post_hooks, &record, "post-log hook panicked");
    }

    /// A hook's failure is isolated and reported, never propagated.
    fn run_hooks(&self, hooks: &[Hook], record: &Record, context: &str) {
        for hook in hooks {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(record))).is_err() {
                self.diag.report_msg(context, &record.msg);
            }
        }
    }
}

/// A pending record being enriched before dispatch.
pub struct Scope<'a> {
    logger: &'a Logger,
    fields: Vec<(String, serde_json::Value)>,
    err:    Option<String>,
    marker: Option<String>,
}

impl Scope<'_> {
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.fields.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub fn with_error<E: std::fmt::Display>(mut self, err: E) -> Self {
        self.err = Some(err.to_string());
        self
    }

    #[must_use]
    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn debug(self, msg: &str) { self.log(Level::Debug, msg); }

    pub fn info(self, msg: &str) { self.log(Level::Info, msg); }

    pub fn data(self, msg: &str) { self.log(Level::Data, msg); }

    pub fn warn(self, msg: &str) { self.log(Level::Warn, msg); }

    pub fn error(self, msg: &str) { self.log(Level::Error, msg); }

    pub fn fatal(self, msg: &str) { self.log(Level::Fatal, msg); }

    fn log(self, level: Level, msg: &str) {
        if !self.logger.enabled(level) {
            return;
        }
        let mut record = Record::new(level, msg);
        record.fields = self.fields;
        record.err = self.err;
        record.marker = self.marker;
        self.logger.dispatch(record);
    }
}

/// Builds a [`Logger`] from named, validated options.
pub struct LoggerBuilder {
    level:      Level,
    handlers:   Vec<Arc<dyn Handler>>,
    pre_hooks:  Vec<Hook>,
    post_hooks: Vec<Hook>,
}

impl Default for LoggerBuilder {
    fn default() -> Self { Self::new() }
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            level:      Level::Debug,
            handlers:   Vec::new(),
            pre_hooks:  Vec::new(),
            post_hooks: Vec::new(),
        }
    }

    /// Drop records below `level` before they reach any handler.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Add a destination.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Observe records before dispatch.
    #[must_use]
    pub fn pre_hook<F: Fn(&Record) + Send + Sync + 'static>(mut self, hook: F) -> Self {
        self.pre_hooks.push(Arc::new(hook));
        self
    }

    /// Observe records after dispatch.
    #[must_use]
    pub fn post_hook<F: Fn(&Record) + Send + Sync + 'static>(mut self, hook: F) -> Self {
        self.post_hooks.push(Arc::new(hook));
        self
    }

    /// Initialize every handler and produce the logger.
    ///
    /// # Errors
    ///
    /// Fails when a handler's `init` fails.
    pub fn build(self) -> Result<Logger> {
        for handler in &self.handlers {
            handler.init()?;
        }
        Ok(Logger {
            level:      self.level,
            handlers:   self.handlers,
            pre_hooks:  self.pre_hooks,
            post_hooks: self.post_hooks,
            diag:       ErrorSink::default(),
        })
    }
}
