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

//! Text renderings of a [`Record`].
//!
//! Formatters write into a pooled [`Buffer`]; output is identical whether
//! the buffer came from a pool or not.

use serde::{Deserialize, Serialize};

use crate::Record;
use sawmill_bufpool::Buffer;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Renders one record into a buffer, newline included.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record, buf: &mut Buffer);
}

/// Which rendering a handler uses.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Format {
    Simple,
    #[default]
    Full,
    Json,
}

impl Format {
    /// The formatter implementing this rendering.
    #[must_use]
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            Self::Simple => Box::new(SimpleFormatter),
            Self::Full => Box::new(FullFormatter),
            Self::Json => Box::new(JsonFormatter),
        }
    }
}

/// `time|LEVEL|msg`
pub struct SimpleFormatter;

impl Formatter for SimpleFormatter {
    fn format(&self, record: &Record, buf: &mut Buffer) {
        use std::fmt::Write;
        let _ = write!(buf, "{}", record.time.format(TIME_FORMAT));
        buf.append_byte(b'|');
        buf.append_str(&record.level.to_string());
        buf.append_byte(b'|');
        buf.append_str(&record.msg);
        buf.append_newline();
    }
}

/// `time|LEVEL|marker|msg|err=...|k=v,...`
pub struct FullFormatter;

impl Formatter for FullFormatter {
    fn format(&self, record: &Record, buf: &mut Buffer) {
        use std::fmt::Write;
        let _ = write!(buf, "{}", record.time.format(TIME_FORMAT));
        buf.append_byte(b'|');
        buf.append_str(&record.level.to_string());
        buf.append_byte(b'|');
        buf.append_str(record.marker.as_deref().unwrap_or(""));
        buf.append_byte(b'|');
        buf.append_str(&record.msg);

        if let Some(err) = &record.err {
            buf.append_str("|err=");
            buf.append_str(err);
        }
        if !record.fields.is_empty() {
            buf.append_byte(b'|');
            for (i, (key, value)) in record.fields.iter().enumerate() {
                if i > 0 {
                    buf.append_byte(b',');
                }
                buf.append_str(key);
                buf.append_byte(b'=');
                append_value(buf, value);
            }
        }
        buf.append_newline();
    }
}

/// One JSON object per line.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record, buf: &mut Buffer) {
        // Serialization of a Record cannot fail; the writer is infallible.
        let _ = serde_json::to_writer(&mut *buf, record);
        buf.append_newline();
    }
}

/// Strings render bare; everything else as its JSON text.
fn append_value(buf: &mut Buffer, value: &serde_json::Value) {
    match value {
        serde_json::Value::String(s) => buf.append_str(s),
        other => buf.append_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::Level;

    fn record() -> Record {
        let mut record = Record::new(Level::Warn, "disk almost full");
        record.marker = Some("ops".into());
        record.err = Some("ENOSPC".into());
        record.fields.push(("disk".into(), "sda1".into()));
        record.fields.push(("pct".into(), 97.into()));
        record
    }

    fn rendered(formatter: &dyn Formatter, record: &Record) -> String {
        let mut buf = Buffer::detached();
        formatter.format(record, &mut buf);
        String::from_utf8(buf.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_simple_format() {
        let out = rendered(&SimpleFormatter, &record());
        let parts: Vec<&str> = out.trim_end().splitn(3, '|').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "WARN");
        assert_eq!(parts[2], "disk almost full");
    }

    #[test]
    fn test_full_format() {
        let out = rendered(&FullFormatter, &record());
        assert!(out.ends_with("|WARN|ops|disk almost full|err=ENOSPC|disk=sda1,pct=97\n"));
    }

    #[test]
    fn test_json_format_is_one_object_per_line() {
        let out = rendered(&JsonFormatter, &record());
        assert!(out.ends_with('\n'));
        let json: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(json["level"], "WARN");
        assert_eq!(json["fields"]["pct"], 97);
    }

    #[test]
    fn test_pooled_and_detached_buffers_render_identically() {
        let record = record();
        let formatter = FullFormatter;

        let mut pooled = sawmill_bufpool::borrow();
        formatter.format(&record, &mut pooled);

        let mut detached = Buffer::detached();
        formatter.format(&record, &mut detached);

        assert_eq!(pooled.as_bytes(), detached.as_bytes());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(Format::from_str("json").unwrap(), Format::Json);
        assert_eq!(Format::from_str("SIMPLE").unwrap(), Format::Simple);
        assert_eq!(Format::default(), Format::Full);
    }
}
