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

//! Human-readable option parsing.
//!
//! Size and duration options arrive as strings ("10G", "1d") and resolve
//! into the engine's [`RolloverConfig`]. Loading these structs from a config
//! file is the caller's concern; they only carry serde derives.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::error::{ConfigParseSnafu, Result};
use sawmill_rollover::RolloverConfig;

/// Parse a byte size like `1024`, `64K`, `500M`, `10G` or `2T`.
///
/// # Errors
///
/// Fails with `ConfigParse` on an empty string, unknown unit or non-numeric
/// prefix.
pub fn parse_size(value: &str) -> Result<u64> {
    let text = value.trim();
    let (digits, unit) = split_unit(text);

    let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        "T" | "TB" => 1024 * 1024 * 1024 * 1024,
        _ => {
            return ConfigParseSnafu {
                value,
                expected: "a size",
            }
            .fail();
        }
    };

    let number: u64 = digits.parse().map_err(|_| {
        ConfigParseSnafu {
            value,
            expected: "a size",
        }
        .build()
    })?;
    Ok(number * multiplier)
}

/// Parse a duration like `500ms`, `10s`, `5m`, `12h` or `7d`. A bare number
/// means seconds.
///
/// # Errors
///
/// Fails with `ConfigParse` on an empty string, unknown unit or non-numeric
/// prefix.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let text = value.trim();
    let (digits, unit) = split_unit(text);

    let number: u64 = digits.parse().map_err(|_| {
        ConfigParseSnafu {
            value,
            expected: "a duration",
        }
        .build()
    })?;

    let duration = match unit.to_ascii_lowercase().as_str() {
        "ms" => Duration::from_millis(number),
        "" | "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(number * 60),
        "h" => Duration::from_secs(number * 60 * 60),
        "d" => Duration::from_secs(number * 24 * 60 * 60),
        _ => {
            return ConfigParseSnafu {
                value,
                expected: "a duration",
            }
            .fail();
        }
    };
    Ok(duration)
}

fn split_unit(text: &str) -> (&str, &str) {
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(split)
}

/// Options for a rotating file handler, in human-readable form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, SmartDefault)]
#[serde(default)]
pub struct FileOptions {
    /// Path of the active log file.
    pub file: String,

    /// Rotate when the file exceeds this size.
    #[default = "10G"]
    pub rotate_size: String,

    /// Rotate when the file has been open this long.
    #[default = "1d"]
    pub rotate_interval: String,

    /// Delete backups older than this.
    #[default = "365d"]
    pub max_age: String,

    /// Keep at most this many backups; 0 means unlimited.
    #[default = 0]
    pub max_count: usize,

    /// Queue records and write from a background thread.
    pub async_write: bool,

    /// Record channel capacity in async mode.
    #[default = 8192]
    pub queue_size: usize,

    /// Background flush cadence.
    #[default = "100ms"]
    pub flush_interval: String,

    /// Records per write block during a flush.
    #[default = 256]
    pub flush_block_size: usize,

    /// Grace period before a rotated file is compressed.
    #[default = "5s"]
    pub archive_delay: String,

    /// Extension of compressed backups.
    #[default = ".gz"]
    pub archive_ext: String,

    /// Retention sweep cadence.
    #[default = "10m"]
    pub check_interval: String,
}

impl FileOptions {
    /// Resolve every human-readable value into engine configuration.
    ///
    /// # Errors
    ///
    /// Fails with `ConfigParse` naming the offending value.
    pub fn resolve(&self) -> Result<RolloverConfig> {
        Ok(RolloverConfig {
            file_path:        PathBuf::from(&self.file),
            rotate_size:      parse_size(&self.rotate_size)?,
            rotate_interval:  parse_duration(&self.rotate_interval)?,
            max_age:          parse_duration(&self.max_age)?,
            max_count:        if self.max_count == 0 {
                usize::MAX
            } else {
                self.max_count
            },
            async_write:      self.async_write,
            queue_size:       self.queue_size,
            flush_interval:   parse_duration(&self.flush_interval)?,
            flush_block_size: self.flush_block_size,
            archive_delay:    parse_duration(&self.archive_delay)?,
            archive_ext:      self.archive_ext.clone(),
            check_interval:   parse_duration(&self.check_interval)?,
        })
    }
}
