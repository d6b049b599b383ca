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

use std::{path::PathBuf, time::Duration};

/// Resolved configuration for one rotating file sink.
///
/// All human-readable forms ("10G", "1d") are parsed by the caller; this
/// struct only carries resolved byte counts and durations.
#[derive(Debug, Clone)]
pub struct RolloverConfig {
    /// Path of the active log file.
    pub file_path:        PathBuf,
    /// Rotate once the active file exceeds this many bytes.
    pub rotate_size:      u64,
    /// Rotate once the active file has been open this long.
    pub rotate_interval:  Duration,
    /// Delete backups older than this.
    pub max_age:          Duration,
    /// Keep at most this many backups.
    pub max_count:        usize,
    /// Queue records and write from a background thread.
    pub async_write:      bool,
    /// Capacity of the record channel in async mode.
    pub queue_size:       usize,
    /// How often the background thread flushes accumulated records.
    pub flush_interval:   Duration,
    /// Records per write block during a flush.
    pub flush_block_size: usize,
    /// Grace period between rotation and compression of the backup.
    pub archive_delay:    Duration,
    /// Extension appended to compressed backups.
    pub archive_ext:      String,
    /// How often the retention sweep runs.
    pub check_interval:   Duration,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            file_path:        PathBuf::from("./logs/sawmill.log"),
            rotate_size:      10 * 1024 * 1024 * 1024,
            rotate_interval:  Duration::from_secs(24 * 60 * 60),
            max_age:          Duration::from_secs(365 * 24 * 60 * 60),
            max_count:        usize::MAX,
            async_write:      false,
            queue_size:       8192,
            flush_interval:   Duration::from_millis(100),
            flush_block_size: 256,
            archive_delay:    Duration::from_secs(5),
            archive_ext:      ".gz".to_string(),
            check_interval:   Duration::from_secs(10 * 60),
        }
    }
}

/// Builder over [`RolloverConfig`].
pub struct RolloverBuilder {
    config: RolloverConfig,
}

impl RolloverBuilder {
    pub fn new<P: Into<PathBuf>>(file_path: P) -> Self {
        Self {
            config: RolloverConfig {
                file_path: file_path.into(),
                ..Default::default()
            },
        }
    }

    #[must_use]
    pub fn rotate_size(mut self, bytes: u64) -> Self {
        self.config.rotate_size = bytes;
        self
    }

    #[must_use]
    pub fn rotate_interval(mut self, interval: Duration) -> Self {
        self.config.rotate_interval = interval;
        self
    }

    #[must_use]
    pub fn max_age(mut self, age: Duration) -> Self {
        self.config.max_age = age;
        self
    }

    #[must_use]
    pub fn max_count(mut self, count: usize) -> Self {
        self.config.max_count = count;
        self
    }

    #[must_use]
    pub fn async_write(mut self, enabled: bool) -> Self {
        self.config.async_write = enabled;
        self
    }

    #[must_use]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.config.queue_size = size;
        self
    }

    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use]
    pub fn flush_block_size(mut self, records: usize) -> Self {
        self.config.flush_block_size = records;
        self
    }

    #[must_use]
    pub fn archive_delay(mut self, delay: Duration) -> Self {
        self.config.archive_delay = delay;
        self
    }

    #[must_use]
    pub fn archive_ext<S: Into<String>>(mut self, ext: S) -> Self {
        self.config.archive_ext = ext.into();
        self
    }

    #[must_use]
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.config.check_interval = interval;
        self
    }

    #[must_use]
    pub fn build(self) -> RolloverConfig { self.config }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RolloverBuilder::new("/tmp/app.log").build();
        assert_eq!(config.file_path, PathBuf::from("/tmp/app.log"));
        assert_eq!(config.rotate_size, 10 * 1024 * 1024 * 1024);
        assert_eq!(config.queue_size, 8192);
        assert_eq!(config.archive_ext, ".gz");
        assert!(!config.async_write);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RolloverBuilder::new("/tmp/app.log")
            .rotate_size(1024)
            .rotate_interval(Duration::from_secs(60))
            .max_age(Duration::from_secs(3600))
            .max_count(7)
            .async_write(true)
            .queue_size(64)
            .flush_interval(Duration::from_millis(10))
            .flush_block_size(16)
            .archive_delay(Duration::from_millis(50))
            .archive_ext(".gzip")
            .check_interval(Duration::from_secs(1))
            .build();

        assert_eq!(config.rotate_size, 1024);
        assert_eq!(config.max_count, 7);
        assert!(config.async_write);
        assert_eq!(config.flush_block_size, 16);
        assert_eq!(config.archive_ext, ".gzip");
    }
}
