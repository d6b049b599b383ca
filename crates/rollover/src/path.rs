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

//! Backup file naming.
//!
//! A rotated file is renamed to `{base}.{YYYY-MM-DD.HHMMSS}{ext}`, and the
//! archiver later appends its own extension
//! (`app.log` → `app.2026-08-07.153000.log` → `app.2026-08-07.153000.log.gz`).
//! The stamp stays a contiguous `dddd-dd-dd.dddddd` run so the cleaner can
//! recover it from a filename without knowing how the rest is shaped.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `chrono` format of the backup stamp.
pub const BACKUP_STAMP_FORMAT: &str = "%Y-%m-%d.%H%M%S";

/// Length of a formatted backup stamp: `YYYY-MM-DD.HHMMSS`.
const BACKUP_STAMP_LEN: usize = 17;

/// Split a file name into base name and extension, keeping the dot:
/// `app.log` → `("app", ".log")`, `app` → `("app", "")`.
#[must_use]
pub fn split_base_ext(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Name for a rotated backup of `base`/`ext` stamped with `time`.
#[must_use]
pub fn backup_file_name(base: &str, ext: &str, time: DateTime<Utc>) -> String {
    format!("{base}.{}{ext}", time.format(BACKUP_STAMP_FORMAT))
}

/// Recover the backup stamp embedded anywhere in `name`.
///
/// Scans for the first `YYYY-MM-DD.HHMMSS` shaped run; returns `None` when no
/// such run parses as a real timestamp.
#[must_use]
pub fn extract_backup_stamp(name: &str) -> Option<DateTime<Utc>> {
    let bytes = name.as_bytes();
    if bytes.len() < BACKUP_STAMP_LEN {
        return None;
    }

    for start in 0..=(bytes.len() - BACKUP_STAMP_LEN) {
        let window = &bytes[start..start + BACKUP_STAMP_LEN];
        if !stamp_shaped(window) {
            continue;
        }
        let text = &name[start..start + BACKUP_STAMP_LEN];
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, BACKUP_STAMP_FORMAT) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// `dddd-dd-dd.dddddd`
fn stamp_shaped(window: &[u8]) -> bool {
    window.iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'.',
        _ => b.is_ascii_digit(),
    })
}
