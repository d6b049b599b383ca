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

use std::{fmt, io, mem, sync::Arc};

use bytes::BytesMut;

use crate::pool::Recycler;

/// A growable byte buffer, optionally backed by a pool.
///
/// Buffers borrowed from a pool return their storage when dropped. Because
/// the storage moves back by value, a released buffer cannot be touched
/// afterward; the borrow checker enforces what would otherwise be a
/// use-after-free class of bug.
pub struct Buffer {
    storage: BytesMut,
    pool:    Option<Arc<dyn Recycler>>,
}

impl Buffer {
    /// Create a buffer that owns its storage and never returns it to a pool.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            storage: BytesMut::new(),
            pool:    None,
        }
    }

    pub(crate) fn pooled(mut storage: BytesMut, pool: Arc<dyn Recycler>) -> Self {
        storage.clear();
        Self {
            storage,
            pool: Some(pool),
        }
    }

    /// Append a single byte.
    pub fn append_byte(&mut self, b: u8) { self.storage.extend_from_slice(&[b]); }

    /// Append raw bytes.
    pub fn append_bytes(&mut self, bytes: &[u8]) { self.storage.extend_from_slice(bytes); }

    /// Append a string slice.
    pub fn append_str(&mut self, s: &str) { self.storage.extend_from_slice(s.as_bytes()); }

    /// Append a signed integer in base 10.
    pub fn append_i64(&mut self, v: i64) {
        use fmt::Write;
        let _ = write!(self, "{v}");
    }

    /// Append an unsigned integer in base 10.
    pub fn append_u64(&mut self, v: u64) {
        use fmt::Write;
        let _ = write!(self, "{v}");
    }

    /// Append a float with the shortest round-trip representation.
    pub fn append_f64(&mut self, v: f64) {
        use fmt::Write;
        let _ = write!(self, "{v}");
    }

    /// Append `true` or `false`.
    pub fn append_bool(&mut self, v: bool) {
        self.append_str(if v { "true" } else { "false" });
    }

    /// Append a line feed.
    pub fn append_newline(&mut self) { self.append_byte(b'\n'); }

    /// Current content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize { self.storage.len() }

    /// Whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.storage.is_empty() }

    /// Capacity of the backing storage.
    #[must_use]
    pub fn capacity(&self) -> usize { self.storage.capacity() }

    /// View of the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.storage }

    /// Discard the contents, keeping the storage.
    pub fn clear(&mut self) { self.storage.clear(); }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.recycle(mem::take(&mut self.storage));
        }
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.storage.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_str(s);
        Ok(())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buf: &mut Buffer) {
        buf.append_str("msg=");
        buf.append_i64(-42);
        buf.append_byte(b',');
        buf.append_u64(7);
        buf.append_bytes(b"|");
        buf.append_bool(true);
        buf.append_f64(1.25);
        buf.append_newline();
    }

    #[test]
    fn test_append_surface() {
        let mut buf = Buffer::detached();
        fill(&mut buf);
        assert_eq!(buf.as_bytes(), b"msg=-42,7|true1.25\n");
        assert_eq!(buf.len(), 19);
        assert!(!buf.is_empty());

        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pooled_matches_detached() {
        let pool = crate::HeapPool::new(64);

        let mut pooled = pool.borrow();
        let mut plain = Buffer::detached();
        fill(&mut pooled);
        fill(&mut plain);

        assert_eq!(pooled.as_bytes(), plain.as_bytes());
    }

    #[test]
    fn test_io_write() {
        use std::io::Write;

        let mut buf = Buffer::detached();
        buf.write_all(b"abc").unwrap();
        buf.flush().unwrap();
        assert_eq!(buf.as_bytes(), b"abc");
    }

    #[test]
    fn test_fmt_write() {
        use std::fmt::Write;

        let mut buf = Buffer::detached();
        write!(buf, "{}-{}", 1, "x").unwrap();
        assert_eq!(buf.as_bytes(), b"1-x");
    }

    #[test]
    fn test_int_extremes() {
        let mut buf = Buffer::detached();
        buf.append_i64(i64::MIN);
        buf.append_byte(b' ');
        buf.append_i64(i64::MAX);
        assert_eq!(
            buf.as_bytes(),
            b"-9223372036854775808 9223372036854775807"
        );
    }
}
