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

//! Pooled byte buffers for the write path.
//!
//! Formatting a log record produces a short-lived byte buffer. Allocating one
//! per record churns the allocator under high throughput, so this crate keeps
//! a pool of backing storage and hands out [`Buffer`]s that return their
//! storage on drop.
//!
//! Two pool strategies are provided:
//!
//! - [`RingPool`]: a fixed number of slots. Returning a buffer to a full ring
//!   drops the storage; borrowing from an empty ring allocates fresh storage.
//! - [`HeapPool`]: unbounded, every returned buffer is kept for reuse.
//!
//! Pooling is transparent: a pooled buffer produces byte-for-byte the same
//! contents as [`Buffer::detached`].

pub mod buffer;
pub mod pool;

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use buffer::Buffer;
pub use pool::{HeapPool, RingPool};

/// Initial capacity of pooled backing storage, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

static DEFAULT_POOL: Lazy<Arc<HeapPool>> =
    Lazy::new(|| HeapPool::new(DEFAULT_BUFFER_CAPACITY));

/// Borrow a cleared buffer from the process-wide default pool.
pub fn borrow() -> Buffer { DEFAULT_POOL.borrow() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_borrow() {
        let mut buf = borrow();
        buf.append_str("hello");
        assert_eq!(buf.as_bytes(), b"hello");
    }

    #[test]
    fn test_default_pool_reuses_storage() {
        let mut buf = borrow();
        buf.append_str("first use grows the storage past nothing");
        drop(buf);

        let buf = borrow();
        assert!(buf.is_empty());
    }
}
