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

use std::sync::Arc;

use bytes::BytesMut;
use crossbeam::queue::{ArrayQueue, SegQueue};

use crate::Buffer;

/// Receives released backing storage from a dropped [`Buffer`].
pub trait Recycler: Send + Sync {
    fn recycle(&self, storage: BytesMut);
}

/// Fixed-capacity pool over a lock-free ring.
///
/// Holds at most `slots` idle storages. Releasing into a full ring drops the
/// storage; borrowing from an empty ring allocates a fresh one. Bounds the
/// memory pinned by the pool at the cost of occasional reallocation.
pub struct RingPool {
    slots:        ArrayQueue<BytesMut>,
    buf_capacity: usize,
}

impl RingPool {
    /// Create a pool with `slots` reusable storages of `buf_capacity` bytes.
    #[must_use]
    pub fn new(slots: usize, buf_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: ArrayQueue::new(slots),
            buf_capacity,
        })
    }

    /// Borrow a cleared buffer, allocating if the ring is empty.
    pub fn borrow(self: &Arc<Self>) -> Buffer {
        let storage = self
            .slots
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buf_capacity));
        Buffer::pooled(storage, self.clone())
    }

    /// Number of idle storages currently held.
    #[must_use]
    pub fn idle(&self) -> usize { self.slots.len() }
}

impl Recycler for RingPool {
    fn recycle(&self, storage: BytesMut) {
        // Full ring: let the storage drop.
        let _ = self.slots.push(storage);
    }
}

/// Unbounded pool; every released storage is kept for reuse.
pub struct HeapPool {
    slots:        SegQueue<BytesMut>,
    buf_capacity: usize,
}

impl HeapPool {
    /// Create a pool handing out storages of `buf_capacity` bytes.
    #[must_use]
    pub fn new(buf_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            slots: SegQueue::new(),
            buf_capacity,
        })
    }

    /// Borrow a cleared buffer, allocating if no idle storage exists.
    pub fn borrow(self: &Arc<Self>) -> Buffer {
        let storage = self
            .slots
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buf_capacity));
        Buffer::pooled(storage, self.clone())
    }

    /// Number of idle storages currently held.
    #[must_use]
    pub fn idle(&self) -> usize { self.slots.len() }
}

impl Recycler for HeapPool {
    fn recycle(&self, storage: BytesMut) { self.slots.push(storage); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_pool_recycles() {
        let pool = RingPool::new(2, 16);
        assert_eq!(pool.idle(), 0);

        let buf = pool.borrow();
        drop(buf);
        assert_eq!(pool.idle(), 1);

        // Borrowed storage comes back cleared.
        let mut buf = pool.borrow();
        assert_eq!(pool.idle(), 0);
        buf.append_str("data");
        drop(buf);
        let buf = pool.borrow();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ring_pool_drops_on_overflow() {
        let pool = RingPool::new(1, 16);

        let a = pool.borrow();
        let b = pool.borrow();
        drop(a);
        drop(b);

        // Second release found the ring full and dropped its storage.
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_heap_pool_keeps_everything() {
        let pool = HeapPool::new(16);

        let bufs: Vec<_> = (0..8).map(|_| pool.borrow()).collect();
        drop(bufs);

        assert_eq!(pool.idle(), 8);
    }

    #[test]
    fn test_borrow_under_contention() {
        let pool = HeapPool::new(32);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let pool = pool.clone();
                scope.spawn(move || {
                    for i in 0..1000 {
                        let mut buf = pool.borrow();
                        buf.append_u64(i);
                        assert!(!buf.is_empty());
                    }
                });
            }
        });
    }
}
