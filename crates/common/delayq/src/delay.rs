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

//! A blocking queue of delayed elements.
//!
//! An element offered with an expiry timestamp can only be taken once that
//! timestamp has passed; the head is always the element whose expiry lies
//! furthest in the past. One timer thread per queue waits for the earliest
//! expiry; there is no polling loop.
//!
//! ## Wakeup protocol
//!
//! The timer thread and [`offer`](DelayQueue::offer) coordinate through an
//! atomic `sleeping` flag and a rendezvous channel:
//!
//! - The timer pops eligible items under the queue mutex. When nothing is
//!   eligible it sets `sleeping` and then blocks: on the wakeup channel
//!   alone (empty queue), or racing the wakeup channel against a timer for
//!   the earliest expiry (pending items).
//! - `offer` signals the wakeup channel only when its item became the new
//!   earliest *and* it won the `sleeping` CAS. The send is intentionally
//!   blocking: the rendezvous hands the wakeup directly to the timer thread.
//! - When the timer fires, the thread swaps `sleeping` to false. Seeing
//!   false means an `offer` already won the CAS and is mid-send, so the
//!   channel must be drained to unblock it. Skipping that drain deadlocks
//!   the producer; this is the race the flag exists to close.
//!
//! The mutex makes "peek then sleep" atomic against "push then signal", so
//! an item can never be inserted unnoticed between the two.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use chrono::{DateTime, Utc};
use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
};
use snafu::ResultExt;

use crate::{PriorityQueue, Result, error::SpawnTimerSnafu};

struct Shared<T> {
    pq:       PriorityQueue<T>,
    /// True while the timer thread is (about to be) blocked waiting.
    sleeping: AtomicBool,
    /// Serializes the timer's peek-then-sleep against offer's push-then-signal.
    mu:       Mutex<()>,
}

/// A bounded blocking queue whose elements become visible at a deadline.
pub struct DelayQueue<T> {
    shared:    Arc<Shared<T>>,
    wakeup_tx: Sender<()>,
    out_rx:    Receiver<T>,
}

impl<T: Send + Sync + 'static> DelayQueue<T> {
    /// Create a delay queue and spawn its timer thread.
    ///
    /// `capacity` bounds both the pending heap and the result channel. The
    /// timer thread pushes expired values onto the result channel and will
    /// stall if the channel stays full, so size the capacity for the
    /// consumer's worst-case lag.
    ///
    /// # Errors
    ///
    /// Fails if the timer thread cannot be spawned.
    pub fn new(capacity: usize) -> Result<Self> {
        let shared = Arc::new(Shared {
            pq:       PriorityQueue::new(capacity),
            sleeping: AtomicBool::new(false),
            mu:       Mutex::new(()),
        });
        let (wakeup_tx, wakeup_rx) = channel::bounded(0);
        let (out_tx, out_rx) = channel::bounded(capacity);

        let timer_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("delayq-timer".into())
            .spawn(move || timer_loop(&timer_shared, &wakeup_rx, &out_tx))
            .context(SpawnTimerSnafu)?;

        Ok(Self {
            shared,
            wakeup_tx,
            out_rx,
        })
    }

    /// Insert `value`, to become takeable at `expire_at`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::QueueFull`](crate::Error) when the heap is at
    /// capacity.
    pub fn offer(&self, value: T, expire_at: DateTime<Utc>) -> Result<()> {
        let _guard = self.shared.mu.lock().unwrap();
        let index = self.shared.pq.push(nanos_of(expire_at), value)?;

        if index == 0
            && self
                .shared
                .sleeping
                .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            // Rendezvous with the timer thread; see the module docs.
            let _ = self.wakeup_tx.send(());
        }
        Ok(())
    }

    /// Insert `value`, to become takeable after `delay` from now.
    ///
    /// # Errors
    ///
    /// Same as [`offer`](Self::offer).
    pub fn offer_after(&self, value: T, delay: Duration) -> Result<()> {
        let delta = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let expire_at = Utc::now()
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.offer(value, expire_at)
    }

    /// Wait up to `timeout` for an expired element.
    ///
    /// `None` means nothing expired within the timeout, a normal outcome and
    /// not a failure.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        self.out_rx.recv_timeout(timeout).ok()
    }

    /// Number of elements still pending (not yet handed to the result
    /// channel).
    pub fn len(&self) -> usize { self.shared.pq.len() }

    /// Whether no elements are pending.
    pub fn is_empty(&self) -> bool { self.shared.pq.is_empty() }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize { self.shared.pq.capacity() }
}

/// Timer loop: waits for the earliest expiry and forwards expired values.
///
/// Exits when the owning [`DelayQueue`] is dropped (both channels
/// disconnect).
fn timer_loop<T>(shared: &Shared<T>, wakeup_rx: &Receiver<()>, out_tx: &Sender<T>) {
    loop {
        let (item, delta) = {
            let _guard = shared.mu.lock().unwrap();
            let (item, delta) = shared.pq.peek_and_shift(nanos_of(Utc::now()));
            if item.is_none() {
                // Must happen under the mutex, atomically with the peek.
                shared.sleeping.store(true, Ordering::SeqCst);
            }
            (item, delta)
        };

        match item {
            Some((_, value)) => {
                // May block when the result channel is full; capacity is the
                // caller's contract.
                if out_tx.send(value).is_err() {
                    return;
                }
            }
            None if delta == 0 => {
                // Nothing pending: wait for the next offer.
                if wakeup_rx.recv().is_err() {
                    return;
                }
            }
            None => {
                // Earliest item still pending: race its timer against an
                // earlier-expiring offer.
                select! {
                    recv(wakeup_rx) -> msg => {
                        if msg.is_err() {
                            return;
                        }
                    }
                    recv(channel::after(nanos_duration(delta))) -> _ => {
                        if !shared.sleeping.swap(false, Ordering::SeqCst) {
                            // An offer won the CAS and is blocked mid-send;
                            // drain the channel to unblock it.
                            if wakeup_rx.recv().is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

fn nanos_of(time: DateTime<Utc>) -> i64 {
    time.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn nanos_duration(delta: i64) -> Duration {
    Duration::from_nanos(delta.max(0).unsigned_abs())
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Instant};

    use super::*;
    use crate::Error;

    // Generous upper bound: thread wake latency on loaded CI machines.
    const SLOP: Duration = Duration::from_millis(150);

    #[test]
    fn test_delivery_in_expiry_order() {
        let q = DelayQueue::new(8).unwrap();
        let begin = Utc::now();
        let started = Instant::now();

        // Insertion order deliberately differs from expiry order.
        for (value, delay_ms) in [("d", 200_i64), ("b", 80), ("a", 30), ("c", 120)] {
            q.offer(value, begin + chrono::Duration::milliseconds(delay_ms))
                .unwrap();
        }

        for (value, delay_ms) in [("a", 30_u64), ("b", 80), ("c", 120), ("d", 200)] {
            let taken = q.take(Duration::from_secs(2)).unwrap();
            assert_eq!(taken, value);

            let elapsed = started.elapsed();
            let expiry = Duration::from_millis(delay_ms);
            assert!(
                elapsed + Duration::from_millis(2) >= expiry,
                "{value} delivered early: {elapsed:?} < {expiry:?}"
            );
            assert!(
                elapsed <= expiry + SLOP,
                "{value} delivered late: {elapsed:?} > {expiry:?} + slop"
            );
        }
    }

    #[test]
    fn test_earlier_offer_preempts_sleeping_timer() {
        let q = DelayQueue::new(8).unwrap();

        q.offer_after("slow", Duration::from_millis(500)).unwrap();
        // Timer is now asleep waiting on "slow"; this must wake it.
        q.offer_after("fast", Duration::from_millis(20)).unwrap();

        let started = Instant::now();
        assert_eq!(q.take(Duration::from_secs(2)).unwrap(), "fast");
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(q.take(Duration::from_secs(2)).unwrap(), "slow");
    }

    #[test]
    fn test_take_timeout_returns_none() {
        let q: DelayQueue<()> = DelayQueue::new(4).unwrap();
        let started = Instant::now();

        assert!(q.take(Duration::from_millis(60)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_offer_beyond_capacity_fails() {
        let q = DelayQueue::new(2).unwrap();
        let far = Utc::now() + chrono::Duration::hours(1);

        q.offer(1, far).unwrap();
        q.offer(2, far).unwrap();
        let err = q.offer(3, far).unwrap_err();
        assert!(matches!(err, Error::QueueFull { capacity: 2 }));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_no_loss_under_concurrent_offers() {
        const THREADS: u64 = 4;
        const PER_THREAD: u64 = 25;

        let q = Arc::new(DelayQueue::new(256).unwrap());

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let q = Arc::clone(&q);
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        let value = t * PER_THREAD + i;
                        // Spread pseudo-random near-future expiries.
                        let delay = Duration::from_millis(value * 7 % 60);
                        q.offer_after(value, delay).unwrap();
                    }
                });
            }
        });

        let mut seen = HashSet::new();
        for _ in 0..THREADS * PER_THREAD {
            let value = q
                .take(Duration::from_secs(2))
                .expect("offered value went missing");
            assert!(seen.insert(value), "value {value} delivered twice");
        }
        assert_eq!(seen.len(), (THREADS * PER_THREAD) as usize);
        assert!(q.take(Duration::from_millis(80)).is_none());
    }

    #[test]
    fn test_past_expiry_is_immediately_takeable() {
        let q = DelayQueue::new(4).unwrap();
        q.offer("old", Utc::now() - chrono::Duration::seconds(5))
            .unwrap();

        let started = Instant::now();
        assert_eq!(q.take(Duration::from_secs(1)).unwrap(), "old");
        assert!(started.elapsed() < SLOP);
    }
}
