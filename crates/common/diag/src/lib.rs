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

//! Rate-limited internal diagnostics.
//!
//! A logging pipeline must not respond to failure by producing more log
//! traffic. Errors raised inside background loops (batch flush, archival,
//! retention sweeps) are reported through an [`ErrorSink`] whose
//! [`RateLimiter`] bounds how many reports per interval actually reach
//! `tracing`; the excess is dropped.

use std::{
    error::Error as StdError,
    sync::Mutex,
    time::{Duration, Instant},
};

use tracing::error;

/// Admits up to `rate` events per `interval`, then denies until the next
/// window.
pub struct RateLimiter {
    rate:     u32,
    interval: Duration,
    window:   Mutex<Window>,
}

struct Window {
    started: Instant,
    used:    u32,
}

impl RateLimiter {
    /// Create a limiter admitting `rate` events per `interval`.
    #[must_use]
    pub fn new(rate: u32, interval: Duration) -> Self {
        Self {
            rate,
            interval,
            window: Mutex::new(Window {
                started: Instant::now(),
                used:    0,
            }),
        }
    }

    /// Whether one more event fits in the current window.
    pub fn allow(&self) -> bool {
        let mut window = self.window.lock().unwrap();
        if window.started.elapsed() > self.interval {
            window.started = Instant::now();
            window.used = 0;
        }
        if window.used >= self.rate {
            return false;
        }
        window.used += 1;
        true
    }
}

/// Forwards admitted error reports to `tracing`, dropping the rest.
pub struct ErrorSink {
    limiter: RateLimiter,
}

impl Default for ErrorSink {
    /// Ten reports per second, the default for background loops.
    fn default() -> Self {
        Self::new(RateLimiter::new(10, Duration::from_secs(1)))
    }
}

impl ErrorSink {
    #[must_use]
    pub const fn new(limiter: RateLimiter) -> Self { Self { limiter } }

    /// Report an error from a background loop.
    pub fn report(&self, context: &str, err: &dyn StdError) {
        if self.limiter.allow() {
            error!(error = %err, "{context}");
        }
    }

    /// Report a failure that carries no error value (e.g. a panicking hook).
    pub fn report_msg(&self, context: &str, detail: &str) {
        if self.limiter.allow() {
            error!(detail, "{context}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_admits_up_to_rate() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn test_limiter_resets_after_interval() {
        let limiter = RateLimiter::new(1, Duration::from_millis(30));

        assert!(limiter.allow());
        assert!(!limiter.allow());

        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.allow());
    }

    #[test]
    fn test_sink_survives_error_storm() {
        let sink = ErrorSink::new(RateLimiter::new(5, Duration::from_secs(60)));
        let err = std::io::Error::other("disk on fire");

        // Only the first five reach tracing; the rest are dropped quietly.
        for _ in 0..10_000 {
            sink.report("flush failed", &err);
        }
    }
}
