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

//! Deferred, cancellable scheduling primitives.
//!
//! [`PriorityQueue`] is a capacity-bounded min-heap ordering opaque values by
//! an `i64` priority (lower pops first). [`DelayQueue`] builds on it: values
//! are offered with an expiry timestamp and can only be taken once that
//! timestamp has passed, coordinated by a single timer thread, with no polling.

pub mod delay;
pub mod error;
pub mod pqueue;

pub use delay::DelayQueue;
pub use error::{Error, Result};
pub use pqueue::PriorityQueue;
