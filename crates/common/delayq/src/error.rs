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

use snafu::Snafu;

/// Queue operation errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The queue already holds `capacity` items.
    #[snafu(display("queue is full (capacity {capacity})"))]
    QueueFull { capacity: usize },

    /// Nothing to pop.
    #[snafu(display("queue is empty"))]
    EmptyQueue,

    /// The timer thread could not be spawned.
    #[snafu(display("failed to spawn timer thread"))]
    SpawnTimer { source: std::io::Error },
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, Error>;
