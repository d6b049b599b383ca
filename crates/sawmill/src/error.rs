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

use std::io;

use snafu::Snafu;

/// Facade errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A human-readable option ("10G", "1d") did not parse.
    #[snafu(display("cannot parse {value:?} as {expected}"))]
    ConfigParse {
        value:    String,
        expected: &'static str,
    },

    #[snafu(transparent)]
    Lifecycle { source: sawmill_rollover::Error },

    #[snafu(display("failed to write console output"))]
    ConsoleWrite { source: io::Error },
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
