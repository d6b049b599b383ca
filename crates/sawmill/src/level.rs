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

use serde::{Deserialize, Serialize};

/// Log severity, ordered from least to most severe.
///
/// `Data` sits between `Info` and `Warn`: business events that are neither
/// diagnostics nor problems, typically routed to their own handler via a
/// marker.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Level {
    #[default]
    Debug,
    Info,
    Data,
    Warn,
    Error,
    Fatal,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use test_case::test_case;

    use super::*;

    #[test_case("DEBUG", Level::Debug)]
    #[test_case("info", Level::Info)]
    #[test_case("Data", Level::Data)]
    #[test_case("WARN", Level::Warn)]
    #[test_case("error", Level::Error)]
    #[test_case("FATAL", Level::Fatal)]
    fn test_parse(input: &str, expected: Level) {
        assert_eq!(Level::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_fails() {
        assert!(Level::from_str("verbose").is_err());
    }

    #[test]
    fn test_display_is_uppercase() {
        assert_eq!(Level::Warn.to_string(), "WARN");
        assert_eq!(Level::Debug.to_string(), "DEBUG");
    }

    #[test]
    fn test_severity_order() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Data);
        assert!(Level::Data < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }
}
