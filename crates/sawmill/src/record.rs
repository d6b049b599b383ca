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

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::Level;

/// One structured log event.
///
/// Fields keep their insertion order, both in the text formatters and in the
/// JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    #[serde(serialize_with = "time_rfc3339")]
    pub time:   DateTime<Utc>,
    pub level:  Level,
    pub msg:    String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub err:    Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "fields_in_order")]
    pub fields: Vec<(String, serde_json::Value)>,
}

impl Record {
    /// A record stamped now.
    #[must_use]
    pub fn new<S: Into<String>>(level: Level, msg: S) -> Self {
        Self {
            time:   Utc::now(),
            level,
            msg:    msg.into(),
            marker: None,
            err:    None,
            fields: Vec::new(),
        }
    }
}

fn time_rfc3339<S: Serializer>(time: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn fields_in_order<S: Serializer>(
    fields: &[(String, serde_json::Value)],
    ser: S,
) -> Result<S::Ok, S::Error> {
    let mut map = ser.serialize_map(Some(fields.len()))?;
    for (key, value) in fields {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut record = Record::new(Level::Info, "user logged in");
        record.fields.push(("user".into(), "ada".into()));
        record.fields.push(("attempt".into(), 2.into()));

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();

        assert_eq!(json["level"], "INFO");
        assert_eq!(json["msg"], "user logged in");
        assert_eq!(json["fields"]["user"], "ada");
        assert_eq!(json["fields"]["attempt"], 2);
        assert!(json.get("marker").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_json_keeps_field_order() {
        let mut record = Record::new(Level::Info, "m");
        for key in ["zulu", "alpha", "mike"] {
            record.fields.push((key.into(), 1.into()));
        }

        let text = serde_json::to_string(&record).unwrap();
        let z = text.find("zulu").unwrap();
        let a = text.find("alpha").unwrap();
        let m = text.find("mike").unwrap();
        assert!(z < a && a < m, "insertion order lost: {text}");
    }

    #[test]
    fn test_optional_parts_serialized_when_set() {
        let mut record = Record::new(Level::Error, "boom");
        record.marker = Some("audit".into());
        record.err = Some("io: broken pipe".into());

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(json["marker"], "audit");
        assert_eq!(json["error"], "io: broken pipe");
    }
}
