use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CHAT_NAME: &str = "New Chat";

const CHAT_NAME_KEY: &str = "chat_name";
const LAST_ACTIVITY_TIME_KEY: &str = "last_activity_time";

/// Open-ended side data the agent engine attaches to each checkpoint
///
/// Keys come and go as the engine evolves, so nothing here is required.
/// Known keys get an accessor that encodes its default; a value of the
/// wrong JSON type is treated the same as a missing key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointMetadata(Map<String, Value>);

impl CheckpointMetadata {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Display label for the conversation, `"New Chat"` when unset
    pub fn chat_name(&self) -> &str {
        self.str_value(CHAT_NAME_KEY).unwrap_or(DEFAULT_CHAT_NAME)
    }

    /// ISO-8601 timestamp of the last turn, if the engine recorded one
    pub fn last_activity_time(&self) -> Option<&str> {
        self.str_value(LAST_ACTIVITY_TIME_KEY)
    }

    pub fn last_activity_time_or(&self, fallback: &str) -> String {
        self.last_activity_time().unwrap_or(fallback).to_string()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Text form identical to Postgres `jsonb::text` output
    ///
    /// Object keys are ordered by length, then bytewise; separators are
    /// `", "` and `": "`. Numbers print as serde_json prints them, which
    /// agrees with `jsonb` for integers and plain decimals.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        write_object(&self.0, &mut out);
        out
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes())));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_string(key, out);
        out.push_str(": ");
        write_value(&map[key.as_str()], out);
    }
    out.push('}');
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

impl From<Map<String, Value>> for CheckpointMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for CheckpointMetadata {
    type Error = Value;

    /// `null` maps to empty metadata; anything other than an object is handed back
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(other),
        }
    }
}

/// One persisted step of a conversation, as far as this service cares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    #[serde(default)]
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    pub fn new(thread_id: impl Into<String>, metadata: CheckpointMetadata) -> Self {
        Self {
            thread_id: thread_id.into(),
            metadata,
        }
    }

    /// Ordering used to pick the snapshot that represents a thread
    ///
    /// Larger wins. The string `last_activity_time` is compared bytewise and a
    /// missing or non-string one ranks below every present one. Equal times
    /// fall back to the smaller canonical metadata text, so the choice does
    /// not depend on row order.
    pub(crate) fn rank_key(&self) -> (Option<&str>, Reverse<String>) {
        (
            self.metadata.last_activity_time(),
            Reverse(self.metadata.canonical_text()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> CheckpointMetadata {
        CheckpointMetadata::try_from(value).unwrap()
    }

    #[test]
    fn test_empty_metadata_defaults() {
        let meta = metadata(json!({}));
        assert_eq!(meta.chat_name(), "New Chat");
        assert_eq!(meta.last_activity_time(), None);
        assert_eq!(meta.last_activity_time_or("2030-05-05T10:00:00Z"), "2030-05-05T10:00:00Z");
    }

    #[test]
    fn test_present_values_win() {
        let meta = metadata(json!({
            "chat_name": "Trip Planning",
            "last_activity_time": "2024-01-01T00:00:00",
            "step": 4
        }));
        assert_eq!(meta.chat_name(), "Trip Planning");
        assert_eq!(meta.last_activity_time(), Some("2024-01-01T00:00:00"));
        assert_eq!(meta.get("step"), Some(&json!(4)));
    }

    #[test]
    fn test_wrong_type_treated_as_missing() {
        let meta = metadata(json!({ "chat_name": 12, "last_activity_time": false }));
        assert_eq!(meta.chat_name(), DEFAULT_CHAT_NAME);
        assert_eq!(meta.last_activity_time(), None);
    }

    #[test]
    fn test_null_is_empty_and_scalars_rejected() {
        assert!(metadata(Value::Null).is_empty());
        assert_eq!(CheckpointMetadata::try_from(json!("oops")), Err(json!("oops")));
        assert!(CheckpointMetadata::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_canonical_text_matches_jsonb_layout() {
        let meta = metadata(json!({
            "step": 3,
            "chat_name": "Say \"hi\"\n",
            "a": [true, null, {"zz": 1, "b": 2.5}]
        }));

        assert_eq!(
            meta.canonical_text(),
            r#"{"a": [true, null, {"b": 2.5, "zz": 1}], "step": 3, "chat_name": "Say \"hi\"\n"}"#
        );
        assert_eq!(CheckpointMetadata::default().canonical_text(), "{}");
        assert_eq!(metadata(json!({"k": "\u{1}"})).canonical_text(), r#"{"k": "\u0001"}"#);
    }

    #[test]
    fn test_rank_key() {
        let newer = Checkpoint::new("t", metadata(json!({ "last_activity_time": "2024-02-01T00:00:00" })));
        let older = Checkpoint::new("t", metadata(json!({ "last_activity_time": "2024-01-01T00:00:00" })));
        let numeric = Checkpoint::new("t", metadata(json!({ "last_activity_time": 99 })));
        let untimed = Checkpoint::new("t", metadata(json!({ "chat_name": "a" })));
        let untimed_b = Checkpoint::new("t", metadata(json!({ "chat_name": "b" })));

        assert!(newer.rank_key() > older.rank_key());
        assert!(older.rank_key() > numeric.rank_key());
        // Non-string times rank like missing ones, then the smaller text wins
        assert!(untimed.rank_key() > numeric.rank_key());
        assert!(untimed.rank_key() > untimed_b.rank_key());
    }

    #[test]
    fn test_checkpoint_deserializes_without_metadata() {
        let checkpoint: Checkpoint = serde_json::from_value(json!({ "thread_id": "t-1" })).unwrap();
        assert_eq!(checkpoint.thread_id, "t-1");
        assert!(checkpoint.metadata.is_empty());
    }
}
