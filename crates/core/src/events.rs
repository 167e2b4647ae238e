//! Event type definitions for the ingest pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single ingested event.
///
/// `timestamp`, `service` and `name` are mandatory; the remaining string
/// fields are optional correlation metadata and default to empty. `data` is
/// a free-form JSON payload stored as JSON text.
///
/// Unknown top-level fields in the wire format are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Event {
    /// Event time, millisecond precision UTC.
    pub timestamp: DateTime<Utc>,

    /// Emitting service.
    #[validate(length(min = 1, max = 256))]
    pub service: String,

    /// Event kind, e.g. "user.created".
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    /// Deployment environment.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,

    /// Log level: info/warn/error/debug.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trace_id: String,

    /// Arbitrary nested payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Event {
    /// JSON text stored in the `data` column; `{}` when absent.
    pub fn data_json(&self) -> String {
        match &self.data {
            Some(value) => value.to_string(),
            None => "{}".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_event() {
        let event: Event = serde_json::from_str(
            r#"{"timestamp":"2026-02-06T23:01:02.123Z","service":"users","name":"user.created"}"#,
        )
        .unwrap();
        assert_eq!(event.service, "users");
        assert_eq!(event.name, "user.created");
        assert_eq!(event.timestamp.timestamp_millis(), 1770418862123);
        assert!(event.env.is_empty());
        assert_eq!(event.data_json(), "{}");
        event.validate().unwrap();
    }

    #[test]
    fn ignores_unknown_fields() {
        let event: Event = serde_json::from_str(
            r#"{"timestamp":"2026-02-06T23:01:02Z","service":"s","name":"n","nope":1}"#,
        )
        .unwrap();
        assert_eq!(event.service, "s");
    }

    #[test]
    fn rejects_empty_required_fields() {
        let event: Event = serde_json::from_str(
            r#"{"timestamp":"2026-02-06T23:01:02Z","service":"","name":"n"}"#,
        )
        .unwrap();
        assert!(event.validate().is_err());
    }

    #[test]
    fn missing_timestamp_is_a_parse_error() {
        let result = serde_json::from_str::<Event>(r#"{"service":"s","name":"n"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn data_payload_round_trips_as_text() {
        let event: Event = serde_json::from_str(
            r#"{"timestamp":"2026-02-06T23:01:02Z","service":"s","name":"n","data":{"status":200}}"#,
        )
        .unwrap();
        assert_eq!(event.data_json(), r#"{"status":200}"#);
    }

    #[test]
    fn empty_optional_fields_are_omitted_from_output() {
        let event: Event = serde_json::from_str(
            r#"{"timestamp":"2026-02-06T23:01:02Z","service":"s","name":"n"}"#,
        )
        .unwrap();
        let out = serde_json::to_string(&event).unwrap();
        assert!(!out.contains("env"));
        assert!(!out.contains("trace_id"));
        assert!(!out.contains("data"));
    }
}
