//! Canonical refresh event.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time::{rfc3339_z, rfc3339_z_option};

/// Version of the event layout. Bump together with the external schema.
pub const SCHEMA_VERSION: &str = "1.0";

/// Namespace for [`event_id`].
///
/// Changing it, or the seed layout in [`event_id_seed`], changes every id and
/// breaks deduplication against previously emitted events.
pub const EVENT_ID_NAMESPACE: Uuid = Uuid::NAMESPACE_URL;

/// Timestamps are written as UTC with a literal `Z`.
const UTC_TIMESTAMP_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?Z$";

/// Default provenance tag.
pub const DEFAULT_SOURCE: &str = "collector";

/// Statuses for which `error_message` is populated.
pub const ERROR_STATUSES: &[&str] = &["Failed", "Cancelled"];

/// One refresh of one dataset, normalized to the v1.0 layout.
///
/// Optional fields serialize as `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RefreshEvent {
    pub schema_version: String,
    #[schemars(with = "String")]
    pub event_id: Uuid,
    #[serde(with = "rfc3339_z")]
    #[schemars(with = "String")]
    pub emitted_at: DateTime<Utc>,
    pub workspace_id: String,
    pub workspace_name: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub refresh_id: String,
    /// Upstream status, passed through (`Completed`, `Failed`, `Cancelled`,
    /// `Disabled`, `Unknown`, ...).
    pub status: String,
    #[serde(with = "rfc3339_z")]
    #[schemars(with = "String")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "rfc3339_z_option")]
    #[schemars(with = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: Option<i64>,
    pub error_message: Option<String>,
    pub source: String,
}

impl RefreshEvent {
    /// JSON Schema describing the serialized event.
    ///
    /// Every key is required since optional values are written as `null`.
    /// `schema_version` is pinned and timestamps must be UTC with a `Z` suffix.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(RefreshEvent);
        let mut value = serde_json::to_value(&schema).unwrap_or_default();

        if let Some(root) = value.as_object_mut() {
            root.insert("title".into(), "RefreshEventV1".into());
            if let Some(properties) = root
                .get_mut("properties")
                .and_then(|p| p.as_object_mut())
            {
                for field in ["emitted_at", "start_time", "end_time"] {
                    if let Some(property) = properties.get_mut(field).and_then(|p| p.as_object_mut())
                    {
                        property.insert("format".into(), "date-time".into());
                        property.insert("pattern".into(), UTC_TIMESTAMP_PATTERN.into());
                    }
                }
                if let Some(property) = properties
                    .get_mut("event_id")
                    .and_then(|p| p.as_object_mut())
                {
                    property.insert("format".into(), "uuid".into());
                }
                if let Some(property) = properties
                    .get_mut("schema_version")
                    .and_then(|p| p.as_object_mut())
                {
                    property.insert("const".into(), SCHEMA_VERSION.into());
                }

                let required: Vec<serde_json::Value> =
                    properties.keys().map(|key| key.as_str().into()).collect();
                root.insert("required".into(), required.into());
            }
        }
        value
    }

    pub fn has_error_status(&self) -> bool {
        carries_error(&self.status)
    }
}

pub(crate) fn carries_error(status: &str) -> bool {
    ERROR_STATUSES.contains(&status)
}

/// Seed hashed into [`event_id`]: `workspace_id:dataset_id:refresh_id:status`.
pub fn event_id_seed(workspace_id: &str, dataset_id: &str, refresh_id: &str, status: &str) -> String {
    format!("{}:{}:{}:{}", workspace_id, dataset_id, refresh_id, status)
}

/// Deterministic UUID v5 identifying a refresh in a given status.
pub fn event_id(workspace_id: &str, dataset_id: &str, refresh_id: &str, status: &str) -> Uuid {
    let seed = event_id_seed(workspace_id, dataset_id, refresh_id, status);
    Uuid::new_v5(&EVENT_ID_NAMESPACE, seed.as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample() -> RefreshEvent {
        RefreshEvent {
            schema_version: SCHEMA_VERSION.into(),
            event_id: event_id("workspace-1", "dataset-1", "refresh-123", "Completed"),
            emitted_at: Utc.with_ymd_and_hms(2025, 1, 3, 16, 0, 0).unwrap(),
            workspace_id: "workspace-1".into(),
            workspace_name: "Workspace".into(),
            dataset_id: "dataset-1".into(),
            dataset_name: "Dataset".into(),
            refresh_id: "refresh-123".into(),
            status: "Completed".into(),
            start_time: Utc.with_ymd_and_hms(2025, 1, 3, 15, 52, 10).unwrap(),
            end_time: None,
            duration_sec: None,
            error_message: None,
            source: DEFAULT_SOURCE.into(),
        }
    }

    #[test]
    fn test_event_id_matches_reference_values() {
        assert_eq!(
            event_id("workspace-1", "dataset-1", "refresh-123", "Completed").to_string(),
            "de4ea81b-53e5-5044-9c36-55d03323a8d3"
        );
        assert_eq!(
            event_id("workspace-1", "dataset-1", "refresh-123", "Failed").to_string(),
            "42f7b0bd-4c0f-52e5-8daf-ae9c115abcfd"
        );
    }

    #[test]
    fn test_event_id_seed_layout() {
        assert_eq!(event_id_seed("w", "d", "r", "s"), "w:d:r:s");
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["schema_version"], "1.0");
        assert_eq!(value["event_id"], "de4ea81b-53e5-5044-9c36-55d03323a8d3");
        assert_eq!(value["emitted_at"], "2025-01-03T16:00:00Z");
        assert_eq!(value["start_time"], "2025-01-03T15:52:10Z");
        assert_eq!(value["end_time"], json!(null));
        assert_eq!(value["duration_sec"], json!(null));
        assert_eq!(value["error_message"], json!(null));
        assert_eq!(value.as_object().unwrap().len(), 14);
    }

    #[test]
    fn test_deserialize_serialized_event() {
        let event = sample();
        let text = serde_json::to_string(&event).unwrap();
        let parsed: RefreshEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_json_schema() {
        let schema = RefreshEvent::json_schema();
        assert_eq!(schema["title"], "RefreshEventV1");
        assert_eq!(schema["properties"]["start_time"]["format"], "date-time");
        assert_eq!(schema["properties"]["event_id"]["format"], "uuid");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required.len(), 14);
        for key in ["end_time", "duration_sec", "error_message", "start_time", "event_id"] {
            assert!(required.contains(&key), "{key} should be required");
        }
        assert_eq!(schema["properties"]["schema_version"]["const"], "1.0");
        assert_eq!(
            schema["properties"]["end_time"]["pattern"],
            UTC_TIMESTAMP_PATTERN
        );
    }

    #[test]
    fn test_error_statuses() {
        assert!(carries_error("Failed"));
        assert!(carries_error("Cancelled"));
        assert!(!carries_error("Completed"));
        assert!(!carries_error("failed"));
    }
}
