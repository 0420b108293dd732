//! Field alias tables for raw refresh records.
//!
//! Refresh records name the same logical field differently across API
//! versions. Each [`FieldAlias`] lists candidate keys in precedence order;
//! the first key holding a non-empty value wins.

use serde_json::Value;

use super::RawRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub candidates: &'static [&'static str],
}

pub const REFRESH_ID: FieldAlias = FieldAlias {
    candidates: &["id", "requestId", "refreshId"],
};

pub const STATUS: FieldAlias = FieldAlias {
    candidates: &["status"],
};

pub const START_TIME: FieldAlias = FieldAlias {
    candidates: &["startTime"],
};

pub const END_TIME: FieldAlias = FieldAlias {
    candidates: &["endTime"],
};

pub const ERROR_DETAIL: FieldAlias = FieldAlias {
    candidates: &["serviceExceptionJson", "error", "errorMessage"],
};

impl FieldAlias {
    /// First candidate holding a present value.
    ///
    /// `null`, `false`, empty strings and empty containers count as absent.
    pub fn resolve<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        self.candidates
            .iter()
            .filter_map(|key| record.get(*key))
            .find(|value| is_present(value))
    }

    /// Resolved value rendered as text; strings verbatim, anything else as compact JSON.
    pub fn resolve_text(&self, record: &RawRecord) -> Option<String> {
        self.resolve(record).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let raw = record(json!({"refreshId": "c", "requestId": "b", "id": "a"}));
        assert_eq!(REFRESH_ID.resolve_text(&raw).as_deref(), Some("a"));

        let raw = record(json!({"refreshId": "c", "requestId": "b"}));
        assert_eq!(REFRESH_ID.resolve_text(&raw).as_deref(), Some("b"));
    }

    #[test]
    fn test_empty_values_fall_through() {
        let raw = record(json!({"id": "", "requestId": null, "refreshId": "c"}));
        assert_eq!(REFRESH_ID.resolve_text(&raw).as_deref(), Some("c"));
    }

    #[test]
    fn test_numeric_id_rendered_as_text() {
        let raw = record(json!({"id": 1234}));
        assert_eq!(REFRESH_ID.resolve_text(&raw).as_deref(), Some("1234"));
    }

    #[test]
    fn test_structured_error_rendered_as_json() {
        let raw = record(json!({"error": {"code": "ModelRefreshFailed"}}));
        assert_eq!(
            ERROR_DETAIL.resolve_text(&raw).as_deref(),
            Some(r#"{"code":"ModelRefreshFailed"}"#)
        );
    }

    #[test]
    fn test_absent() {
        let raw = record(json!({"unrelated": 1}));
        for alias in [REFRESH_ID, STATUS, START_TIME, END_TIME, ERROR_DETAIL] {
            assert!(alias.resolve(&raw).is_none(), "{:?}", alias.candidates);
        }
    }
}
