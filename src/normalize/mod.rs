//! Refresh history normalization.
//!
//! Raw refresh records from the REST API are mapped onto [`RefreshEvent`],
//! the stable v1.0 layout consumed downstream. Normalization is pure: the
//! only inputs are the record, the [`RefreshContext`] and the emission clock.

mod event;
pub mod fields;
pub mod time;

pub use event::{
    DEFAULT_SOURCE, ERROR_STATUSES, EVENT_ID_NAMESPACE, RefreshEvent, SCHEMA_VERSION, event_id,
    event_id_seed,
};
pub use fields::FieldAlias;
pub use time::{format_utc, parse_utc};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A record as returned by the API: a JSON object, kept untyped.
pub type RawRecord = Map<String, Value>;

const UNKNOWN_STATUS: &str = "Unknown";

/// Identity of the dataset a batch of records belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshContext {
    pub workspace_id: String,
    pub dataset_id: String,
    pub workspace_name: Option<String>,
    pub dataset_name: Option<String>,
    pub source: String,
    /// Fixed emission time; the current time is used when unset.
    pub emitted_at: Option<DateTime<Utc>>,
}

impl RefreshContext {
    pub fn new(workspace_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            dataset_id: dataset_id.into(),
            workspace_name: None,
            dataset_name: None,
            source: DEFAULT_SOURCE.to_string(),
            emitted_at: None,
        }
    }

    pub fn with_workspace_name(mut self, name: impl Into<String>) -> Self {
        self.workspace_name = Some(name.into());
        self
    }

    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_emitted_at(mut self, emitted_at: DateTime<Utc>) -> Self {
        self.emitted_at = Some(emitted_at);
        self
    }

    /// Display name of the workspace, falling back to its id.
    pub fn workspace_label(&self) -> &str {
        non_empty(self.workspace_name.as_deref()).unwrap_or(&self.workspace_id)
    }

    /// Display name of the dataset, falling back to its id.
    pub fn dataset_label(&self) -> &str {
        non_empty(self.dataset_name.as_deref()).unwrap_or(&self.dataset_id)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Normalize a single refresh record.
pub fn normalize_refresh_event(record: &RawRecord, context: &RefreshContext) -> Result<RefreshEvent> {
    let emitted_at = context.emitted_at.unwrap_or_else(Utc::now);
    normalize_at(record, context, emitted_at)
}

/// Normalize a page of refresh records, preserving order.
///
/// Every event in the batch shares one `emitted_at`. The first invalid record
/// fails the whole batch.
pub fn normalize_refresh_history(
    records: &[RawRecord],
    context: &RefreshContext,
) -> Result<Vec<RefreshEvent>> {
    let emitted_at = context.emitted_at.unwrap_or_else(Utc::now);
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            normalize_at(record, context, emitted_at).map_err(|e| match e {
                Error::Validation(message) => {
                    Error::Validation(format!("record {}: {}", index, message))
                }
                other => other,
            })
        })
        .collect()
}

fn normalize_at(
    record: &RawRecord,
    context: &RefreshContext,
    emitted_at: DateTime<Utc>,
) -> Result<RefreshEvent> {
    let refresh_id = fields::REFRESH_ID
        .resolve_text(record)
        .ok_or_else(|| Error::validation("Refresh record missing id"))?;

    let status = fields::STATUS
        .resolve_text(record)
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());

    let start_raw = fields::START_TIME
        .resolve_text(record)
        .ok_or_else(|| Error::validation(format!("Refresh {} missing startTime", refresh_id)))?;
    let start_time = parse_utc(&start_raw).ok_or_else(|| {
        Error::validation(format!(
            "Refresh {} has invalid startTime {:?}",
            refresh_id, start_raw
        ))
    })?;

    let end_time = fields::END_TIME
        .resolve_text(record)
        .and_then(|raw| parse_utc(&raw));
    let duration_sec = end_time.map(|end| (end - start_time).num_seconds());

    let error_message = if event::carries_error(&status) {
        fields::ERROR_DETAIL.resolve_text(record)
    } else {
        None
    };

    Ok(RefreshEvent {
        schema_version: SCHEMA_VERSION.to_string(),
        event_id: event_id(&context.workspace_id, &context.dataset_id, &refresh_id, &status),
        emitted_at,
        workspace_id: context.workspace_id.clone(),
        workspace_name: context.workspace_label().to_string(),
        dataset_id: context.dataset_id.clone(),
        dataset_name: context.dataset_label().to_string(),
        refresh_id,
        status,
        start_time,
        end_time,
        duration_sec,
        error_message,
        source: context.source.clone(),
    })
}
