//! Power BI REST API client.
//!
//! [`PowerBiClient`] exposes the resource accessors used by the collector and
//! delegates every HTTP exchange to a [`RequestExecutor`]. The underlying
//! connection pool lives as long as the client and is released on drop.

mod classify;
mod executor;
pub mod resilience;
mod retry_after;

pub use classify::{Payload, classify};
pub use executor::{CLIENT_REQUEST_ID_HEADER, RequestExecutor};
pub use resilience::{
    AttemptOutcome, ExponentialBackoff, RetryConfig, RetryDecision, RetryPolicy,
};
pub use retry_after::parse_retry_after;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::auth::{ClientCredentialsProvider, TokenProvider};
use crate::config::{CollectorConfig, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
use crate::normalize::{RawRecord, RefreshContext, RefreshEvent, normalize_refresh_history};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PowerBiClient {
    executor: RequestExecutor,
}

impl std::fmt::Debug for PowerBiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerBiClient")
            .field("executor", &self.executor)
            .finish()
    }
}

impl PowerBiClient {
    pub fn builder() -> PowerBiClientBuilder {
        PowerBiClientBuilder::default()
    }

    /// Client authenticated with the configured service principal.
    pub fn from_config(config: &CollectorConfig) -> Result<Self> {
        let tokens = ClientCredentialsProvider::from_config(config)?;
        Self::builder()
            .base_url(&config.api_base)
            .timeout(config.http_timeout)
            .user_agent(&config.user_agent)
            .retry(config.retry.clone())
            .token_provider(tokens)
            .build()
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// `GET /groups`
    pub async fn list_workspaces(&self) -> Result<Vec<RawRecord>> {
        self.get_collection("/groups", &[]).await
    }

    /// `GET /groups/{workspaceId}/datasets`
    pub async fn list_datasets(&self, workspace_id: &str) -> Result<Vec<RawRecord>> {
        let path = format!("/groups/{}/datasets", urlencoding::encode(workspace_id));
        self.get_collection(&path, &[]).await
    }

    /// `GET /groups/{workspaceId}/datasets/{datasetId}/refreshes?$top=N`
    pub async fn get_refresh_history(
        &self,
        workspace_id: &str,
        dataset_id: &str,
        top: Option<u32>,
    ) -> Result<Vec<RawRecord>> {
        let path = format!(
            "/groups/{}/datasets/{}/refreshes",
            urlencoding::encode(workspace_id),
            urlencoding::encode(dataset_id)
        );
        let query: Vec<(&str, String)> = top.map(|n| ("$top", n.to_string())).into_iter().collect();
        self.get_collection(&path, &query).await
    }

    /// Fetch refresh history for `context`'s dataset and normalize it.
    pub async fn refresh_events(
        &self,
        context: &RefreshContext,
        top: Option<u32>,
    ) -> Result<Vec<RefreshEvent>> {
        let records = self
            .get_refresh_history(&context.workspace_id, &context.dataset_id, top)
            .await?;
        tracing::debug!(
            workspace_id = %context.workspace_id,
            dataset_id = %context.dataset_id,
            count = records.len(),
            "Normalizing refresh history"
        );
        normalize_refresh_history(&records, context)
    }

    async fn get_collection(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<RawRecord>> {
        let payload = self.executor.execute(Method::GET, path, query).await?;
        unwrap_envelope(payload)
    }
}

/// Unwrap a `{"value": [...]}` page into its records.
///
/// No content, a `null` body or a missing `value` are an empty page.
pub fn unwrap_envelope(payload: Payload) -> Result<Vec<RawRecord>> {
    let envelope = match payload {
        Payload::NoContent | Payload::Json(Value::Null) => return Ok(Vec::new()),
        Payload::Json(Value::Object(envelope)) => envelope,
        Payload::Json(other) => {
            return Err(Error::Protocol(format!(
                "expected a JSON object envelope, got {}",
                json_kind(&other)
            )));
        }
    };

    match envelope.get("value") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record.clone()),
                other => Err(Error::Protocol(format!(
                    "envelope item {} is {}, expected an object",
                    index,
                    json_kind(other)
                ))),
            })
            .collect(),
        Some(other) => Err(Error::Protocol(format!(
            "envelope `value` is {}, expected an array",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Builder for [`PowerBiClient`].
pub struct PowerBiClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    retry: RetryConfig,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl Default for PowerBiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry: RetryConfig::default(),
            tokens: None,
        }
    }
}

impl PowerBiClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn token_provider(mut self, provider: impl TokenProvider + 'static) -> Self {
        self.tokens = Some(Arc::new(provider));
        self
    }

    pub fn shared_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(provider);
        self
    }

    pub fn build(self) -> Result<PowerBiClient> {
        let tokens = self
            .tokens
            .ok_or_else(|| Error::Config("a token provider is required".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(Error::Network)?;

        Ok(PowerBiClient {
            executor: RequestExecutor::new(http, self.base_url, tokens, RetryPolicy::new(&self.retry)),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::StaticTokenProvider;

    #[test]
    fn test_envelope_values() {
        let records = unwrap_envelope(Payload::Json(json!({
            "value": [{"id": "a"}, {"id": "b"}]
        })))
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], "b");
    }

    #[test]
    fn test_empty_or_absent_envelope_is_empty() {
        for payload in [
            Payload::NoContent,
            Payload::Json(Value::Null),
            Payload::Json(json!({})),
            Payload::Json(json!({"value": null})),
            Payload::Json(json!({"value": []})),
        ] {
            assert!(unwrap_envelope(payload).unwrap().is_empty());
        }
    }

    #[test]
    fn test_malformed_envelope_is_protocol_error() {
        for payload in [
            Payload::Json(json!([1, 2])),
            Payload::Json(json!({"value": "nope"})),
            Payload::Json(json!({"value": [1]})),
        ] {
            assert!(matches!(
                unwrap_envelope(payload).unwrap_err(),
                Error::Protocol(_)
            ));
        }
    }

    #[test]
    fn test_builder_requires_token_provider() {
        let err = PowerBiClient::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder_trims_base_url() {
        let client = PowerBiClient::builder()
            .base_url("http://localhost:1234/v1.0/myorg/")
            .token_provider(StaticTokenProvider::new("t"))
            .build()
            .unwrap();
        assert_eq!(
            client.executor().base_url(),
            "http://localhost:1234/v1.0/myorg"
        );
        assert_eq!(client.executor().policy().max_attempts(), 5);
    }
}
